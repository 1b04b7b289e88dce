use anyhow::Result;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use startup_survivor::config::settings_io::{self, CREDENTIALS_ENV};
use startup_survivor::ui::app::ConsoleApp;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if !settings_io::settings_path().exists() {
        if let Err(err) = settings_io::save_settings(&settings_io::load_settings()) {
            warn!(error = %err, "could not write default settings");
        }
    }
    let settings = settings_io::load_settings();

    let credentials = settings_io::load_credentials();
    if credentials.is_empty() {
        anyhow::bail!("no API keys found; set {CREDENTIALS_ENV} to one or more comma separated keys");
    }

    let mut app = ConsoleApp::new(settings, credentials)?;
    app.run()
}
