use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::mpsc;

use anyhow::{anyhow, Context, Result};
use strum::IntoEnumIterator;

use crate::config::settings::GameSettings;
use crate::engine::engine::Engine;
use crate::engine::llm_client::{Credential, GeminiBackend};
use crate::engine::narrative_parser::parse_options;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::turn::TurnEngine;
use crate::model::event_result::{TurnOutcome, TurnReport};
use crate::model::game_state::{GameState, Phase};
use crate::model::message::Role;
use crate::model::mode::GameMode;
use crate::model::player::PlayerProfile;
use crate::ui::display::{render_costs, render_event, render_stats};

/* =========================
   App
   ========================= */

/// Terminal front end. Talks to one engine worker over channels.
pub struct ConsoleApp {
    horizon: u32,
    state: GameState,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

enum Flow {
    PlayAgain,
    Quit,
}

impl ConsoleApp {
    pub fn new(settings: GameSettings, credentials: Vec<Credential>) -> Result<Self> {
        let backend = GeminiBackend::new(settings.generation.clone()).context("building HTTP client")?;

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let horizon = settings.horizon;

        std::thread::spawn(move || {
            let turns = TurnEngine::new(backend, credentials, settings);
            let mut engine = Engine::new(cmd_rx, resp_tx, turns);
            engine.run();
        });

        Ok(Self {
            horizon,
            state: GameState::default(),
            cmd_tx,
            resp_rx,
        })
    }

    fn request(&self, cmd: EngineCommand) -> Result<EngineResponse> {
        self.cmd_tx.send(cmd).map_err(|_| anyhow!("engine stopped"))?;
        self.resp_rx.recv().context("engine stopped")
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        println!("💀 Startup Survivor");
        println!("Commands: /reset to start over, /quit to leave.\n");

        loop {
            let Some((player, mode)) = setup(&mut lines)? else {
                return Ok(());
            };
            if let EngineResponse::StateChanged(state) = self.request(EngineCommand::StartGame { player, mode })? {
                self.state = *state;
            }

            println!("\n{}", render_stats(self.state.stats(), self.state.month(), self.horizon));
            println!("Welcome! The investors are listening. What is your opening move?");

            match self.play(&mut lines)? {
                Flow::Quit => return Ok(()),
                Flow::PlayAgain => {
                    if let EngineResponse::StateChanged(state) = self.request(EngineCommand::Reset)? {
                        self.state = *state;
                    }
                }
            }
        }
    }

    fn play(&mut self, lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<Flow> {
        loop {
            if self.state.phase(self.horizon).is_finished() {
                return self.game_over(lines);
            }

            let Some(input) = prompt(lines, "> ")? else {
                return Ok(Flow::Quit);
            };
            match input.as_str() {
                "" => continue,
                "/quit" => return Ok(Flow::Quit),
                "/reset" => return Ok(Flow::PlayAgain),
                _ => {}
            }

            println!("The market reacts…");
            match self.request(EngineCommand::SubmitAction(input))? {
                EngineResponse::TurnCompleted { report, state } => {
                    self.state = *state;
                    self.show_turn(&report);
                }
                EngineResponse::TurnFailed { error, state } => {
                    self.state = *state;
                    println!("⚠ {error}");
                    println!("{}", render_stats(self.state.stats(), self.state.month(), self.horizon));
                    println!("Nothing was decided. Send your move again to retry.");
                }
                EngineResponse::StateChanged(state) => self.state = *state,
            }
        }
    }

    fn show_turn(&self, report: &TurnReport) {
        println!("\n{}", render_costs(&report.costs));
        if let Some(event) = &report.event {
            println!("{}", render_event(event));
        }
        println!("\n{}\n", report.narrative.text);
        println!("{}", render_stats(self.state.stats(), self.state.month(), self.horizon));

        if report.outcome == TurnOutcome::Continue {
            if let Ok([a, b]) = parse_options(&report.narrative.text) {
                println!("Choose {} ({}), {} ({}) or describe your own strategy.", a.label, a.title, b.label, b.title);
            }
        }
    }

    fn game_over(&self, lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<Flow> {
        match self.state.phase(self.horizon) {
            Phase::Won => println!("🏆 You survived {} months. The company lives on!", self.horizon),
            _ => println!("GAME OVER: {}", self.state.terminal_reason()),
        }
        let turns = self.state.history().iter().filter(|h| h.role == Role::Participant).count();
        println!("Moves played: {turns}");

        match prompt(lines, "Play again? [y/N] ")? {
            Some(answer) if answer.eq_ignore_ascii_case("y") => Ok(Flow::PlayAgain),
            _ => Ok(Flow::Quit),
        }
    }
}

/* =========================
   Setup
   ========================= */

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

fn setup(lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<Option<(PlayerProfile, GameMode)>> {
    let Some(name) = prompt(lines, "Founder name: ")? else {
        return Ok(None);
    };
    let Some(venture) = prompt(lines, "Your startup idea (e.g. AI-powered cat food): ")? else {
        return Ok(None);
    };

    let mut player = PlayerProfile::new(
        if name.is_empty() { "Anonymous founder".to_string() } else { name },
        venture,
    );

    let Some(skills) = prompt(lines, "Skills as name=score (0-10), comma separated [optional]: ")? else {
        return Ok(None);
    };
    for (skill, score) in parse_skills(&skills) {
        player = player.with_skill(skill, score);
    }

    let Some(traits) = prompt(lines, "Traits, comma separated [optional]: ")? else {
        return Ok(None);
    };
    for t in traits.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        player = player.with_trait(t);
    }

    println!("Modes:");
    for mode in GameMode::iter() {
        println!("  {mode:<10} {}", mode.summary());
    }
    let Some(choice) = prompt(lines, "Mode [standard]: ")? else {
        return Ok(None);
    };
    let mode = if choice.is_empty() {
        GameMode::default()
    } else {
        GameMode::from_str(&choice).unwrap_or_else(|_| {
            println!("Unknown mode '{choice}', using {}.", GameMode::default());
            GameMode::default()
        })
    };

    Ok(Some((player, mode)))
}

fn parse_skills(raw: &str) -> Vec<(String, u8)> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, score) = pair.split_once('=')?;
            let name = name.trim();
            let score = score.trim().parse::<u8>().ok()?;
            (!name.is_empty()).then(|| (name.to_string(), score))
        })
        .collect()
}
