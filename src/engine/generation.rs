use std::thread;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::settings::GenerationSettings;
use crate::engine::llm_client::{BackendError, Credential, GenerationBackend, GenerationRequest};
use crate::engine::narrative_parser::{missing_marker, OPTION_MARKERS};
use crate::engine::sanitizer::clean_json;
use crate::model::llm_decode::{decode_narrative, ValidationError};
use crate::model::narrative::NarrativeResponse;

/// Generation attempts per credential/model before the turn fails.
pub const MAX_GENERATION_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no generation credentials configured")]
    NoCredentials,

    #[error("generated output still invalid after {attempts} attempts: {last}")]
    InvalidOutput {
        attempts: usize,
        #[source]
        last: ValidationError,
    },

    #[error("all {tried} credential/model combinations failed; last error: {last}")]
    Exhausted { tried: usize, last: String },
}

/// Result of trying one credential/model combination.
#[derive(Debug)]
enum AttemptOutcome {
    Success(NarrativeResponse),
    /// The backend itself failed; move on to the next combination
    Retryable(BackendError),
    /// The backend answered but never produced usable output
    Fatal(GenerationError),
}

/// Sanitize, decode and structurally check one raw reply.
pub fn validate_payload(raw: &str) -> Result<NarrativeResponse, ValidationError> {
    let response = decode_narrative(&clean_json(raw))?;
    match missing_marker(&response.text) {
        Some(marker) => Err(ValidationError::MissingOption(marker)),
        None => Ok(response),
    }
}

fn correction_for(err: &ValidationError) -> String {
    format!(
        "Your previous reply could not be used ({err}). Reply again with ONLY one valid JSON object \
with the fields \"text\", \"month\", \"stats\", \"game_over\" and \"game_over_reason\". \
The \"text\" MUST end with exactly two options labeled **{}** and **{}**. No markdown fences, \
no commentary outside the JSON.",
        OPTION_MARKERS[0], OPTION_MARKERS[1]
    )
}

/// Picks credentials and models, calls the backend, validates and retries.
pub struct GenerationClient<B> {
    backend: B,
    credentials: Vec<Credential>,
    settings: GenerationSettings,
    rng: StdRng,
}

impl<B: GenerationBackend> GenerationClient<B> {
    pub fn new(backend: B, credentials: Vec<Credential>, settings: GenerationSettings) -> Self {
        Self {
            backend,
            credentials,
            settings,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Walks every credential/model combination in order until one yields a
    /// valid payload, the output stays invalid, or the list runs out.
    pub fn generate(&mut self, request: &GenerationRequest) -> Result<NarrativeResponse, GenerationError> {
        if self.credentials.is_empty() {
            return Err(GenerationError::NoCredentials);
        }

        let mut order: Vec<usize> = (0..self.credentials.len()).collect();
        if self.settings.shuffle_credentials {
            order.shuffle(&mut self.rng);
        }

        let mut tried = 0;
        let mut last_error: Option<BackendError> = None;

        for index in order {
            let credential = &self.credentials[index];
            let discovered = std::iter::once_with(|| self.discover_model(credential)).flatten();

            for model in self.settings.models.iter().cloned().chain(discovered) {
                tried += 1;
                match self.try_candidate(credential, &model, request) {
                    AttemptOutcome::Success(response) => return Ok(response),
                    AttemptOutcome::Fatal(err) => return Err(err),
                    AttemptOutcome::Retryable(err) => {
                        warn!(credential = %credential.label(), model = %model, error = %err, "falling through to next candidate");
                        last_error = Some(err);
                    }
                }
            }
        }

        Err(GenerationError::Exhausted {
            tried,
            last: last_error.map_or_else(|| "no models configured".to_string(), |e| e.to_string()),
        })
    }

    fn try_candidate(&self, credential: &Credential, model: &str, request: &GenerationRequest) -> AttemptOutcome {
        if self.settings.probe_models {
            if let Err(err) = self.backend.probe(credential, model) {
                return AttemptOutcome::Retryable(err);
            }
            debug!(credential = %credential.label(), model, "probe answered");
        }
        self.run_validated(credential, model, request)
    }

    fn run_validated(&self, credential: &Credential, model: &str, request: &GenerationRequest) -> AttemptOutcome {
        let mut conversation = request.clone();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let raw = match self.backend.generate(credential, model, &conversation) {
                Ok(raw) => raw,
                Err(err) => return AttemptOutcome::Retryable(err),
            };

            match validate_payload(&raw) {
                Ok(response) => {
                    info!(model, attempt, "generation accepted");
                    return AttemptOutcome::Success(response);
                }
                Err(err) if attempt >= MAX_GENERATION_ATTEMPTS => {
                    warn!(model, attempt, error = %err, "giving up on invalid output");
                    return AttemptOutcome::Fatal(GenerationError::InvalidOutput { attempts: attempt, last: err });
                }
                Err(err) => {
                    warn!(model, attempt, error = %err, "generated output rejected, retrying");
                    conversation.push_correction(&raw, correction_for(&err));
                    thread::sleep(self.settings.retry_delay());
                }
            }
        }
    }

    /// Fallback when no configured model answers: ask the backend what it
    /// has, prefer a `flash` model, and skip ones already tried.
    fn discover_model(&self, credential: &Credential) -> Option<String> {
        if !self.settings.discover_models {
            return None;
        }

        let names = match self.backend.list_models(credential) {
            Ok(names) => names,
            Err(err) => {
                warn!(credential = %credential.label(), error = %err, "model discovery failed");
                return None;
            }
        };

        let fresh: Vec<String> = names
            .into_iter()
            .map(|name| name.trim_start_matches("models/").to_string())
            .filter(|name| !self.settings.models.contains(name))
            .collect();

        let picked = fresh
            .iter()
            .find(|name| name.contains("flash"))
            .or_else(|| fresh.first())
            .cloned();
        if let Some(model) = &picked {
            info!(credential = %credential.label(), model = %model, "discovered fallback model");
        }
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::HistoryEntry;
    use std::cell::RefCell;
    use std::collections::{HashSet, VecDeque};

    const VALID: &str = r#"{
        "text": "Sales are slow.\n\n**A) Discount**\nCut prices.\n\n**B) Rebrand**\nNew logo.",
        "month": 2,
        "stats": {"money": 40000, "team": 48, "motivation": 55},
        "game_over": false,
        "game_over_reason": ""
    }"#;

    #[derive(Default)]
    struct ScriptedBackend {
        replies: RefCell<VecDeque<Result<String, BackendError>>>,
        dead_models: HashSet<String>,
        listed: Vec<String>,
        calls: RefCell<Vec<(String, String, usize)>>,
    }

    impl ScriptedBackend {
        fn replying(replies: Vec<Result<String, BackendError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                ..Self::default()
            }
        }
    }

    impl GenerationBackend for ScriptedBackend {
        fn probe(&self, _credential: &Credential, model: &str) -> Result<(), BackendError> {
            if self.dead_models.contains(model) {
                Err(BackendError::Status { status: 404, body: "not found".into() })
            } else {
                Ok(())
            }
        }

        fn generate(
            &self,
            credential: &Credential,
            model: &str,
            request: &GenerationRequest,
        ) -> Result<String, BackendError> {
            self.calls
                .borrow_mut()
                .push((credential.secret().to_string(), model.to_string(), request.turns.len()));
            self.replies.borrow_mut().pop_front().unwrap_or(Err(BackendError::Empty))
        }

        fn list_models(&self, _credential: &Credential) -> Result<Vec<String>, BackendError> {
            Ok(self.listed.clone())
        }
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            models: vec!["primary".into(), "secondary".into()],
            shuffle_credentials: false,
            discover_models: false,
            retry_delay_ms: 0,
            ..GenerationSettings::default()
        }
    }

    fn client(backend: ScriptedBackend, keys: &[&str]) -> GenerationClient<ScriptedBackend> {
        let credentials = keys.iter().map(|k| Credential::new(*k)).collect();
        GenerationClient::new(backend, credentials, settings()).with_seed(3)
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("directive".into(), &[], "A")
    }

    #[test]
    fn always_invalid_output_stops_after_three_attempts() {
        let replies = (0..10).map(|_| Ok("I'd rather write a poem.".to_string())).collect();
        let mut client = client(ScriptedBackend::replying(replies), &["k1", "k2"]);

        let err = client.generate(&request()).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidOutput { attempts: 3, .. }));

        let calls = client.backend().calls.borrow();
        assert_eq!(calls.len(), MAX_GENERATION_ATTEMPTS);
        // every retry carries the rejected reply plus a correction
        let turns: Vec<usize> = calls.iter().map(|c| c.2).collect();
        assert_eq!(turns, vec![2, 4, 6]);
    }

    #[test]
    fn missing_option_marker_is_invalid() {
        let no_b = VALID.replace("**B) Rebrand**", "Rebrand");
        let replies = vec![Ok(no_b), Ok(VALID.to_string())];
        let mut client = client(ScriptedBackend::replying(replies), &["k1"]);

        let response = client.generate(&request()).unwrap();
        assert_eq!(response.month, 2);
        assert_eq!(client.backend().calls.borrow().len(), 2);
    }

    #[test]
    fn inline_options_are_accepted() {
        let inline = VALID.replace(
            r"\n\n**A) Discount**\nCut prices.\n\n**B) Rebrand**\nNew logo.",
            " Your options: **A) Discount** or **B) Rebrand**",
        );
        assert_ne!(inline, VALID);
        let mut client = client(ScriptedBackend::replying(vec![Ok(inline)]), &["k1"]);

        let response = client.generate(&request()).unwrap();
        assert!(response.text.contains("or **B) Rebrand**"));
        assert_eq!(client.backend().calls.borrow().len(), 1);
    }

    #[test]
    fn next_candidate_gets_a_fresh_attempt_budget() {
        let garbage = || Ok("not json at all".to_string());
        let replies = vec![
            garbage(),
            Err(BackendError::Status { status: 429, body: "quota".into() }),
            garbage(),
            garbage(),
            Ok(VALID.to_string()),
        ];
        let mut client = client(ScriptedBackend::replying(replies), &["k1"]);

        let response = client.generate(&request()).unwrap();
        assert_eq!(response.month, 2);

        let calls = client.backend().calls.borrow();
        let models: Vec<&str> = calls.iter().map(|c| c.1.as_str()).collect();
        assert_eq!(models, vec!["primary", "primary", "secondary", "secondary", "secondary"]);
        // the second model starts again from the bare request
        let turns: Vec<usize> = calls.iter().map(|c| c.2).collect();
        assert_eq!(turns, vec![2, 4, 2, 4, 6]);
    }

    #[test]
    fn fenced_reply_is_accepted_first_time() {
        let fenced = format!("Here you go:\n```json\n{VALID}\n```");
        let mut client = client(ScriptedBackend::replying(vec![Ok(fenced)]), &["k1"]);
        let response = client.generate(&request()).unwrap();
        assert_eq!(response.stats.money, Some(40_000));
    }

    #[test]
    fn transport_failure_falls_through_to_next_model() {
        let replies = vec![
            Err(BackendError::Status { status: 429, body: "quota".into() }),
            Ok(VALID.to_string()),
        ];
        let mut client = client(ScriptedBackend::replying(replies), &["k1"]);

        client.generate(&request()).unwrap();
        let calls = client.backend().calls.borrow();
        assert_eq!(calls[0].1, "primary");
        assert_eq!(calls[1].1, "secondary");
    }

    #[test]
    fn dead_models_are_skipped_by_probe() {
        let backend = ScriptedBackend {
            dead_models: ["primary".to_string()].into(),
            ..ScriptedBackend::replying(vec![Ok(VALID.to_string())])
        };
        let mut client = client(backend, &["k1"]);

        client.generate(&request()).unwrap();
        let calls = client.backend().calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "secondary");
    }

    #[test]
    fn no_credentials_is_a_configuration_error() {
        let mut client = client(ScriptedBackend::replying(vec![Ok(VALID.to_string())]), &[]);
        assert!(matches!(client.generate(&request()), Err(GenerationError::NoCredentials)));
        assert!(client.backend().calls.borrow().is_empty());
    }

    #[test]
    fn exhausting_every_combination_is_fatal() {
        let replies = (0..4).map(|_| Err(BackendError::Empty)).collect();
        let mut client = client(ScriptedBackend::replying(replies), &["k1", "k2"]);

        match client.generate(&request()) {
            Err(GenerationError::Exhausted { tried, .. }) => assert_eq!(tried, 4),
            other => panic!("expected exhaustion, got {other:?}"),
        }
        let keys: Vec<String> = client.backend().calls.borrow().iter().map(|c| c.0.clone()).collect();
        assert_eq!(keys, vec!["k1", "k1", "k2", "k2"]);
    }

    #[test]
    fn discovery_prefers_flash_models() {
        let backend = ScriptedBackend {
            dead_models: ["primary".to_string(), "secondary".to_string()].into(),
            listed: vec![
                "models/primary".into(),
                "models/gemini-ultra".into(),
                "models/gemini-1.5-flash-8b".into(),
            ],
            ..ScriptedBackend::replying(vec![Ok(VALID.to_string())])
        };
        let credentials = vec![Credential::new("k1")];
        let settings = GenerationSettings {
            discover_models: true,
            ..settings()
        };
        let mut client = GenerationClient::new(backend, credentials, settings);

        client.generate(&request()).unwrap();
        assert_eq!(client.backend().calls.borrow()[0].1, "gemini-1.5-flash-8b");
    }

    #[test]
    fn correction_keeps_earlier_turns_first() {
        let history = vec![HistoryEntry::participant("pitch"), HistoryEntry::narrator("{}")];
        let mut conversation = GenerationRequest::new("directive".into(), &history, "B");
        conversation.push_correction("garbage", correction_for(&ValidationError::MissingOption("B)")));

        assert_eq!(conversation.turns.len(), 6);
        assert_eq!(conversation.turns[0].content, "directive");
        assert_eq!(conversation.turns[3].content, "B");
        assert_eq!(conversation.turns[4], HistoryEntry::narrator("garbage"));
        assert!(conversation.turns[5].content.contains("B)"));
    }
}
