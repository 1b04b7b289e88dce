use std::fmt;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::settings::{GenerationSettings, SafetySetting};
use crate::model::message::{HistoryEntry, Role};

/// An API key. Debug output never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Short label safe for logs.
    pub fn label(&self) -> String {
        let tail: String = self.0.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        format!("…{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.label()).finish()
    }
}

/// Ordered conversation sent to the backend. The first turn is the directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub turns: Vec<HistoryEntry>,
}

impl GenerationRequest {
    pub fn new(directive: String, history: &[HistoryEntry], player_input: &str) -> Self {
        let mut turns = Vec::with_capacity(history.len() + 2);
        turns.push(HistoryEntry::participant(directive));
        turns.extend(history.iter().cloned());
        turns.push(HistoryEntry::participant(player_input));
        Self { turns }
    }

    /// Feeds a rejected reply back with instructions to fix it.
    pub fn push_correction(&mut self, rejected: &str, correction: String) {
        self.turns.push(HistoryEntry::narrator(rejected));
        self.turns.push(HistoryEntry::participant(correction));
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("prompt blocked by the backend: {0}")]
    Blocked(String),

    #[error("backend returned no text")]
    Empty,
}

/// A text-generation service. Every method is one blocking round trip.
pub trait GenerationBackend {
    /// Trivial request used to check that a model answers at all.
    fn probe(&self, credential: &Credential, model: &str) -> Result<(), BackendError>;

    fn generate(
        &self,
        credential: &Credential,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<String, BackendError>;

    /// Names of models able to generate content for this credential.
    fn list_models(&self, credential: &Credential) -> Result<Vec<String>, BackendError>;
}

/* =========================
   Wire format
   ========================= */

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "no_overrides")]
    safety_settings: &'a [SafetySetting],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

fn no_overrides(safety: &&[SafetySetting]) -> bool {
    safety.is_empty()
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::Participant => "user",
        Role::Narrator => "model",
    }
}

fn build_body<'a>(
    turns: &'a [HistoryEntry],
    config: GenerationConfig,
    safety: &'a [SafetySetting],
) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: turns
            .iter()
            .map(|turn| Content {
                role: wire_role(turn.role),
                parts: [Part { text: &turn.content }],
            })
            .collect(),
        generation_config: config,
        safety_settings: safety,
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, BackendError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(BackendError::Blocked(reason));
    }

    let candidate = response.candidates.into_iter().next().ok_or(BackendError::Empty)?;
    match candidate.finish_reason.as_deref() {
        Some("MAX_TOKENS") => warn!("generation hit the output token cap; reply is truncated"),
        Some("SAFETY") => return Err(BackendError::Blocked("SAFETY".into())),
        _ => {}
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(BackendError::Empty);
    }
    Ok(text)
}

/// Any answer counts for a probe, even one cut off before producing text.
/// Only an outright prompt block marks the model as unusable.
fn probe_verdict(response: GenerateContentResponse) -> Result<(), BackendError> {
    match response.prompt_feedback.and_then(|f| f.block_reason) {
        Some(reason) => Err(BackendError::Blocked(reason)),
        None => Ok(()),
    }
}

fn truncate_body(mut body: String) -> String {
    const LIMIT: usize = 300;
    if body.len() > LIMIT {
        let mut cut = LIMIT;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}

/* =========================
   Google Generative Language backend
   ========================= */

pub struct GeminiBackend {
    http: Client,
    settings: GenerationSettings,
}

impl GeminiBackend {
    pub fn new(settings: GenerationSettings) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(settings.request_timeout()).build()?;
        Ok(Self { http, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    fn post_generate(
        &self,
        credential: &Credential,
        model: &str,
        body: &GenerateContentRequest<'_>,
        timeout: std::time::Duration,
    ) -> Result<GenerateContentResponse, BackendError> {
        let resp = self
            .http
            .post(self.url(&format!("models/{model}:generateContent")))
            .header("x-goog-api-key", credential.secret())
            .timeout(timeout)
            .json(body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        Ok(resp.json::<GenerateContentResponse>()?)
    }
}

impl GenerationBackend for GeminiBackend {
    fn probe(&self, credential: &Credential, model: &str) -> Result<(), BackendError> {
        let turns = [HistoryEntry::participant("T")];
        let config = GenerationConfig {
            temperature: 0.0,
            max_output_tokens: 8,
            response_mime_type: None,
        };
        let body = build_body(&turns, config, &[]);
        let response = self.post_generate(credential, model, &body, self.settings.probe_timeout())?;
        probe_verdict(response)
    }

    fn generate(
        &self,
        credential: &Credential,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<String, BackendError> {
        let config = GenerationConfig {
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
            response_mime_type: self.settings.json_output.then_some("application/json"),
        };
        let body = build_body(&request.turns, config, &self.settings.safety);
        debug!(model, turns = request.turns.len(), "sending generation request");
        extract_text(self.post_generate(credential, model, &body, self.settings.request_timeout())?)
    }

    fn list_models(&self, credential: &Credential) -> Result<Vec<String>, BackendError> {
        let resp = self
            .http
            .get(self.url("models"))
            .header("x-goog-api-key", credential.secret())
            .timeout(self.settings.probe_timeout())
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate_body(resp.text().unwrap_or_default()),
            });
        }

        let listed: ListModelsResponse = resp.json()?;
        Ok(listed
            .models
            .into_iter()
            .filter(|m| m.supported_generation_methods.iter().any(|g| g == "generateContent"))
            .map(|m| m.name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_maps_roles_and_settings() {
        let request = GenerationRequest::new(
            "directive".into(),
            &[HistoryEntry::participant("pitch"), HistoryEntry::narrator("{}")],
            "A",
        );
        let safety = SafetySetting::relaxed();
        let config = GenerationConfig {
            temperature: 0.5,
            max_output_tokens: 8192,
            response_mime_type: Some("application/json"),
        };
        let body = serde_json::to_value(build_body(&request.turns, config, &safety)).unwrap();

        let roles: Vec<&str> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "user", "model", "user"]);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "directive");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_NONE");
    }

    #[test]
    fn probe_body_has_no_safety_or_mime_type() {
        let turns = [HistoryEntry::participant("T")];
        let config = GenerationConfig {
            temperature: 0.0,
            max_output_tokens: 8,
            response_mime_type: None,
        };
        let body = serde_json::to_value(build_body(&turns, config, &[])).unwrap();
        assert!(body.get("safetySettings").is_none());
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn joins_candidate_parts() {
        let text = extract_text(response(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": " 1}"}]},
                "finishReason": "STOP"
            }]
        })))
        .unwrap();
        assert_eq!(text, "{\"a\": 1}");
    }

    #[test]
    fn blocked_and_empty_responses_are_errors() {
        let blocked = extract_text(response(json!({
            "promptFeedback": {"blockReason": "OTHER"}
        })));
        assert!(matches!(blocked, Err(BackendError::Blocked(r)) if r == "OTHER"));

        let empty = extract_text(response(json!({"candidates": []})));
        assert!(matches!(empty, Err(BackendError::Empty)));

        let no_content = extract_text(response(json!({"candidates": [{"finishReason": "STOP"}]})));
        assert!(matches!(no_content, Err(BackendError::Empty)));
    }

    #[test]
    fn probe_accepts_answers_without_text() {
        let cut_off = response(json!({
            "candidates": [{"content": {"role": "model"}, "finishReason": "MAX_TOKENS"}]
        }));
        assert!(probe_verdict(cut_off).is_ok());
        assert!(probe_verdict(response(json!({"candidates": []}))).is_ok());

        let blocked = probe_verdict(response(json!({"promptFeedback": {"blockReason": "SAFETY"}})));
        assert!(matches!(blocked, Err(BackendError::Blocked(r)) if r == "SAFETY"));
    }

    #[test]
    fn credential_debug_hides_secret() {
        let key = Credential::new("AIzaSyVerySecretKey1234");
        let shown = format!("{key:?}");
        assert!(!shown.contains("VerySecret"));
        assert!(shown.contains("1234"));
    }

    #[test]
    fn long_error_bodies_are_cut() {
        let body = truncate_body("é".repeat(400));
        assert!(body.len() <= 304);
        assert!(body.ends_with('…'));
    }
}
