//! AI backend collaborator - direct REST implementation for the
//! Cerebras chat-completions API.
//!
//! The backend is optional end to end: absence or failure degrades the
//! caller to its deterministic path, it never crashes a turn. Responses
//! are requested as strict JSON objects and recovered with a tolerant
//! brace scan when the model wraps them in prose.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use clarion_core::ClarionError;
use clarion_core::config::ClarionConfig;
use clarion_core::model::{ContactKind, ContactRecord, HazardKind, IntentKind};

const BASE_URL: &str = "https://api.cerebras.ai/v1/chat/completions";

/// Classification produced by the AI backend.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentGuess {
    pub kind: IntentKind,
    /// Confidence in [0, 1].
    pub confidence: f32,
    pub hazard: Option<HazardKind>,
    pub location: Option<String>,
}

/// Hints handed to the extraction assist: what the pattern pass already
/// found and where the content came from.
#[derive(Debug, Clone, Default)]
pub struct ExtractionHints {
    pub source_url: Option<String>,
    pub ambiguous_spans: Vec<String>,
}

/// The AI backend contract.
///
/// `classify` resolves low-confidence intent classifications;
/// `extract_contacts` resolves spans the regex pass could not classify;
/// `summarize` turns collected material into a short user-facing brief.
#[async_trait]
pub trait AiBackend: Send + Sync {
    async fn classify(&self, text: &str) -> Result<IntentGuess, ClarionError>;

    async fn extract_contacts(
        &self,
        content: &str,
        hints: &ExtractionHints,
    ) -> Result<Vec<ContactRecord>, ClarionError>;

    async fn summarize(&self, prompt: &str) -> Result<String, ClarionError>;
}

/// AI backend implementation that talks to the Cerebras HTTP API.
#[derive(Clone)]
pub struct CerebrasBackend {
    client: Client,
    api_key: String,
    model: String,
}

impl CerebrasBackend {
    /// Creates a new backend with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Builds the backend from configuration, or `None` when no
    /// credential is configured.
    pub fn from_config(config: &ClarionConfig) -> Option<Self> {
        config
            .ai_api_key
            .as_deref()
            .map(|key| Self::new(key, config.ai_model.as_str(), config.call_timeout))
    }

    async fn complete(&self, prompt: &str) -> Result<String, ClarionError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: 1024,
            temperature: 0.1,
        };

        match self.send_request(&request).await {
            Ok(text) => Ok(text),
            Err(err) if err.is_retryable() => {
                // One bounded retry with jittered backoff.
                let jitter = rand::thread_rng().gen_range(0..250u64);
                tokio::time::sleep(Duration::from_millis(500 + jitter)).await;
                self.send_request(&request).await
            }
            Err(err) => Err(err),
        }
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String, ClarionError> {
        let response = self
            .client
            .post(BASE_URL)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                ClarionError::external(
                    "ai_backend",
                    format!("Cerebras API request failed: {err}"),
                    err.is_connect() || err.is_timeout(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Cerebras error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            ClarionError::external(
                "ai_backend",
                format!("Failed to parse Cerebras response: {err}"),
                false,
            )
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                ClarionError::external("ai_backend", "Cerebras returned no choices", false)
            })
    }
}

#[async_trait]
impl AiBackend for CerebrasBackend {
    async fn classify(&self, text: &str) -> Result<IntentGuess, ClarionError> {
        let prompt = format!(
            "Classify the primary intent of this emergency request as one of \
             \"rescue\" (immediate life-saving assistance), \"resource\" \
             (locating specific contacts or supplies) or \"information\" \
             (general guidance or status updates).\n\
             Respond with ONLY a JSON object shaped as\n\
             {{\"intent\": \"rescue|resource|information\", \"confidence\": 0-100, \
             \"hazard\": \"flood|wildfire|earthquake|hurricane|tornado|medical|general|null\", \
             \"location\": \"place name or null\"}}\n\n\
             Request: \"{text}\""
        );

        let raw = self.complete(&prompt).await?;
        let json = extract_json_object(&raw).ok_or_else(|| {
            ClarionError::ClassificationUnavailable(
                "AI classification returned no JSON object".to_string(),
            )
        })?;

        let kind = json
            .get("intent")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<IntentKind>().ok())
            .unwrap_or(IntentKind::Unknown);
        let confidence = json
            .get("confidence")
            .and_then(Value::as_f64)
            .map(normalize_confidence)
            .unwrap_or(0.0);
        let hazard = json
            .get("hazard")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<HazardKind>().ok());
        let location = json
            .get("location")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty() && *s != "null")
            .map(str::to_string);

        Ok(IntentGuess {
            kind,
            confidence,
            hazard,
            location,
        })
    }

    async fn extract_contacts(
        &self,
        content: &str,
        hints: &ExtractionHints,
    ) -> Result<Vec<ContactRecord>, ClarionError> {
        // Cap the content so one oversized page cannot blow the prompt.
        let excerpt: String = content.chars().take(6000).collect();
        let ambiguous = if hints.ambiguous_spans.is_empty() {
            String::new()
        } else {
            format!(
                "\nThese spans were ambiguous to pattern matching, classify them too: {:?}",
                hints.ambiguous_spans
            )
        };

        let prompt = format!(
            "Analyze the following webpage content for contact information. \
             Look for standard phone numbers, emergency numbers (near words \
             like 'emergency', 'hotline', 'urgent', '24/7', 'rescue'), email \
             addresses and physical addresses.\n\
             Respond with ONLY a JSON object shaped as\n\
             {{\"emergency_phone\": [], \"phone\": [], \"email\": [], \"address\": []}}\
             {ambiguous}\n\nContent:\n{excerpt}"
        );

        let raw = self.complete(&prompt).await?;
        let json = extract_json_object(&raw).ok_or_else(|| {
            ClarionError::external("ai_backend", "AI extraction returned no JSON object", false)
        })?;

        let mut records = Vec::new();
        for (field, kind) in [
            ("emergency_phone", ContactKind::EmergencyPhone),
            ("phone", ContactKind::Phone),
            ("email", ContactKind::Email),
            ("address", ContactKind::Address),
        ] {
            if let Some(values) = json.get(field).and_then(Value::as_array) {
                for value in values.iter().filter_map(Value::as_str) {
                    let mut record = ContactRecord::new(kind, value).with_confidence(0.6);
                    if let Some(url) = &hints.source_url {
                        record = record.with_source(url.clone());
                    }
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    async fn summarize(&self, prompt: &str) -> Result<String, ClarionError> {
        self.complete(prompt).await
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

fn map_http_error(status: StatusCode, body: String) -> ClarionError {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|err| err.get("message"))
                .and_then(|msg| msg.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    ClarionError::external(
        "ai_backend",
        format!("Cerebras API returned {status}: {message}"),
        retryable,
    )
}

/// Models report confidence as either a 0-100 integer or a 0-1 float;
/// fold both onto [0, 1].
fn normalize_confidence(raw: f64) -> f32 {
    let value = if raw > 1.0 { raw / 100.0 } else { raw };
    value.clamp(0.0, 1.0) as f32
}

/// Recovers the first JSON object embedded in free-form model output.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_json_wrapped_in_prose() {
        let raw = "Sure! Here is the classification:\n{\"intent\": \"rescue\", \
                   \"confidence\": 90}\nLet me know if you need more.";
        let json = extract_json_object(raw).unwrap();
        assert_eq!(json["intent"], "rescue");
        assert_eq!(json["confidence"], 90);
    }

    #[test]
    fn rejects_text_without_object() {
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("}{").is_none());
    }

    #[test]
    fn confidence_scale_is_folded() {
        assert!((normalize_confidence(90.0) - 0.9).abs() < 1e-6);
        assert!((normalize_confidence(0.42) - 0.42).abs() < 1e-6);
        assert_eq!(normalize_confidence(250.0), 1.0);
    }
}
