//! Low-level client for the Gemini-style `generateContent` endpoint.
//!
//! The credential list is an explicit, ordered constructor argument; the
//! rotation walks it strictly sequentially and only a 429 moves on to the
//! next key. Any other failure aborts the rotation immediately.

use log::{debug, warn};

const ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent";

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("all generation credentials exhausted by rate limits")]
    CredentialsExhausted,
    #[error("generation endpoint returned status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("no usable text in the generation response")]
    EmptyResponse,
    #[error("malformed generation payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, serde::Serialize)]
pub struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(rename = "safetySettings", skip_serializing_if = "Option::is_none")]
    safety_settings: Option<Vec<SafetySetting>>,
}

#[derive(Debug, serde::Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, serde::Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, serde::Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "topP")]
    pub top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

#[derive(Debug, serde::Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt.into() }],
            }],
            generation_config: None,
            safety_settings: None,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    pub fn with_default_safety(mut self) -> Self {
        self.safety_settings = Some(
            HARM_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                })
                .collect(),
        );
        self
    }
}

// The response envelope: every level can be missing in practice, so every
// level is optional and extraction bails out to `EmptyResponse`.
#[derive(Debug, serde::Deserialize)]
struct ResponseEnvelope {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, serde::Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, serde::Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, serde::Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn extract_text(envelope: ResponseEnvelope) -> Option<String> {
    envelope
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts?
        .into_iter()
        .next()?
        .text
        .filter(|text| !text.trim().is_empty())
}

/// Pulls the JSON object out of a model reply: a ```json fence if present,
/// otherwise the outermost brace span.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + "```json".len()..];
        if let Some(end) = rest.find("```") {
            let inner = rest[..end].trim();
            if !inner.is_empty() {
                return Some(inner);
            }
        }
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[derive(Clone)]
pub struct GenClient {
    http: reqwest::Client,
    credentials: Vec<String>,
}

impl GenClient {
    pub fn new(credentials: Vec<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
        }
    }

    /// Submits the request through the full credential rotation.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<String, GenError> {
        for (index, credential) in self.credentials.iter().enumerate() {
            debug!(
                "trying generation with credential {}/{}",
                index + 1,
                self.credentials.len()
            );
            match self.send(credential, request).await? {
                Some(text) => return Ok(text),
                None => {
                    warn!("credential {} rate limited, rotating", index + 1);
                    continue;
                }
            }
        }
        Err(GenError::CredentialsExhausted)
    }

    /// Single shot against the primary credential only, for the simplified
    /// retry prompt.
    pub async fn generate_primary(&self, request: &GenerateRequest) -> Result<String, GenError> {
        let credential = self
            .credentials
            .first()
            .ok_or(GenError::CredentialsExhausted)?;
        self.send(credential, request)
            .await?
            .ok_or(GenError::CredentialsExhausted)
    }

    /// `Ok(None)` means "rate limited, try the next credential"; every other
    /// failure is terminal for the whole rotation.
    async fn send(
        &self,
        credential: &str,
        request: &GenerateRequest,
    ) -> Result<Option<String>, GenError> {
        let url = format!("{ENDPOINT}?key={credential}");
        let response = self.http.post(&url).json(request).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(GenError::Status(status.as_u16()));
        }

        let envelope: ResponseEnvelope = response.json().await?;
        extract_text(envelope)
            .map(Some)
            .ok_or(GenError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> ResponseEnvelope {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn extracts_text_from_a_full_envelope() {
        let envelope = envelope(
            r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#,
        );
        assert_eq!(extract_text(envelope).as_deref(), Some("hello"));
    }

    #[test]
    fn tolerates_missing_envelope_levels() {
        for json in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{}}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{}]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#,
        ] {
            assert!(extract_text(envelope(json)).is_none(), "accepted {json}");
        }
    }

    #[test]
    fn extracts_a_bare_json_object() {
        let text = "Here you go: {\"questions\": []} hope that helps";
        assert_eq!(extract_json(text), Some("{\"questions\": []}"));
    }

    #[test]
    fn extracts_a_fenced_json_object() {
        let text = "```json\n{\"questions\": [1]}\n```";
        assert_eq!(extract_json(text), Some("{\"questions\": [1]}"));
    }

    #[test]
    fn prefers_the_fence_over_surrounding_braces() {
        let text = "ignore {this} ```json\n{\"a\": 1}\n``` tail";
        assert_eq!(extract_json(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn rejects_text_without_an_object() {
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn request_serializes_in_wire_shape() {
        let request = GenerateRequest::new("prompt").with_config(GenerationConfig {
            temperature: 0.9,
            top_k: 1,
            top_p: 1.0,
            max_output_tokens: 4096,
        });
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 4096);
        assert!(json.get("safetySettings").is_none());

        let with_safety = serde_json::to_value(
            GenerateRequest::new("p").with_default_safety(),
        )
        .unwrap();
        assert_eq!(with_safety["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(
            with_safety["safetySettings"][0]["threshold"],
            "BLOCK_MEDIUM_AND_ABOVE"
        );
    }
}
