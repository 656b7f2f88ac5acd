/// External name-to-category classifier.
///
/// The engine only depends on the `Classifier` trait: an ordered list of
/// file names in, a name-to-category mapping out. Empty output, missing
/// names, and hard failures are all tolerated by the resolver, which falls
/// back to the local extension table.
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::category::Category;

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You are a file categorization assistant. You are given a list of \
file names, one per line. Assign each name exactly one of these categories: Documents, Images, \
Videos, Archives, Installers, Code, Audio, Junk. Reply with a single JSON object mapping every \
file name to its category and nothing else.";

/// Errors internal to the classifier; the resolver recovers from all of
/// them and never surfaces them to the caller.
#[derive(Debug)]
pub enum ClassifyError {
    Request(String),
    Api(String),
    Parse(String),
}

impl std::fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifyError::Request(reason) => write!(f, "Classifier request failed: {reason}"),
            ClassifyError::Api(reason) => write!(f, "Classifier API error: {reason}"),
            ClassifyError::Parse(reason) => write!(f, "Unusable classifier response: {reason}"),
        }
    }
}

impl std::error::Error for ClassifyError {}

pub trait Classifier {
    /// Maps file names (no paths, no content) to suggested categories.
    /// Names missing from the result are handled by the caller's fallback.
    fn classify(&self, names: &[String]) -> Result<HashMap<String, Category>, ClassifyError>;
}

/// Classifier that suggests nothing; every name goes through the local
/// extension fallback. Used for offline operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClassifier;

impl Classifier for NullClassifier {
    fn classify(&self, _names: &[String]) -> Result<HashMap<String, Category>, ClassifyError> {
        Ok(HashMap::new())
    }
}

#[derive(Serialize)]
struct MessageContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<MessageContent>,
}

#[derive(Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Classifier backed by an Anthropic-style messages endpoint.
pub struct HttpClassifier {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpClassifier {
    pub fn new(api_key: &str, model: &str) -> Result<Self, ClassifyError> {
        Self::with_api_url(api_key, model, DEFAULT_API_URL)
    }

    pub fn with_api_url(api_key: &str, model: &str, api_url: &str) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClassifyError::Request(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn request_text(&self, names: &[String]) -> Result<String, ClassifyError> {
        let request = ApiRequest {
            model: self.model.clone(),
            max_tokens: 2048,
            system: SYSTEM_PROMPT.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![MessageContent {
                    content_type: "text".to_string(),
                    text: names.join("\n"),
                }],
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| ClassifyError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                return Err(ClassifyError::Api(api_error.error.message));
            }
            return Err(ClassifyError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .map_err(|e| ClassifyError::Parse(e.to_string()))?;

        let text = api_response
            .content
            .iter()
            .filter_map(|block| {
                if block.content_type == "text" {
                    block.text.clone()
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }

    /// Extracts the name-to-category object from the reply text.
    /// Models occasionally wrap the JSON in prose, so only the outermost
    /// braces are parsed. Unknown labels are dropped, which leaves those
    /// names to the extension fallback.
    fn parse_mapping(text: &str) -> Result<HashMap<String, Category>, ClassifyError> {
        let start = text
            .find('{')
            .ok_or_else(|| ClassifyError::Parse("no JSON object in response".to_string()))?;
        let end = text
            .rfind('}')
            .ok_or_else(|| ClassifyError::Parse("unterminated JSON object".to_string()))?;
        if end < start {
            return Err(ClassifyError::Parse("malformed JSON object".to_string()));
        }

        let raw: HashMap<String, String> = serde_json::from_str(&text[start..=end])
            .map_err(|e| ClassifyError::Parse(e.to_string()))?;

        Ok(raw
            .into_iter()
            .filter_map(|(name, label)| Category::from_label(&label).map(|c| (name, c)))
            .collect())
    }
}

impl Classifier for HttpClassifier {
    fn classify(&self, names: &[String]) -> Result<HashMap<String, Category>, ClassifyError> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }
        let text = self.request_text(names)?;
        Self::parse_mapping(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mapping_reads_plain_json() {
        let mapping = HttpClassifier::parse_mapping(
            r#"{"a.pdf": "Documents", "b.png": "Images"}"#,
        )
        .expect("parse failed");
        assert_eq!(mapping.get("a.pdf"), Some(&Category::Documents));
        assert_eq!(mapping.get("b.png"), Some(&Category::Images));
    }

    #[test]
    fn parse_mapping_tolerates_surrounding_prose() {
        let mapping = HttpClassifier::parse_mapping(
            "Here are the categories:\n{\"song.mp3\": \"Audio\"}\nDone.",
        )
        .expect("parse failed");
        assert_eq!(mapping.get("song.mp3"), Some(&Category::Audio));
    }

    #[test]
    fn parse_mapping_drops_unknown_labels() {
        let mapping =
            HttpClassifier::parse_mapping(r#"{"a.bin": "Blobs", "b.zip": "Archives"}"#)
                .expect("parse failed");
        assert!(!mapping.contains_key("a.bin"));
        assert_eq!(mapping.get("b.zip"), Some(&Category::Archives));
    }

    #[test]
    fn parse_mapping_rejects_garbage() {
        assert!(HttpClassifier::parse_mapping("no json here").is_err());
        assert!(HttpClassifier::parse_mapping("{not valid}").is_err());
    }

    #[test]
    fn null_classifier_returns_empty_mapping() {
        let mapping = NullClassifier
            .classify(&["a.pdf".to_string()])
            .expect("classify failed");
        assert!(mapping.is_empty());
    }
}
