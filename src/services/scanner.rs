//! Crop scanner — client for the external image-analysis service.
//!
//! DESIGN
//! ======
//! The scanner screen sends a crop photo plus a fixed diagnosis prompt and
//! gets back a structured [`CropDiagnosis`]. The service is an opaque
//! collaborator behind the [`CropAnalyzer`] trait; `GeminiAnalyzer` is the
//! one concrete adapter, posting `generateContent` with the image inlined as
//! base64.
//!
//! ERROR HANDLING
//! ==============
//! Transport errors, non-200 statuses and unparseable replies all fold into
//! `ScanError::AnalysisFailed` — callers show a generic analysis-failed
//! notice and nothing more.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;

const ANALYSIS_PROMPT: &str = "You are an agricultural expert. Analyze this crop photo and reply \
with JSON only, no prose, using exactly these fields: cropName (string), healthStatus (one of \
\"healthy\", \"diseased\", \"pest\", \"nutrient_deficiency\"), confidence (integer 0-100), \
diagnosis (string), recommendations (array of strings).";

/// Errors from the crop analyzer.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The API key env var is not set; scanner features are disabled.
    #[error("crop analyzer not configured")]
    NotConfigured,
    /// Anything that went wrong talking to or understanding the service.
    #[error("crop analysis failed: {0}")]
    AnalysisFailed(String),
}

/// Overall verdict on the scanned crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Diseased,
    Pest,
    NutrientDeficiency,
}

/// Structured diagnosis returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropDiagnosis {
    pub crop_name: String,
    pub health_status: HealthStatus,
    /// 0–100.
    pub confidence: u8,
    pub diagnosis: String,
    pub recommendations: Vec<String>,
}

/// The external analysis collaborator: image in, diagnosis out.
#[async_trait::async_trait]
pub trait CropAnalyzer: Send + Sync {
    async fn analyze(&self, image: &[u8], mime_type: &str) -> Result<CropDiagnosis, ScanError>;
}

/// Adapter for the Gemini `generateContent` API.
pub struct GeminiAnalyzer {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiAnalyzer {
    /// Build from `GEMINI_API_KEY` (and optional `GEMINI_BASE_URL`).
    ///
    /// # Errors
    ///
    /// `NotConfigured` when the key is absent; `AnalysisFailed` if the HTTP
    /// client cannot be constructed.
    pub fn from_env() -> Result<Self, ScanError> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| ScanError::NotConfigured)?;
        let base_url = std::env::var("GEMINI_BASE_URL").ok();
        Self::new(api_key, base_url.as_deref())
    }

    /// # Errors
    ///
    /// `AnalysisFailed` if the HTTP client cannot be constructed.
    pub fn new(api_key: String, base_url: Option<&str>) -> Result<Self, ScanError> {
        let base_url = base_url
            .unwrap_or(DEFAULT_GEMINI_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScanError::AnalysisFailed(e.to_string()))?;
        Ok(Self { http, api_key, base_url })
    }
}

#[async_trait::async_trait]
impl CropAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, image: &[u8], mime_type: &str) -> Result<CropDiagnosis, ScanError> {
        let body = build_generate_request(ANALYSIS_PROMPT, mime_type, image);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, GEMINI_MODEL, self.api_key
        );

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::AnalysisFailed(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ScanError::AnalysisFailed(e.to_string()))?;
        if status != 200 {
            return Err(ScanError::AnalysisFailed(format!("status {status}")));
        }

        let reply = parse_generate_response(&text)?;
        parse_diagnosis(&reply)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [Part<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

pub(crate) fn build_generate_request<'a>(prompt: &'a str, mime_type: &'a str, image: &[u8]) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: [RequestContent {
            parts: [
                Part::Text { text: prompt },
                Part::Inline {
                    inline_data: InlineData { mime_type, data: BASE64.encode(image) },
                },
            ],
        }],
        generation_config: GenerationConfig { response_mime_type: "application/json" },
    }
}

/// Pull the first candidate's text out of a `generateContent` reply.
pub(crate) fn parse_generate_response(raw: &str) -> Result<String, ScanError> {
    let parsed: GenerateResponse =
        serde_json::from_str(raw).map_err(|e| ScanError::AnalysisFailed(e.to_string()))?;
    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ScanError::AnalysisFailed("empty model reply".to_owned()));
    }
    Ok(text)
}

/// Parse the model's JSON reply into a diagnosis, rejecting out-of-range
/// confidence values.
pub(crate) fn parse_diagnosis(raw: &str) -> Result<CropDiagnosis, ScanError> {
    let diagnosis: CropDiagnosis =
        serde_json::from_str(raw).map_err(|e| ScanError::AnalysisFailed(e.to_string()))?;
    if diagnosis.confidence > 100 {
        return Err(ScanError::AnalysisFailed(format!(
            "confidence out of range: {}",
            diagnosis.confidence
        )));
    }
    Ok(diagnosis)
}

#[cfg(test)]
#[path = "scanner_test.rs"]
mod tests;
