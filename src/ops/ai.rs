// ============================================================================
// AI OPERATIONS: image-to-image calls behind a small blocking trait
// ============================================================================
//
// Both operations take and return `data:` URLs so the editor never needs to
// know which backend produced the pixels. Calls block; the app runs them on
// the rayon pool and polls for the result.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::io::{self, ImageIoError};
use crate::ops::color_removal;
use crate::settings::{AiProvider, AppSettings};

const CONNECT_TIMEOUT_SECS: u64 = 10;

const REMOVE_BACKGROUND_PROMPT: &str = "Remove the background from this image. Keep the main \
subject exactly as it is and return it on a fully transparent background as a PNG.";

/// Errors from an image AI backend.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// The environment variable named in the settings is unset or empty.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    #[error("HTTP client build failed: {0}")]
    Client(String),

    #[error("AI request failed: {0}")]
    Request(String),

    /// Non-success HTTP status from the provider.
    #[error("AI service returned status {status}")]
    Status { status: u16, body: String },

    #[error("AI response parse failed: {0}")]
    InvalidResponse(String),

    /// The model answered without an image part.
    #[error("AI service returned no image{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    NoImage { reason: Option<String> },

    #[error("{0} is not available with this AI provider")]
    Unsupported(&'static str),

    #[error(transparent)]
    Image(#[from] ImageIoError),
}

/// Image-to-image backend. Implementations must be callable from worker threads.
pub trait ImageAiService: Send + Sync {
    /// Return the image with its background made transparent.
    fn remove_background(&self, data_url: &str) -> Result<String, AiError>;

    /// Return the image with its subject placed into the scene described by `prompt`.
    fn generate_background(&self, data_url: &str, prompt: &str) -> Result<String, AiError>;

    fn name(&self) -> &'static str;
}

/// One unit of AI work, owned so it can move onto a worker thread.
#[derive(Clone, Debug, PartialEq)]
pub enum AiTask {
    RemoveBackground { source: String },
    GenerateScene { source: String, prompt: String },
}

impl AiTask {
    pub fn label(&self) -> &'static str {
        match self {
            AiTask::RemoveBackground { .. } => "Auto Remove",
            AiTask::GenerateScene { .. } => "AI Scene",
        }
    }

    pub fn run(&self, service: &dyn ImageAiService) -> Result<String, AiError> {
        match self {
            AiTask::RemoveBackground { source } => service.remove_background(source),
            AiTask::GenerateScene { source, prompt } => service.generate_background(source, prompt),
        }
    }
}

/// Build the backend selected in the settings.
pub fn service_from_settings(settings: &AppSettings) -> Result<Arc<dyn ImageAiService>, AiError> {
    Ok(match settings.ai_provider {
        AiProvider::Gemini => Arc::new(GeminiImageService::from_settings(settings)?),
        AiProvider::Local => Arc::new(LocalImageService::default()),
    })
}

// ============================================================================
// GEMINI
// ============================================================================

pub struct GeminiImageService {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl GeminiImageService {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        api_key_env: &str,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AiError::Client(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            api_key_env: api_key_env.to_string(),
        })
    }

    /// A missing key is not an error here; calls fail with
    /// [`AiError::MissingApiKey`] so the user sees it in the editor.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, AiError> {
        Self::new(
            &settings.ai_base_url,
            &settings.ai_model,
            settings.ai_api_key(),
            &settings.ai_api_key_env,
            Duration::from_secs(settings.ai_timeout_secs.max(1)),
        )
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn edit(&self, data_url: &str, instruction: &str) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| AiError::MissingApiKey {
            var: self.api_key_env.clone(),
        })?;
        let (mime, bytes) = io::parse_data_url(data_url)?;
        let body = build_generate_request(&mime, &bytes, instruction);

        log::info!("gemini: {} ({} bytes in)", self.model, bytes.len());
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(|e| AiError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().map_err(|e| AiError::Request(e.to_string()))?;
        if status != 200 {
            log::warn!("gemini: status {status}");
            return Err(AiError::Status { status, body: text });
        }
        parse_generate_response(&text)
    }
}

impl ImageAiService for GeminiImageService {
    fn remove_background(&self, data_url: &str) -> Result<String, AiError> {
        self.edit(data_url, REMOVE_BACKGROUND_PROMPT)
    }

    fn generate_background(&self, data_url: &str, prompt: &str) -> Result<String, AiError> {
        self.edit(data_url, &scene_instruction(prompt))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

pub fn scene_instruction(prompt: &str) -> String {
    format!(
        "Keep the main subject of this image exactly as it is and replace everything \
         around it with this scene: {}. Match the lighting so the result looks natural.",
        prompt.trim()
    )
}

// =============================================================================
// GEMINI: wire types
// =============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<ReqContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct ReqContent<'a> {
    parts: Vec<ReqPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ReqPart<'a> {
    Inline { inline_data: ReqInline<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ReqInline<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: [&'static str; 2],
}

fn build_generate_request<'a>(mime: &'a str, bytes: &[u8], instruction: &'a str) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![ReqContent {
            parts: vec![
                ReqPart::Inline {
                    inline_data: ReqInline {
                        mime_type: mime,
                        data: io::encode_base64(bytes),
                    },
                },
                ReqPart::Text { text: instruction },
            ],
        }],
        generation_config: GenerationConfig {
            response_modalities: ["IMAGE", "TEXT"],
        },
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<RespContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct RespContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}

#[derive(Deserialize)]
struct RespPart {
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<RespInline>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct RespInline {
    #[serde(rename = "mimeType", alias = "mime_type")]
    mime_type: Option<String>,
    data: String,
}

/// First inline image of the first candidate, as a data URL.
pub fn parse_generate_response(text: &str) -> Result<String, AiError> {
    let resp: GenerateResponse =
        serde_json::from_str(text).map_err(|e| AiError::InvalidResponse(e.to_string()))?;
    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AiError::NoImage { reason: None })?;

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let mut model_text = None;
    for part in parts {
        if let Some(inline) = part.inline_data {
            let mime = inline.mime_type.unwrap_or_else(|| "image/png".to_string());
            return Ok(format!("data:{mime};base64,{}", inline.data));
        }
        if model_text.is_none() {
            model_text = part.text.filter(|t| !t.trim().is_empty());
        }
    }
    Err(AiError::NoImage {
        reason: model_text.or(candidate.finish_reason),
    })
}

// ============================================================================
// LOCAL (offline)
// ============================================================================

/// Offline backend: keys out the border colour, cannot invent scenery.
pub struct LocalImageService {
    pub tolerance: f32,
    pub smoothness: u32,
}

impl Default for LocalImageService {
    fn default() -> Self {
        Self {
            tolerance: color_removal::DEFAULT_TOLERANCE,
            smoothness: color_removal::DEFAULT_SMOOTHNESS,
        }
    }
}

impl ImageAiService for LocalImageService {
    fn remove_background(&self, data_url: &str) -> Result<String, AiError> {
        let image = io::decode_data_url(data_url)?;
        let keyed = color_removal::remove_edge_background(&image, self.tolerance, self.smoothness);
        Ok(io::encode_png_data_url(&keyed)?)
    }

    fn generate_background(&self, _data_url: &str, _prompt: &str) -> Result<String, AiError> {
        Err(AiError::Unsupported("AI scene generation"))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
#[path = "ai_test.rs"]
mod tests;
