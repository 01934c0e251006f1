use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use super::wire::{normalize_response, EditWireRequest, GenerateContentResponse};
use super::{EditOptions, EditResult, ModelCatalog, RemoteEditClient, RemoteError, RemoteResult};
use crate::config::AppConfig;
use crate::image_state::ImageState;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];
const API_KEY_HEADER: &str = "x-goog-api-key";
const ERROR_BODY_EXCERPT_CHARS: usize = 300;

fn normalize(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}

/// Client for the `generateContent` image endpoint.
///
/// Sends the image and instruction as one request and waits for the whole
/// response; nothing is streamed.
#[derive(Debug, Clone)]
pub struct GeminiEditClient {
    http: Client,
    api_base: String,
    api_key: String,
    models: ModelCatalog,
}

impl GeminiEditClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            models: ModelCatalog::default(),
        }
    }

    /// Reads the API key from the environment and applies base URL, model ids
    /// and timeout from `config`.
    pub fn from_config(config: &AppConfig) -> RemoteResult<Self> {
        let api_key = api_key_from_env().ok_or(RemoteError::MissingApiKey)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;
        Ok(Self::new(api_key)
            .with_http_client(http)
            .with_api_base(&config.api_base)
            .with_models(config.models()))
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = normalize(api_base);
        self
    }

    pub fn with_models(mut self, models: ModelCatalog) -> Self {
        self.models = models;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn models(&self) -> &ModelCatalog {
        &self.models
    }

    pub fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    async fn send(&self, request: &EditWireRequest) -> anyhow::Result<GenerateContentResponse> {
        let endpoint = self.endpoint_for_model(&request.model);
        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request.to_generate_content())
            .send()
            .await
            .with_context(|| format!("edit request to {} failed", request.model))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "model service returned HTTP {}: {}",
                status.as_u16(),
                excerpt(&body)
            );
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .context("failed to parse model response")
    }
}

#[async_trait]
impl RemoteEditClient for GeminiEditClient {
    async fn submit_edit(
        &self,
        image: &ImageState,
        instruction: &str,
        options: &EditOptions,
    ) -> EditResult {
        let model = self.models.resolve(options.model);
        let request = EditWireRequest::new(image, instruction, model, options);
        tracing::info!(
            model,
            image = image.id(),
            bytes = image.pixel_data().len(),
            size = ?request.image_config.map(|config| config.image_size),
            "dispatching edit request"
        );

        match self.send(&request).await {
            Ok(response) => {
                let result = normalize_response(&response, instruction, Utc::now());
                if let Some(reason) = result.failure_reason() {
                    tracing::warn!(model, %reason, "model responded without a usable image");
                }
                result
            }
            Err(err) => {
                tracing::warn!(model, error = %format!("{err:#}"), "edit request failed");
                EditResult::failure(format!("{err:#}"))
            }
        }
    }
}

fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(ERROR_BODY_EXCERPT_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{sample_png, ImageEncoding};

    #[test]
    fn endpoint_prefixes_models_path_once() {
        let client = GeminiEditClient::new("key").with_api_base("https://example.test/v1beta/");
        assert_eq!(
            client.endpoint_for_model("gemini-2.5-flash-image"),
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(
            client.endpoint_for_model("models/custom"),
            "https://example.test/v1beta/models/custom:generateContent"
        );
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(ERROR_BODY_EXCERPT_CHARS + 50);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), ERROR_BODY_EXCERPT_CHARS + 3);
        assert_eq!(excerpt("  short  "), "short");
    }

    #[tokio::test]
    async fn transport_failure_resolves_to_failure_result() {
        // Port 9 on localhost refuses connections; the error must not escape.
        let client = GeminiEditClient::new("key").with_api_base("http://127.0.0.1:9/v1beta");
        let image = ImageState::from_encoded(sample_png(2, 2), ImageEncoding::Png).expect("state");
        let result = client
            .submit_edit(&image, "make it blue", &EditOptions::default())
            .await;
        let reason = result.failure_reason().expect("failure");
        assert!(reason.contains("edit request to gemini-2.5-flash-image failed"));
    }
}
