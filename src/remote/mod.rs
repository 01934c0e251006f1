//! Boundary to the remote image model: one request in, one tagged result out.

mod gemini;
pub mod wire;

pub use gemini::{GeminiEditClient, DEFAULT_API_BASE};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::image_state::ImageState;

pub const DEFAULT_FAST_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_HIGH_RESOLUTION_MODEL: &str = "gemini-3-pro-image-preview";
pub const NO_IMAGE_REASON: &str = "model returned no image";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("no API key found in GEMINI_API_KEY or GOOGLE_API_KEY")]
    MissingApiKey,
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSelector {
    #[default]
    Fast,
    HighResolution,
}

impl ModelSelector {
    /// Only the high-resolution variant accepts an output size.
    pub const fn supports_target_resolution(self) -> bool {
        matches!(self, Self::HighResolution)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetResolution {
    #[serde(rename = "1K")]
    OneK,
    #[default]
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl TargetResolution {
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

/// Model identifiers the selectors resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub fast: String,
    pub high_resolution: String,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST_MODEL.to_string(),
            high_resolution: DEFAULT_HIGH_RESOLUTION_MODEL.to_string(),
        }
    }
}

impl ModelCatalog {
    pub fn resolve(&self, selector: ModelSelector) -> &str {
        match selector {
            ModelSelector::Fast => &self.fast,
            ModelSelector::HighResolution => &self.high_resolution,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditOptions {
    pub model: ModelSelector,
    pub target_resolution: TargetResolution,
}

impl EditOptions {
    /// The resolution actually sent; `None` for models that ignore it.
    pub fn effective_resolution(&self) -> Option<TargetResolution> {
        self.model
            .supports_target_resolution()
            .then_some(self.target_resolution)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditResult {
    Success {
        image: ImageState,
        instruction: String,
        completed_at: DateTime<Utc>,
    },
    Failure {
        reason: String,
    },
}

impl EditResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn image(&self) -> Option<&ImageState> {
        match self {
            Self::Success { image, .. } => Some(image),
            Self::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failure { reason } => Some(reason),
            Self::Success { .. } => None,
        }
    }
}

/// Issues one edit against the remote model.
///
/// Implementations never return errors: transport and service problems are
/// reported as [`EditResult::Failure`]. They hold no per-call state, so one
/// client may serve overlapping calls.
#[async_trait]
pub trait RemoteEditClient: Send + Sync {
    async fn submit_edit(
        &self,
        image: &ImageState,
        instruction: &str,
        options: &EditOptions,
    ) -> EditResult;
}

#[async_trait]
impl<T: RemoteEditClient + ?Sized> RemoteEditClient for Arc<T> {
    async fn submit_edit(
        &self,
        image: &ImageState,
        instruction: &str,
        options: &EditOptions,
    ) -> EditResult {
        (**self).submit_edit(image, instruction, options).await
    }
}
