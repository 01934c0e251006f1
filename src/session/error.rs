use thiserror::Error;

use crate::codec::CodecError;
use crate::crop::CropError;
use crate::geometry::PixelRect;
use crate::ingest::IngestError;
use crate::state::StateError;

/// Input rejected before anything is dispatched or committed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("enter an instruction describing the edit")]
    EmptyInstruction,
    #[error("crop selection must span at least 10 pixels each way")]
    DegenerateCrop,
    #[error("crop {rect:?} lies outside the image")]
    CropOutOfBounds { rect: PixelRect },
    #[error("no crop selection to apply")]
    NoCropSelection,
    #[error("{message}")]
    UnsupportedUpload { message: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("an edit is already in progress")]
    EditInFlight,
    #[error("no image is loaded")]
    NoActiveSession,
    #[error(transparent)]
    Decode(#[from] CodecError),
    #[error("failed to read upload: {0}")]
    Upload(#[source] IngestError),
    #[error(transparent)]
    State(#[from] StateError),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

impl From<IngestError> for SessionError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NotAnImage { .. } | IngestError::Unsupported { .. } => {
                Self::Validation(ValidationError::UnsupportedUpload {
                    message: err.to_string(),
                })
            }
            IngestError::Decode(source) => Self::Decode(source),
            read @ IngestError::Read { .. } => Self::Upload(read),
        }
    }
}

impl From<CropError> for SessionError {
    fn from(err: CropError) -> Self {
        match err {
            CropError::Degenerate => Self::Validation(ValidationError::DegenerateCrop),
            CropError::OutOfBounds { rect, .. } => {
                Self::Validation(ValidationError::CropOutOfBounds { rect })
            }
            CropError::Codec(source) => Self::Decode(source),
        }
    }
}

impl SessionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
