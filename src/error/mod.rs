use crate::codec::CodecError;
use crate::crop::CropError;
use crate::export::ExportError;
use crate::ingest::IngestError;
use crate::remote::RemoteError;
use crate::session::SessionError;
use crate::state::StateError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Crop(#[from] CropError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
