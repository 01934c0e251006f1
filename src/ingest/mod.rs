//! Turns a user-provided file into the first image version of a session.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::{CodecError, ImageEncoding};
use crate::image_state::ImageState;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("please choose an image file (got {declared})")]
    NotAnImage { declared: String },
    #[error("{mime} images are not supported; use PNG, JPEG, WebP, GIF or BMP")]
    Unsupported { mime: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("the image could not be decoded: {0}")]
    Decode(#[from] CodecError),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Accepts `bytes` only when `declared_mime` names an image type and the
/// bytes decode as one.
pub fn ingest_bytes(bytes: Vec<u8>, declared_mime: &str) -> IngestResult<ImageState> {
    let declared = declared_mime.trim();
    if !declared.to_ascii_lowercase().starts_with("image/") {
        tracing::warn!(declared, "rejected upload without an image content type");
        return Err(IngestError::NotAnImage {
            declared: if declared.is_empty() {
                "no content type".to_string()
            } else {
                declared.to_string()
            },
        });
    }
    let encoding = ImageEncoding::from_mime(declared).map_err(|_| IngestError::Unsupported {
        mime: declared.to_string(),
    })?;
    let state = ImageState::from_encoded(bytes, encoding)?;
    tracing::info!(
        image = state.id(),
        encoding = ?state.encoding(),
        width = state.natural_size().width,
        height = state.natural_size().height,
        "ingested image"
    );
    Ok(state)
}

/// Reads a file, inferring the content type from its extension.
pub fn ingest_path(path: &Path) -> IngestResult<ImageState> {
    let encoding = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageEncoding::from_extension)
        .ok_or_else(|| IngestError::NotAnImage {
            declared: path.display().to_string(),
        })?;
    let bytes = std::fs::read(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ingest_bytes(bytes, encoding.mime())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::sample_png;

    #[test]
    fn ingest_bytes_accepts_declared_image() {
        let state = ingest_bytes(sample_png(8, 5), "image/png").expect("png accepted");
        assert_eq!(state.natural_size().width, 8);
    }

    #[test]
    fn ingest_bytes_rejects_non_image_content_type() {
        let err = ingest_bytes(sample_png(8, 5), "application/pdf").expect_err("pdf rejected");
        assert!(matches!(err, IngestError::NotAnImage { .. }));
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn ingest_bytes_rejects_unsupported_image_type() {
        let err = ingest_bytes(sample_png(8, 5), "image/x-icon").expect_err("ico rejected");
        assert!(matches!(err, IngestError::Unsupported { .. }));
    }

    #[test]
    fn ingest_bytes_rejects_corrupt_payload() {
        let err = ingest_bytes(b"\x89PNG broken".to_vec(), "image/png").expect_err("corrupt");
        assert!(matches!(err, IngestError::Decode(_)));
    }

    #[test]
    fn ingest_bytes_rejects_truncated_image() {
        let full = sample_png(64, 64);
        let err = ingest_bytes(full[..60].to_vec(), "image/png").expect_err("truncated");
        assert!(matches!(err, IngestError::Decode(CodecError::Decode(_))));
    }

    #[test]
    fn ingest_path_infers_type_from_extension() {
        let path = std::env::temp_dir().join(format!("promptedit-ingest-{}.png", std::process::id()));
        std::fs::write(&path, sample_png(3, 3)).expect("write fixture");
        let state = ingest_path(&path).expect("ingest");
        assert_eq!(state.encoding(), ImageEncoding::Png);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn ingest_path_rejects_unknown_extension() {
        let err = ingest_path(Path::new("/tmp/notes.txt")).expect_err("txt rejected");
        assert!(matches!(err, IngestError::NotAnImage { .. }));
    }
}
