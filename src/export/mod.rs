use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::image_state::ImageState;

const DEFAULT_EXPORT_SUBDIR: &str = "Pictures";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("export prefix is empty")]
    MissingPrefix,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// `<prefix>-<YYYYMMDD-HHMMSS>.<ext>` for the given image.
pub fn suggested_file_name(prefix: &str, image: &ImageState, timestamp: DateTime<Local>) -> String {
    format!(
        "{prefix}-{}.{}",
        timestamp.format(TIMESTAMP_FORMAT),
        image.encoding().extension()
    )
}

/// Saves image versions to disk exactly as they were displayed.
#[derive(Debug, Clone)]
pub struct ExportService {
    export_dir: PathBuf,
    prefix: String,
}

impl ExportService {
    pub fn with_paths(export_dir: PathBuf, prefix: impl Into<String>) -> Self {
        Self {
            export_dir,
            prefix: prefix.into(),
        }
    }

    /// `$HOME/Pictures` unless `export_dir` overrides it.
    pub fn with_default_paths(
        export_dir: Option<&Path>,
        prefix: impl Into<String>,
    ) -> ExportResult<Self> {
        let export_dir = match export_dir {
            Some(dir) => dir.to_path_buf(),
            None => {
                let home = std::env::var("HOME").map_err(|_| ExportError::MissingHomeDirectory)?;
                PathBuf::from(home).join(DEFAULT_EXPORT_SUBDIR)
            }
        };
        Ok(Self::with_paths(export_dir, prefix))
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn allocate_target_path(
        &self,
        image: &ImageState,
        timestamp: DateTime<Local>,
    ) -> ExportResult<PathBuf> {
        let prefix = self.prefix.trim();
        if prefix.is_empty() {
            return Err(ExportError::MissingPrefix);
        }
        Ok(self
            .export_dir
            .join(suggested_file_name(prefix, image, timestamp)))
    }

    /// Writes the encoded bytes untouched; no re-encoding happens here.
    pub fn save(&self, image: &ImageState, timestamp: DateTime<Local>) -> ExportResult<PathBuf> {
        let target = self.allocate_target_path(image, timestamp)?;
        fs::create_dir_all(&self.export_dir)?;
        fs::write(&target, image.pixel_data())?;
        tracing::info!(path = %target.display(), image = image.id(), "exported image");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{sample_png, ImageEncoding};
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 3, 14, 9, 26, 53)
            .single()
            .expect("unambiguous local time")
    }

    fn image() -> ImageState {
        ImageState::from_encoded(sample_png(4, 4), ImageEncoding::Png).expect("state")
    }

    #[test]
    fn suggested_file_name_uses_prefix_timestamp_and_extension() {
        assert_eq!(
            suggested_file_name("edited-image", &image(), fixed_time()),
            "edited-image-20260314-092653.png"
        );
    }

    #[test]
    fn allocate_target_path_rejects_blank_prefix() {
        let service = ExportService::with_paths(PathBuf::from("/tmp"), "  ");
        let err = service
            .allocate_target_path(&image(), fixed_time())
            .expect_err("blank prefix");
        assert!(matches!(err, ExportError::MissingPrefix));
    }

    #[test]
    fn save_writes_bytes_unchanged() {
        let dir = std::env::temp_dir().join(format!("promptedit-export-{}", std::process::id()));
        let service = ExportService::with_paths(dir.clone(), "shot");
        let image = image();

        let path = service.save(&image, fixed_time()).expect("save");
        assert_eq!(path, dir.join("shot-20260314-092653.png"));
        assert_eq!(std::fs::read(&path).expect("read back"), image.pixel_data());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn explicit_export_dir_overrides_home() {
        let service =
            ExportService::with_default_paths(Some(Path::new("/srv/exports")), "x").expect("service");
        assert_eq!(service.export_dir(), Path::new("/srv/exports"));
    }
}
