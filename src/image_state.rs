use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::codec::{self, CodecError, CodecResult, ImageEncoding};
use crate::geometry::ImageSize;

static NEXT_STATE_ID: AtomicU64 = AtomicU64::new(1);

/// Renderable reference derived from an image's bytes. Dropped together with
/// the last clone of the owning [`ImageState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayHandle(Arc<str>);

impl DisplayHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

struct ImageStateInner {
    id: u64,
    pixel_data: Arc<[u8]>,
    encoding: ImageEncoding,
    size: ImageSize,
    display: OnceLock<DisplayHandle>,
}

/// One immutable version of the working image.
///
/// Cloning is cheap and shares bytes and display handle. There is no way to
/// change a state after construction; edits build a new one.
#[derive(Clone)]
pub struct ImageState {
    inner: Arc<ImageStateInner>,
}

impl ImageState {
    /// Builds a state from encoded bytes. The whole payload is decoded once,
    /// so bytes with an intact header but a damaged body are rejected.
    pub fn from_encoded(pixel_data: Vec<u8>, encoding: ImageEncoding) -> CodecResult<Self> {
        let (_, sniffed) = codec::probe(&pixel_data)?;
        let encoding = sniffed.unwrap_or(encoding);
        let decoded = codec::decode(&pixel_data, Some(encoding))?;
        let size = ImageSize::new(decoded.width(), decoded.height());
        if size.width == 0 || size.height == 0 {
            return Err(CodecError::UnknownFormat);
        }
        Ok(Self {
            inner: Arc::new(ImageStateInner {
                id: NEXT_STATE_ID.fetch_add(1, Ordering::Relaxed),
                pixel_data: pixel_data.into(),
                encoding,
                size,
                display: OnceLock::new(),
            }),
        })
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn pixel_data(&self) -> &[u8] {
        &self.inner.pixel_data
    }

    pub fn encoding(&self) -> ImageEncoding {
        self.inner.encoding
    }

    pub fn natural_size(&self) -> ImageSize {
        self.inner.size
    }

    /// Lazily derives the embeddable representation on first use.
    pub fn display_handle(&self) -> DisplayHandle {
        self.inner
            .display
            .get_or_init(|| {
                DisplayHandle(codec::to_embeddable(&self.inner.pixel_data, self.inner.encoding).into())
            })
            .clone()
    }

    pub fn decode(&self) -> CodecResult<codec::PixelBuffer> {
        codec::decode(&self.inner.pixel_data, Some(self.inner.encoding))
    }

    pub fn same_version(&self, other: &ImageState) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[cfg(test)]
    pub(crate) fn display_is_materialized(&self) -> bool {
        self.inner.display.get().is_some()
    }

    #[cfg(test)]
    pub(crate) fn downgrade_display(&self) -> Option<std::sync::Weak<str>> {
        self.inner.display.get().map(|handle| Arc::downgrade(&handle.0))
    }
}

impl PartialEq for ImageState {
    fn eq(&self, other: &Self) -> bool {
        self.same_version(other)
    }
}

impl Eq for ImageState {}

impl fmt::Debug for ImageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageState")
            .field("id", &self.inner.id)
            .field("encoding", &self.inner.encoding)
            .field("size", &self.inner.size)
            .field("bytes", &self.inner.pixel_data.len())
            .finish()
    }
}
