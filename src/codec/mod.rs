//! Conversions between encoded file bytes, embeddable data URIs and decoded pixels.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, ImageReader};
use thiserror::Error;

use crate::geometry::ImageSize;

const DATA_URI_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Decoded raster. Width, height and samples come from `image`.
pub type PixelBuffer = DynamicImage;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported image type: {mime}")]
    UnsupportedEncoding { mime: String },
    #[error("could not recognise image data")]
    UnknownFormat,
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode {encoding:?} image: {source}")]
    Encode {
        encoding: ImageEncoding,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to read image header: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid embeddable image: {message}")]
    InvalidEmbeddable { message: String },
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageEncoding {
    Png,
    Jpeg,
    Webp,
    Gif,
    Bmp,
}

impl ImageEncoding {
    pub const ALL: [ImageEncoding; 5] = [Self::Png, Self::Jpeg, Self::Webp, Self::Gif, Self::Bmp];

    pub fn from_mime(mime: &str) -> CodecResult<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Ok(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Ok(Self::Jpeg),
            "image/webp" => Ok(Self::Webp),
            "image/gif" => Ok(Self::Gif),
            "image/bmp" | "image/x-ms-bmp" => Ok(Self::Bmp),
            _ => Err(CodecError::UnsupportedEncoding {
                mime: mime.to_string(),
            }),
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    const fn format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Webp => ImageFormat::WebP,
            Self::Gif => ImageFormat::Gif,
            Self::Bmp => ImageFormat::Bmp,
        }
    }

    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::WebP => Some(Self::Webp),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Bmp => Some(Self::Bmp),
            _ => None,
        }
    }
}

/// Decodes `bytes`, sniffing the container first and falling back to `hint`.
pub fn decode(bytes: &[u8], hint: Option<ImageEncoding>) -> CodecResult<PixelBuffer> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let reader = match (reader.format(), hint) {
        (Some(_), _) => reader,
        (None, Some(encoding)) => {
            let mut reader = reader;
            reader.set_format(encoding.format());
            reader
        }
        (None, None) => return Err(CodecError::UnknownFormat),
    };
    reader.decode().map_err(CodecError::Decode)
}

/// Reads only the header to obtain pixel dimensions and the sniffed encoding.
pub fn probe(bytes: &[u8]) -> CodecResult<(ImageSize, Option<ImageEncoding>)> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let Some(format) = reader.format() else {
        return Err(CodecError::UnknownFormat);
    };
    let (width, height) = reader.into_dimensions().map_err(CodecError::Decode)?;
    Ok((
        ImageSize::new(width, height),
        ImageEncoding::from_format(format),
    ))
}

/// Encodes `buffer` as `encoding`. Dimensions survive exactly; lossy
/// encodings do not promise byte-identical output.
pub fn encode(buffer: &PixelBuffer, encoding: ImageEncoding) -> CodecResult<Vec<u8>> {
    // JPEG has no alpha channel; the other encoders take RGBA8.
    let normalized = match encoding {
        ImageEncoding::Jpeg => DynamicImage::ImageRgb8(buffer.to_rgb8()),
        _ => DynamicImage::ImageRgba8(buffer.to_rgba8()),
    };
    let mut output = Vec::new();
    normalized
        .write_to(&mut Cursor::new(&mut output), encoding.format())
        .map_err(|source| CodecError::Encode { encoding, source })?;
    Ok(output)
}

/// Self-describing `data:<mime>;base64,<payload>` representation.
pub fn to_embeddable(bytes: &[u8], encoding: ImageEncoding) -> String {
    format!(
        "{DATA_URI_SCHEME}{}{BASE64_MARKER}{}",
        encoding.mime(),
        BASE64.encode(bytes)
    )
}

/// Parses a data URI produced by [`to_embeddable`] back into its parts.
pub fn split_embeddable(embeddable: &str) -> CodecResult<(ImageEncoding, Vec<u8>)> {
    let rest = embeddable
        .trim()
        .strip_prefix(DATA_URI_SCHEME)
        .ok_or_else(|| CodecError::InvalidEmbeddable {
            message: "missing data: scheme".to_string(),
        })?;
    let (mime, payload) =
        rest.split_once(BASE64_MARKER)
            .ok_or_else(|| CodecError::InvalidEmbeddable {
                message: "missing ;base64, marker".to_string(),
            })?;
    let encoding = ImageEncoding::from_mime(mime)?;
    let bytes = BASE64.decode(payload.as_bytes())?;
    Ok((encoding, bytes))
}

/// Returns the raw base64 payload of a data URI, or the input unchanged when
/// it carries no embedding prefix.
pub fn strip_embedding_prefix(payload: &str) -> &str {
    let trimmed = payload.trim();
    if !trimmed.starts_with(DATA_URI_SCHEME) {
        return trimmed;
    }
    trimmed
        .split_once(BASE64_MARKER)
        .map_or(trimmed, |(_, data)| data)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn decode_base64(payload: &str) -> CodecResult<Vec<u8>> {
    Ok(BASE64.decode(strip_embedding_prefix(payload).as_bytes())?)
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = image::RgbaImage::new(width, height);
    for (x, y, pixel) in buffer.enumerate_pixels_mut() {
        *pixel = image::Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255]);
    }
    encode(&DynamicImage::ImageRgba8(buffer), ImageEncoding::Png).expect("encode sample png")
}
