//! Drag-to-crop: gesture tracking in display space, mapping to natural
//! pixels, and rasterizing the selected region into a new image version.

mod preset;

pub use preset::CropPreset;

use thiserror::Error;

use crate::codec::{self, CodecError};
use crate::geometry::{
    normalize_display_box, DisplayPoint, DisplaySize, ImageSize, PixelRect, ScaleFactors,
};
use crate::image_state::ImageState;

/// Smallest accepted drag span on either axis, in display pixels before scaling.
pub const MIN_CROP_DISPLAY_SPAN: f64 = 10.0;

#[derive(Debug, Error)]
pub enum CropError {
    #[error("crop rectangle has no area")]
    Degenerate,
    #[error("crop {rect:?} lies outside the {size:?} image")]
    OutOfBounds { rect: PixelRect, size: ImageSize },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type CropResult<T> = std::result::Result<T, CropError>;

/// Corner pair of one drag gesture, in display pixels. Corners may be reversed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSelection {
    pub start: DisplayPoint,
    pub end: DisplayPoint,
}

impl CropSelection {
    pub const fn new(start: DisplayPoint, end: DisplayPoint) -> Self {
        Self { start, end }
    }
}

/// Maps a selection onto the natural pixel grid using independent X/Y scale
/// factors. `None` when the drag spans less than [`MIN_CROP_DISPLAY_SPAN`]
/// on either axis or the display surface is empty.
pub fn compute_crop_rect(
    selection: &CropSelection,
    display: DisplaySize,
    natural: ImageSize,
) -> Option<PixelRect> {
    let bounds = normalize_display_box(selection.start, selection.end);
    if bounds.width < MIN_CROP_DISPLAY_SPAN || bounds.height < MIN_CROP_DISPLAY_SPAN {
        return None;
    }
    if natural.width == 0 || natural.height == 0 {
        return None;
    }
    let scale = ScaleFactors::between(display, natural)?;

    let x = to_pixels(bounds.left * scale.x).min(natural.width - 1);
    let y = to_pixels(bounds.top * scale.y).min(natural.height - 1);
    let width = to_pixels(bounds.width * scale.x).min(natural.width - x);
    let height = to_pixels(bounds.height * scale.y).min(natural.height - y);
    if width == 0 || height == 0 {
        return None;
    }
    Some(PixelRect::new(x, y, width, height))
}

fn to_pixels(value: f64) -> u32 {
    // `as` saturates; negative and NaN land on zero.
    value.round().max(0.0) as u32
}

/// Rasterizes exactly `rect` of `source` into a new state with the source's
/// encoding. `source` is left untouched.
pub fn apply_crop(source: &ImageState, rect: PixelRect) -> CropResult<ImageState> {
    if rect.width == 0 || rect.height == 0 {
        return Err(CropError::Degenerate);
    }
    let size = source.natural_size();
    if !rect.fits_within(size) {
        return Err(CropError::OutOfBounds { rect, size });
    }
    let decoded = source.decode()?;
    let cropped = decoded.crop_imm(rect.x, rect.y, rect.width, rect.height);
    let bytes = codec::encode(&cropped, source.encoding())?;
    let state = ImageState::from_encoded(bytes, source.encoding())?;
    tracing::debug!(
        source = source.id(),
        result = state.id(),
        ?rect,
        "rasterized crop"
    );
    Ok(state)
}

/// Tracks one crop gesture over a display surface showing an image of a
/// known natural size.
#[derive(Debug, Clone)]
pub struct CropEngine {
    surface: DisplaySize,
    natural: ImageSize,
    preset: CropPreset,
    selection: Option<CropSelection>,
    dragging: bool,
}

impl CropEngine {
    pub fn new(surface: DisplaySize, natural: ImageSize) -> Self {
        Self {
            surface,
            natural,
            preset: CropPreset::default(),
            selection: None,
            dragging: false,
        }
    }

    /// Updates geometry after a resize or a new base image. Any selection is
    /// dropped since its coordinates referred to the old surface.
    pub fn set_surface(&mut self, surface: DisplaySize, natural: ImageSize) {
        self.surface = surface;
        self.natural = natural;
        self.clear();
    }

    pub fn set_preset(&mut self, preset: CropPreset) {
        self.preset = preset;
    }

    pub fn preset(&self) -> CropPreset {
        self.preset
    }

    pub fn surface(&self) -> DisplaySize {
        self.surface
    }

    pub fn natural(&self) -> ImageSize {
        self.natural
    }

    pub fn selection(&self) -> Option<CropSelection> {
        self.selection
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn begin_selection(&mut self, point: DisplayPoint) {
        let point = point.clamp_to(self.surface);
        self.selection = Some(CropSelection::new(point, point));
        self.dragging = true;
    }

    /// Moves the free corner, clamped to the surface. Returns false when no
    /// drag is in progress.
    pub fn update_selection(&mut self, point: DisplayPoint) -> bool {
        if !self.dragging {
            return false;
        }
        let ratio = self
            .preset
            .resolve_ratio(self.natural)
            .map(|ratio| self.display_ratio(ratio));
        let clamped = point.clamp_to(self.surface);
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        selection.end = match ratio {
            Some(ratio) => constrain_to_ratio(selection.start, clamped, ratio),
            None => clamped,
        };
        true
    }

    pub fn end_selection(&mut self) -> Option<CropSelection> {
        self.dragging = false;
        self.selection
    }

    pub fn clear(&mut self) {
        self.selection = None;
        self.dragging = false;
    }

    pub fn crop_rect(&self) -> Option<PixelRect> {
        self.selection
            .as_ref()
            .and_then(|selection| compute_crop_rect(selection, self.surface, self.natural))
    }

    /// Converts a natural-pixel aspect ratio to the ratio it has on screen.
    fn display_ratio(&self, (ratio_w, ratio_h): (u32, u32)) -> f64 {
        let natural_ratio = f64::from(ratio_w) / f64::from(ratio_h.max(1));
        match ScaleFactors::between(self.surface, self.natural) {
            Some(scale) if scale.x > 0.0 && scale.y > 0.0 => natural_ratio * scale.y / scale.x,
            _ => natural_ratio,
        }
    }
}

/// Shrinks the dragged box to `ratio` (width / height), keeping `start` fixed.
fn constrain_to_ratio(start: DisplayPoint, end: DisplayPoint, ratio: f64) -> DisplayPoint {
    if !(ratio.is_finite() && ratio > 0.0) {
        return end;
    }
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let mut width = dx.abs();
    let mut height = dy.abs();
    if height == 0.0 || width / height > ratio {
        width = height * ratio;
    } else {
        height = width / ratio;
    }
    DisplayPoint::new(
        start.x + width.copysign(dx),
        start.y + height.copysign(dy),
    )
}
