//! Coordinate primitives shared by the crop tool and the session controller.
//!
//! Display space is the on-screen rendered surface (fractional pointer
//! coordinates). Natural space is the stored pixel grid of the image.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

impl DisplayPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn clamp_to(self, surface: DisplaySize) -> Self {
        Self {
            x: self.x.clamp(0.0, surface.width.max(0.0)),
            y: self.y.clamp(0.0, surface.height.max(0.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

impl DisplaySize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in natural pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn fits_within(&self, bounds: ImageSize) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= bounds.width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= bounds.height)
    }
}

/// Axis-aligned box in display space, normalized so width/height are non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

pub fn normalize_display_box(start: DisplayPoint, end: DisplayPoint) -> DisplayBox {
    let left = start.x.min(end.x);
    let right = start.x.max(end.x);
    let top = start.y.min(end.y);
    let bottom = start.y.max(end.y);
    DisplayBox {
        left,
        top,
        width: right - left,
        height: bottom - top,
    }
}

/// Independent per-axis ratio of natural size over display size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    /// Returns `None` when the display surface has no area.
    pub fn between(display: DisplaySize, natural: ImageSize) -> Option<Self> {
        if display.is_empty() {
            return None;
        }
        Some(Self {
            x: f64::from(natural.width) / display.width,
            y: f64::from(natural.height) / display.height,
        })
    }
}
