use crate::geometry::ImageSize;

/// Aspect constraint applied while dragging a crop box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropPreset {
    #[default]
    Free,
    Ratio16x9,
    Ratio1x1,
    Ratio9x16,
    Original,
}

impl CropPreset {
    pub const fn ratio(self) -> Option<(u32, u32)> {
        match self {
            Self::Ratio16x9 => Some((16, 9)),
            Self::Ratio1x1 => Some((1, 1)),
            Self::Ratio9x16 => Some((9, 16)),
            Self::Free | Self::Original => None,
        }
    }

    /// Aspect ratio in natural pixels. `Original` follows the image itself,
    /// `Free` has none.
    pub fn resolve_ratio(self, natural: ImageSize) -> Option<(u32, u32)> {
        self.ratio().or_else(|| {
            (self == Self::Original).then(|| (natural.width.max(1), natural.height.max(1)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::CropEngine;
    use crate::geometry::{DisplayPoint, DisplaySize, PixelRect};

    fn drag(engine: &mut CropEngine, to: DisplayPoint) -> PixelRect {
        engine.begin_selection(DisplayPoint::new(0.0, 0.0));
        engine.update_selection(to);
        engine.end_selection();
        engine.crop_rect().expect("rect")
    }

    #[test]
    fn resolve_ratio_follows_preset_kind() {
        let natural = ImageSize::new(1920, 1080);
        assert_eq!(CropPreset::Ratio9x16.resolve_ratio(natural), Some((9, 16)));
        assert_eq!(CropPreset::Original.resolve_ratio(natural), Some((1920, 1080)));
        assert_eq!(
            CropPreset::Original.resolve_ratio(ImageSize::new(0, 0)),
            Some((1, 1))
        );
        assert_eq!(CropPreset::Free.resolve_ratio(natural), None);
    }

    #[test]
    fn display_ratio_compensates_for_non_uniform_scale() {
        // 2x horizontally, 3x vertically: a natural square looks 1.5 wide on screen.
        let engine = CropEngine::new(DisplaySize::new(400.0, 300.0), ImageSize::new(800, 900));
        let ratio = engine.display_ratio((1, 1));
        assert!((ratio - 1.5).abs() < 1e-9, "{ratio}");
    }

    #[test]
    fn fixed_preset_holds_in_natural_pixels_on_stretched_surface() {
        let mut engine =
            CropEngine::new(DisplaySize::new(400.0, 300.0), ImageSize::new(1600, 900));
        engine.set_preset(CropPreset::Ratio16x9);
        let rect = drag(&mut engine, DisplayPoint::new(200.0, 200.0));
        assert_eq!(rect, PixelRect::new(0, 0, 800, 450));
    }

    #[test]
    fn original_preset_matches_image_aspect_on_stretched_surface() {
        let mut engine =
            CropEngine::new(DisplaySize::new(300.0, 400.0), ImageSize::new(1200, 800));
        engine.set_preset(CropPreset::Original);
        let rect = drag(&mut engine, DisplayPoint::new(200.0, 200.0));
        assert_eq!(rect, PixelRect::new(0, 0, 600, 400));
    }
}
