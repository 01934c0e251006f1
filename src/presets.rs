/// Canned instructions offered next to the free-form prompt box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPreset {
    Enhance,
    RemoveBackground,
    BlackAndWhite,
    Vintage,
    Watercolor,
}

impl EditPreset {
    pub const ALL: [EditPreset; 5] = [
        Self::Enhance,
        Self::RemoveBackground,
        Self::BlackAndWhite,
        Self::Vintage,
        Self::Watercolor,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Enhance => "Enhance",
            Self::RemoveBackground => "Remove background",
            Self::BlackAndWhite => "Black & white",
            Self::Vintage => "Vintage",
            Self::Watercolor => "Watercolor",
        }
    }

    pub const fn instruction(self) -> &'static str {
        match self {
            Self::Enhance => "Improve lighting, color balance and sharpness while keeping the scene unchanged.",
            Self::RemoveBackground => "Remove the background and place the subject on plain white.",
            Self::BlackAndWhite => "Convert the photo to high-contrast black and white.",
            Self::Vintage => "Give the photo a faded 1970s film look.",
            Self::Watercolor => "Repaint the image as a loose watercolor painting.",
        }
    }
}

/// Instruction asking the model to highlight `subject` with a colored mask.
///
/// The result is an ordinary edit: it lands in history when committed.
pub fn mask_preview_instruction(subject: &str) -> String {
    format!(
        "Overlay a semi-transparent red mask on {} and leave everything else untouched.",
        subject.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_has_a_non_empty_instruction() {
        for preset in EditPreset::ALL {
            assert!(!preset.instruction().trim().is_empty(), "{preset:?}");
            assert!(!preset.label().is_empty());
        }
    }

    #[test]
    fn mask_preview_instruction_names_the_subject() {
        assert!(mask_preview_instruction("  the sky ").contains("on the sky and"));
    }
}
