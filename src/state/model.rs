/// Lifecycle of one edit session as seen by the UI.
///
/// `Idle` and `Uploading` precede the session; the rest cycle while an image
/// is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Uploading,
    Ready,
    Processing,
    Complete,
    Failed,
}

impl SessionStatus {
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Processing | Self::Uploading)
    }

    /// A finished edit waiting to be committed or discarded.
    pub const fn has_outcome(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}
