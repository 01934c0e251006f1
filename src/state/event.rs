use super::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    BeginUpload,
    UploadAccepted,
    UploadRejected,
    ResumeSession,
    SubmitEdit,
    EditSucceeded,
    EditFailed,
    Commit,
    Discard,
    Navigate,
    CropApplied,
    EndSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SessionStatus,
    pub event: SessionEvent,
    pub to: SessionStatus,
}

impl StateTransition {
    pub const fn new(from: SessionStatus, event: SessionEvent, to: SessionStatus) -> Self {
        Self { from, event, to }
    }
}
