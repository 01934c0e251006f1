use std::collections::VecDeque;

use super::error::{StateError, StateResult};
use super::{SessionEvent, SessionStatus, StateTransition};

const TRANSITION_LOG_LIMIT: usize = 64;

#[derive(Debug)]
pub struct StateMachine {
    state: SessionStatus,
    transition_history: VecDeque<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionStatus::default(),
            transition_history: VecDeque::new(),
        }
    }

    pub fn state(&self) -> SessionStatus {
        self.state
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: SessionEvent) -> Option<SessionStatus> {
        use SessionEvent::*;
        use SessionStatus::*;
        match (self.state, event) {
            (Idle | Ready | Complete | Failed, BeginUpload) => Some(Uploading),
            (Uploading, UploadAccepted) => Some(Ready),
            (Uploading, UploadRejected) => Some(Idle),
            (Uploading, ResumeSession) => Some(Ready),
            (Ready, SubmitEdit) => Some(Processing),
            (Processing, EditSucceeded) => Some(Complete),
            (Processing, EditFailed) => Some(Failed),
            (Complete, Commit) => Some(Ready),
            (Complete | Failed, Discard) => Some(Ready),
            (Ready | Complete | Failed, Navigate) => Some(Ready),
            (Ready | Complete | Failed, CropApplied) => Some(Ready),
            (Idle | Ready | Complete | Failed, EndSession) => Some(Idle),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<SessionStatus> {
        tracing::debug!(from = ?self.state, event = ?event, "request state transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        if self.transition_history.len() == TRANSITION_LOG_LIMIT {
            self.transition_history.pop_front();
        }
        self.transition_history
            .push_back(StateTransition::new(self.state, event, next));
        self.state = next;

        Ok(self.state)
    }

    /// Most recent transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition> {
        self.transition_history.iter()
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionStatus::{:?}", self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in(events: &[SessionEvent]) -> StateMachine {
        let mut machine = StateMachine::new();
        for event in events {
            machine
                .transition(*event)
                .expect("scripted transition should be valid");
        }
        machine
    }

    #[test]
    fn can_transition_tracks_valid_and_invalid_events() {
        let mut machine = StateMachine::new();
        assert!(machine.can_transition(SessionEvent::BeginUpload));
        assert!(!machine.can_transition(SessionEvent::SubmitEdit));

        let _ = machine
            .transition(SessionEvent::BeginUpload)
            .expect("idle -> uploading should transition");
        assert!(machine.can_transition(SessionEvent::UploadAccepted));
        assert!(machine.can_transition(SessionEvent::UploadRejected));
        assert!(!machine.can_transition(SessionEvent::Commit));
    }

    #[test]
    fn edit_cycle_returns_to_ready() {
        let machine = machine_in(&[
            SessionEvent::BeginUpload,
            SessionEvent::UploadAccepted,
            SessionEvent::SubmitEdit,
            SessionEvent::EditSucceeded,
            SessionEvent::Commit,
        ]);
        assert_eq!(machine.state(), SessionStatus::Ready);

        let statuses: Vec<_> = machine.transitions().map(|record| record.to).collect();
        assert_eq!(
            statuses,
            vec![
                SessionStatus::Uploading,
                SessionStatus::Ready,
                SessionStatus::Processing,
                SessionStatus::Complete,
                SessionStatus::Ready,
            ]
        );
    }

    #[test]
    fn processing_refuses_everything_but_resolution() {
        let machine = machine_in(&[
            SessionEvent::BeginUpload,
            SessionEvent::UploadAccepted,
            SessionEvent::SubmitEdit,
        ]);
        for event in [
            SessionEvent::SubmitEdit,
            SessionEvent::Navigate,
            SessionEvent::CropApplied,
            SessionEvent::Discard,
            SessionEvent::Commit,
            SessionEvent::BeginUpload,
            SessionEvent::EndSession,
        ] {
            assert!(!machine.can_transition(event), "{event:?} allowed while processing");
        }
        assert!(machine.can_transition(SessionEvent::EditSucceeded));
        assert!(machine.can_transition(SessionEvent::EditFailed));
    }

    #[test]
    fn failed_outcome_can_only_be_discarded_not_committed() {
        let machine = machine_in(&[
            SessionEvent::BeginUpload,
            SessionEvent::UploadAccepted,
            SessionEvent::SubmitEdit,
            SessionEvent::EditFailed,
        ]);
        assert_eq!(machine.state(), SessionStatus::Failed);
        assert!(!machine.can_transition(SessionEvent::Commit));
        assert!(machine.can_transition(SessionEvent::Discard));
        assert!(machine.can_transition(SessionEvent::Navigate));
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_history() {
        let mut machine = StateMachine::new();

        let err = machine
            .transition(SessionEvent::Commit)
            .expect_err("idle -> commit should fail");
        assert_eq!(
            err,
            StateError::InvalidStateTransition {
                from: SessionStatus::Idle,
                event: SessionEvent::Commit
            }
        );
        assert_eq!(machine.state(), SessionStatus::Idle);
        assert_eq!(machine.transitions().count(), 0);
    }

    #[test]
    fn transition_log_keeps_only_recent_entries() {
        let mut machine = machine_in(&[SessionEvent::BeginUpload, SessionEvent::UploadAccepted]);
        for _ in 0..(TRANSITION_LOG_LIMIT * 2) {
            machine
                .transition(SessionEvent::Navigate)
                .expect("navigate from ready");
        }
        assert_eq!(machine.transitions().count(), TRANSITION_LOG_LIMIT);
        assert!(machine
            .transitions()
            .all(|record| record.event == SessionEvent::Navigate));
    }
}
