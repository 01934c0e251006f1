use super::event::SessionEvent;
use super::model::SessionStatus;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid state transition: from {from:?} using event {event:?}")]
    InvalidStateTransition {
        from: SessionStatus,
        event: SessionEvent,
    },
}
