//! Drives one editing session: upload, remote edits, review, history and crop.

mod error;

pub use error::{SessionError, SessionResult, ValidationError};

use crate::crop::{self, CropEngine, CropSelection};
use crate::geometry::{DisplaySize, PixelRect};
use crate::history::{HistoryAction, SessionHistory};
use crate::image_state::ImageState;
use crate::ingest::{self, IngestResult};
use crate::presets::{self, EditPreset};
use crate::remote::{EditOptions, EditResult, ModelSelector, RemoteEditClient, TargetResolution};
use crate::state::{SessionEvent, SessionStatus, StateError, StateMachine, StateTransition};

/// Everything needed to dispatch one edit, captured when it was submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub source_image: ImageState,
    pub instruction: String,
    pub options: EditOptions,
}

impl EditRequest {
    pub fn new(
        source_image: ImageState,
        instruction: &str,
        options: EditOptions,
    ) -> Result<Self, ValidationError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(ValidationError::EmptyInstruction);
        }
        Ok(Self {
            source_image,
            instruction: instruction.to_string(),
            options,
        })
    }
}

/// Owns the lifecycle, history and pending outcome of a single session.
///
/// Edits run in two phases. [`begin_edit`](Self::begin_edit) validates and
/// moves to `Processing`; [`complete_edit`](Self::complete_edit) records the
/// outcome. [`request_edit`](Self::request_edit) does both around one call to
/// the remote client. While `Processing`, every mutating operation is refused.
pub struct EditSessionController<C> {
    client: C,
    machine: StateMachine,
    history: Option<SessionHistory>,
    outcome: Option<EditResult>,
    options: EditOptions,
}

impl<C: RemoteEditClient> EditSessionController<C> {
    pub fn new(client: C) -> Self {
        Self::with_options(client, EditOptions::default())
    }

    pub fn with_options(client: C, options: EditOptions) -> Self {
        Self {
            client,
            machine: StateMachine::new(),
            history: None,
            outcome: None,
            options,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn status(&self) -> SessionStatus {
        self.machine.state()
    }

    pub fn options(&self) -> EditOptions {
        self.options
    }

    pub fn set_model(&mut self, model: ModelSelector) {
        self.options.model = model;
    }

    pub fn set_target_resolution(&mut self, resolution: TargetResolution) {
        self.options.target_resolution = resolution;
    }

    pub fn history(&self) -> Option<&SessionHistory> {
        self.history.as_ref()
    }

    /// The committed version the user is looking at.
    pub fn current_image(&self) -> Option<&ImageState> {
        self.history.as_ref().map(SessionHistory::current)
    }

    pub fn outcome(&self) -> Option<&EditResult> {
        self.outcome.as_ref()
    }

    /// The uncommitted result shown for review in `Complete`.
    pub fn pending_image(&self) -> Option<&ImageState> {
        self.outcome.as_ref().and_then(EditResult::image)
    }

    /// Reason shown to the user in `Failed`.
    pub fn last_error(&self) -> Option<&str> {
        self.outcome.as_ref().and_then(EditResult::failure_reason)
    }

    pub fn can_undo(&self) -> bool {
        !self.status().is_busy() && self.history.as_ref().is_some_and(SessionHistory::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        !self.status().is_busy() && self.history.as_ref().is_some_and(SessionHistory::can_redo)
    }

    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition> {
        self.machine.transitions()
    }

    /// Starting an upload drops any pending result, whether or not the upload
    /// is later accepted.
    pub fn begin_upload(&mut self) -> SessionResult<()> {
        self.machine.transition(SessionEvent::BeginUpload)?;
        if self.outcome.take().is_some() {
            tracing::debug!("discarded pending result for new upload");
        }
        Ok(())
    }

    /// Accepting an upload replaces any previous session. A rejected upload
    /// leaves the previous session, if any, exactly as it was.
    pub fn finish_upload(&mut self, upload: IngestResult<ImageState>) -> SessionResult<&ImageState> {
        if self.status() != SessionStatus::Uploading {
            return Err(self.refuse(SessionEvent::UploadAccepted));
        }
        match upload {
            Ok(image) => {
                self.machine.transition(SessionEvent::UploadAccepted)?;
                tracing::info!(image = image.id(), "started editing session");
                self.outcome = None;
                let history = self.history.insert(SessionHistory::new(image));
                Ok(history.current())
            }
            Err(err) => {
                let event = if self.history.is_some() {
                    SessionEvent::ResumeSession
                } else {
                    SessionEvent::UploadRejected
                };
                self.machine.transition(event)?;
                tracing::warn!(error = %err, "upload rejected");
                Err(err.into())
            }
        }
    }

    /// Ingests `bytes` declared as `mime` and starts a session from them.
    pub fn load_image(&mut self, bytes: Vec<u8>, mime: &str) -> SessionResult<&ImageState> {
        self.begin_upload()?;
        let upload = ingest::ingest_bytes(bytes, mime);
        self.finish_upload(upload)
    }

    /// Starts a session from an already decoded image.
    pub fn start_session(&mut self, image: ImageState) -> SessionResult<&ImageState> {
        self.begin_upload()?;
        self.finish_upload(Ok(image))
    }

    /// Drops the whole session; every version it held is released.
    pub fn end_session(&mut self) -> SessionResult<()> {
        self.ensure_idle_or_settled()?;
        self.machine.transition(SessionEvent::EndSession)?;
        self.outcome = None;
        if let Some(history) = self.history.take() {
            tracing::info!(versions = history.len(), "ended editing session");
        }
        Ok(())
    }

    /// Validates `instruction` and enters `Processing`. A pending outcome is
    /// discarded first. Nothing changes when validation fails.
    pub fn begin_edit(&mut self, instruction: &str) -> SessionResult<EditRequest> {
        self.ensure_idle_or_settled()?;
        let source = self
            .current_image()
            .cloned()
            .ok_or(SessionError::NoActiveSession)?;
        let request = EditRequest::new(source, instruction, self.options)?;

        if self.status().has_outcome() {
            self.discard()?;
        }
        self.machine.transition(SessionEvent::SubmitEdit)?;
        tracing::info!(
            image = request.source_image.id(),
            model = ?request.options.model,
            resolution = ?request.options.effective_resolution(),
            "submitted edit"
        );
        Ok(request)
    }

    /// Records the outcome of the in-flight edit and returns the new status.
    pub fn complete_edit(&mut self, result: EditResult) -> SessionResult<SessionStatus> {
        let event = if result.is_success() {
            SessionEvent::EditSucceeded
        } else {
            SessionEvent::EditFailed
        };
        let status = self.machine.transition(event)?;
        match &result {
            EditResult::Success { image, .. } => {
                tracing::info!(result = image.id(), "edit ready for review");
            }
            EditResult::Failure { reason } => {
                tracing::warn!(reason = %reason, "edit failed");
            }
        }
        self.outcome = Some(result);
        Ok(status)
    }

    pub async fn request_edit(&mut self, instruction: &str) -> SessionResult<SessionStatus> {
        let request = self.begin_edit(instruction)?;
        let result = self
            .client
            .submit_edit(&request.source_image, &request.instruction, &request.options)
            .await;
        self.complete_edit(result)
    }

    pub async fn request_preset(&mut self, preset: EditPreset) -> SessionResult<SessionStatus> {
        self.request_edit(preset.instruction()).await
    }

    /// Asks the model to mask `subject`. The masked image is reviewed and
    /// committed like any other edit.
    pub async fn request_mask_preview(&mut self, subject: &str) -> SessionResult<SessionStatus> {
        if subject.trim().is_empty() {
            return Err(ValidationError::EmptyInstruction.into());
        }
        self.request_edit(&presets::mask_preview_instruction(subject))
            .await
    }

    /// Commits the pending result and makes it the current version.
    pub fn acknowledge_and_commit(&mut self) -> SessionResult<&ImageState> {
        let image = match (&self.outcome, self.machine.state()) {
            (Some(EditResult::Success { image, .. }), SessionStatus::Complete) => image.clone(),
            _ => return Err(self.refuse(SessionEvent::Commit)),
        };
        let Some(history) = self.history.as_mut() else {
            return Err(SessionError::NoActiveSession);
        };
        self.machine.transition(SessionEvent::Commit)?;
        self.outcome = None;
        history.commit(image);
        tracing::info!(cursor = history.cursor(), "committed edit");
        Ok(history.current())
    }

    /// Drops a pending result or failure. A no-op when nothing is pending.
    pub fn discard(&mut self) -> SessionResult<()> {
        match self.status() {
            SessionStatus::Complete | SessionStatus::Failed => {
                self.machine.transition(SessionEvent::Discard)?;
                self.outcome = None;
                tracing::debug!("discarded pending result");
                Ok(())
            }
            SessionStatus::Ready => Ok(()),
            _ => Err(self.refuse(SessionEvent::Discard)),
        }
    }

    pub fn undo(&mut self) -> SessionResult<bool> {
        self.navigate(HistoryAction::Undo)
    }

    pub fn redo(&mut self) -> SessionResult<bool> {
        self.navigate(HistoryAction::Redo)
    }

    /// Moves the cursor and returns to `Ready`, dropping any pending result.
    /// Returns false, changing nothing, at either end of history.
    fn navigate(&mut self, action: HistoryAction) -> SessionResult<bool> {
        self.ensure_idle_or_settled()?;
        let Some(history) = self.history.as_mut() else {
            return Err(SessionError::NoActiveSession);
        };
        let possible = match action {
            HistoryAction::Undo => history.can_undo(),
            HistoryAction::Redo => history.can_redo(),
        };
        if !possible {
            tracing::debug!("{}", action.empty_message());
            return Ok(false);
        }
        self.machine.transition(SessionEvent::Navigate)?;
        history.step(action);
        self.outcome = None;
        tracing::debug!(cursor = history.cursor(), "{}", action.applied_message());
        Ok(true)
    }

    /// Crops the current version to `rect` and commits the result. Any
    /// pending edit result is dropped since it was based on the old version.
    pub fn apply_crop(&mut self, rect: PixelRect) -> SessionResult<&ImageState> {
        self.ensure_idle_or_settled()?;
        let source = self
            .current_image()
            .cloned()
            .ok_or(SessionError::NoActiveSession)?;
        if !self.machine.can_transition(SessionEvent::CropApplied) {
            return Err(self.refuse(SessionEvent::CropApplied));
        }
        let cropped = crop::apply_crop(&source, rect)?;

        let Some(history) = self.history.as_mut() else {
            return Err(SessionError::NoActiveSession);
        };
        self.machine.transition(SessionEvent::CropApplied)?;
        self.outcome = None;
        history.commit(cropped);
        tracing::info!(?rect, cursor = history.cursor(), "applied crop");
        Ok(history.current())
    }

    /// Maps `selection`, drawn over a surface of size `display`, onto the
    /// current version and crops to it.
    pub fn apply_crop_selection(
        &mut self,
        selection: &CropSelection,
        display: DisplaySize,
    ) -> SessionResult<&ImageState> {
        let natural = self
            .current_image()
            .map(ImageState::natural_size)
            .ok_or(SessionError::NoActiveSession)?;
        let rect = crop::compute_crop_rect(selection, display, natural).ok_or_else(|| {
            tracing::warn!(?selection, "crop selection too small");
            SessionError::Validation(ValidationError::DegenerateCrop)
        })?;
        self.apply_crop(rect)
    }

    /// A crop engine sized for the current version on a surface of `display`.
    pub fn crop_engine(&self, display: DisplaySize) -> SessionResult<CropEngine> {
        let image = self.current_image().ok_or(SessionError::NoActiveSession)?;
        Ok(CropEngine::new(display, image.natural_size()))
    }

    /// Applies the engine's selection. The selection is consumed only when the
    /// crop succeeds.
    pub fn apply_crop_from(&mut self, engine: &mut CropEngine) -> SessionResult<&ImageState> {
        let selection = engine
            .selection()
            .ok_or(ValidationError::NoCropSelection)?;
        let surface = engine.surface();
        let natural = self.apply_crop_selection(&selection, surface)?.natural_size();
        engine.set_surface(surface, natural);
        self.current_image().ok_or(SessionError::NoActiveSession)
    }

    fn ensure_idle_or_settled(&self) -> SessionResult<()> {
        if self.status() == SessionStatus::Processing {
            tracing::warn!("refused while an edit is in flight");
            return Err(SessionError::EditInFlight);
        }
        Ok(())
    }

    fn refuse(&self, event: SessionEvent) -> SessionError {
        let from = self.status();
        tracing::warn!(from = ?from, event = ?event, "operation not allowed in current state");
        SessionError::State(StateError::InvalidStateTransition { from, event })
    }
}
