//! Drives one booking through validate, format, submit, apply and draft save.

use serde_json::Value;
use tracing::{info, warn};

use movemate_core::domain::draft::DraftSource;
use movemate_core::domain::request::RequestId;
use movemate_core::errors::{ApplicationError, BookingError};
use movemate_core::flows::BookingStep;
use movemate_core::session::{ApplyStatus, BookingSession};
use movemate_core::submission::DraftWrite;
use movemate_db::repositories::{DraftRepository, RepositoryError};

use crate::drafts::DraftStore;
use crate::gateway::SubmissionGateway;
use crate::transport::ApiTransport;

pub struct BookingController<T, R> {
    session: BookingSession,
    gateway: SubmissionGateway<T>,
    drafts: DraftStore<R, T>,
}

impl<T, R> BookingController<T, R>
where
    T: ApiTransport + Clone,
    R: DraftRepository,
{
    pub async fn open(session: BookingSession, transport: T, repository: R) -> Result<Self, RepositoryError> {
        let drafts = DraftStore::open(repository, transport.clone()).await?;
        Ok(Self { session, gateway: SubmissionGateway::new(transport), drafts })
    }

    pub fn session(&self) -> &BookingSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BookingSession {
        &mut self.session
    }

    pub fn drafts(&self) -> &DraftStore<R, T> {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut DraftStore<R, T> {
        &mut self.drafts
    }

    pub async fn submit_current_step(&mut self) -> Result<ApplyStatus, BookingError> {
        self.submit_step(self.session.step()).await
    }

    /// Validates, sends and applies one step. On success the session's values
    /// are saved as a local draft under the request id; a storage failure there
    /// is logged and does not fail the submission.
    pub async fn submit_step(&mut self, step: BookingStep) -> Result<ApplyStatus, BookingError> {
        let prepared = self.session.begin_submission_for(step)?;
        let draft_write = prepared.options.draft_write();

        let result = self.gateway.submit_step(&prepared.payload, &prepared.options).await;
        let failure = result.as_ref().err().map(|failure| failure.error.clone());

        match self.session.apply_outcome(prepared.ticket, result) {
            ApplyStatus::Applied => {
                self.save_draft(step, draft_write).await;
                Ok(ApplyStatus::Applied)
            }
            ApplyStatus::Failed => Err(failure.unwrap_or(BookingError::Remote {
                step,
                status: None,
                message: "submission failed".to_string(),
            })),
            ApplyStatus::Superseded => Ok(ApplyStatus::Superseded),
        }
    }

    /// Submits the current step and moves forward when it was accepted.
    pub async fn submit_and_advance(&mut self) -> Result<BookingStep, BookingError> {
        match self.submit_current_step().await? {
            ApplyStatus::Applied => self.session.advance(),
            ApplyStatus::Failed | ApplyStatus::Superseded => Ok(self.session.step()),
        }
    }

    pub fn advance(&mut self) -> Result<BookingStep, BookingError> {
        self.session.advance()
    }

    pub fn retreat(&mut self) -> BookingStep {
        self.session.retreat()
    }

    pub fn jump_to_step(&mut self, number: u8) -> Result<BookingStep, BookingError> {
        self.session.jump_to_step(number)
    }

    /// Opens a stored draft in edit mode at step 1.
    pub fn resume_draft(&mut self, id: &RequestId, source: DraftSource) -> Result<(), ApplicationError> {
        let draft = self
            .drafts
            .book()
            .get(id, source)
            .ok_or_else(|| ApplicationError::Persistence(format!("no {} draft {id}", source.as_str())))?;
        self.session.load_draft(draft);
        info!(
            event_name = "booking.draft.resumed",
            request_id = %id,
            source = source.as_str(),
            correlation_id = self.session.correlation_id(),
            "draft reopened for editing"
        );
        Ok(())
    }

    /// Finalizes the booking, then starts over with no local drafts.
    pub async fn complete_booking(&mut self) -> Result<Value, ApplicationError> {
        let request_id = self.known_request_id(BookingStep::Schedule)?;
        let body = self.gateway.complete_booking(&request_id).await?;

        self.session.reset();
        self.drafts
            .clear_local_only()
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        Ok(body)
    }

    pub async fn cancel_request(&mut self) -> Result<Value, ApplicationError> {
        let request_id = self.known_request_id(self.session.step())?;
        let body = self.gateway.cancel_request(&request_id).await?;

        self.session.reset();
        self.drafts
            .remove(&request_id, DraftSource::Local)
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        Ok(body)
    }

    fn known_request_id(&self, step: BookingStep) -> Result<RequestId, ApplicationError> {
        self.session
            .request_id()
            .cloned()
            .ok_or(ApplicationError::Booking(BookingError::MissingPrerequisite { step }))
    }

    async fn save_draft(&mut self, step: BookingStep, write: DraftWrite) {
        let Some(request_id) = self.session.request_id().cloned() else {
            return;
        };
        let values = self.session.values().clone();
        if let Err(error) = self.drafts.upsert_local(request_id.clone(), values).await {
            warn!(
                event_name = "booking.draft.save_failed",
                step = step.number(),
                request_id = %request_id,
                write = ?write,
                error = %error,
                "submitted step was not saved as a local draft"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use movemate_core::domain::draft::DraftSource;
    use movemate_core::domain::request::RequestId;
    use movemate_core::errors::{ApplicationError, BookingError};
    use movemate_core::flows::BookingStep;
    use movemate_core::session::{ApplyStatus, BookingSession};
    use movemate_db::repositories::{DraftRepository, InMemoryKeyValueStore, LocalDraftRepository};

    use super::BookingController;
    use crate::transport::ScriptedTransport;

    type Repo = Arc<LocalDraftRepository<InMemoryKeyValueStore>>;

    async fn controller() -> (BookingController<Arc<ScriptedTransport>, Repo>, Arc<ScriptedTransport>, Repo) {
        let transport = Arc::new(ScriptedTransport::new());
        let repository = Arc::new(LocalDraftRepository::new(InMemoryKeyValueStore::default()));
        let controller = BookingController::open(
            BookingSession::default(),
            Arc::clone(&transport),
            Arc::clone(&repository),
        )
        .await
        .expect("open");
        (controller, transport, repository)
    }

    fn fill_contact(controller: &mut BookingController<Arc<ScriptedTransport>, Repo>) {
        let values = controller.session_mut().values_mut();
        values.contact.contact_name = "Ada".to_string();
        values.contact.contact_phone = "555-0100".to_string();
        values.contact.contact_email = "ada@example.com".to_string();
        values.pickup.address = "1 Pickup Rd".to_string();
        values.dropoff.address = "2 Dropoff Ave".to_string();
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_the_network() {
        let (mut controller, transport, _) = controller().await;

        let result = controller.submit_current_step().await;

        assert!(matches!(result, Err(BookingError::Validation(_))));
        assert!(transport.requests().is_empty());
        assert!(controller.session().error(BookingStep::Contact).is_some());
    }

    #[tokio::test]
    async fn rejected_step_keeps_position_and_records_error() {
        let (mut controller, transport, repository) = controller().await;
        fill_contact(&mut controller);
        transport.respond(400, json!({"detail": "phone is invalid"}));

        let result = controller.submit_and_advance().await;

        assert!(matches!(result, Err(BookingError::Remote { status: Some(400), .. })));
        assert_eq!(controller.session().step(), BookingStep::Contact);
        assert_eq!(controller.session().error(BookingStep::Contact), Some("step 1 submission failed: phone is invalid"));
        assert!(repository.load_local().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn cancel_removes_local_draft_and_resets() {
        let (mut controller, transport, repository) = controller().await;
        fill_contact(&mut controller);
        transport.respond(201, json!({"request_id": "R9"})).respond(200, json!({"status": "cancelled"}));

        assert_eq!(controller.submit_current_step().await, Ok(ApplyStatus::Applied));
        assert_eq!(repository.load_local().await.expect("load").len(), 1);

        controller.cancel_request().await.expect("cancelled");
        assert!(repository.load_local().await.expect("load").is_empty());
        assert_eq!(controller.session().request_id(), None);
        assert_eq!(transport.requests()[1].path, "/requests/R9/cancel/");
    }

    #[tokio::test]
    async fn completion_needs_a_request_id() {
        let (mut controller, transport, _) = controller().await;

        let result = controller.complete_booking().await;

        assert_eq!(
            result,
            Err(ApplicationError::Booking(BookingError::MissingPrerequisite { step: BookingStep::Schedule }))
        );
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn resuming_a_local_draft_switches_to_edit_mode() {
        let (mut controller, transport, _) = controller().await;
        fill_contact(&mut controller);
        transport.respond(201, json!({"request_id": "R3"}));
        controller.submit_current_step().await.expect("submitted");
        controller.session_mut().reset();

        controller.resume_draft(&RequestId("R3".to_string()), DraftSource::Local).expect("resumed");

        assert!(controller.session().is_editing());
        assert_eq!(controller.session().values().contact.contact_name, "Ada");
        assert!(controller.resume_draft(&RequestId("nope".to_string()), DraftSource::Api).is_err());
    }
}
