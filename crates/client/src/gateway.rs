use serde_json::Value;
use tracing::{info, warn};

use movemate_core::domain::request::RequestId;
use movemate_core::errors::{ApplicationError, BookingError};
use movemate_core::payload::{body_keys, StepPayload};
use movemate_core::submission::{SubmissionFailure, SubmissionOutcome, SubmissionResult, SubmitOptions};

use crate::endpoints::{self, step_endpoint};
use crate::transport::{expect_success, ApiError, ApiTransport};

/// Performs the network call for each booking step.
///
/// Every failure, including a missing prerequisite, comes back as a
/// step-tagged [`SubmissionFailure`]; nothing escapes as a panic.
pub struct SubmissionGateway<T> {
    transport: T,
}

impl<T> SubmissionGateway<T>
where
    T: ApiTransport,
{
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn submit_step(&self, payload: &StepPayload, options: &SubmitOptions) -> SubmissionResult {
        let step = payload.step;
        let endpoint = step_endpoint(step, options).map_err(|error| {
            warn!(
                event_name = "booking.step.prerequisite_missing",
                step = step.number(),
                error = %error,
                "step submission blocked before network call"
            );
            SubmissionFailure::new(step, error)
        })?;

        info!(
            event_name = "booking.step.submitting",
            step = step.number(),
            method = endpoint.method.as_str(),
            path = %endpoint.path,
            editing = options.is_editing,
            fields = ?body_keys(payload),
            "submitting booking step"
        );

        let request = endpoint.request().with_body(payload.body.clone());
        let response = self.transport.send(request).await.map_err(|error| {
            warn!(event_name = "booking.step.network_failed", step = step.number(), error = %error, "step submission failed");
            SubmissionFailure::new(step, BookingError::Remote { step, status: None, message: error.to_string() })
        })?;

        if !response.is_success() {
            let message = response.error_message();
            warn!(
                event_name = "booking.step.rejected",
                step = step.number(),
                status = response.status,
                message = %message,
                "step submission rejected"
            );
            return Err(SubmissionFailure::new(
                step,
                BookingError::Remote { step, status: Some(response.status), message },
            ));
        }

        let outcome =
            SubmissionOutcome::new(step, response.status, response.body, options.request_id.as_ref());
        if outcome.request_id.is_none() {
            return Err(SubmissionFailure::new(
                step,
                BookingError::Remote {
                    step,
                    status: Some(outcome.status),
                    message: "response did not include a request id".to_string(),
                },
            ));
        }

        info!(
            event_name = "booking.step.submitted",
            step = step.number(),
            status = outcome.status,
            request_id = outcome.request_id.as_ref().map(|id| id.0.as_str()).unwrap_or_default(),
            "booking step accepted"
        );
        Ok(outcome)
    }

    /// Finalizes a booking after step 4.
    pub async fn complete_booking(&self, request_id: &RequestId) -> Result<Value, ApplicationError> {
        let request = endpoints::complete_booking(request_id).request();
        let body = expect_success(&self.transport, request).await.map_err(integration_error)?;
        info!(event_name = "booking.completed", request_id = %request_id, "booking completed");
        Ok(body)
    }

    pub async fn cancel_request(&self, request_id: &RequestId) -> Result<Value, ApplicationError> {
        let request = endpoints::cancel_request(request_id).request();
        let body = expect_success(&self.transport, request).await.map_err(integration_error)?;
        info!(event_name = "booking.cancelled", request_id = %request_id, "request cancelled");
        Ok(body)
    }
}

pub(crate) fn integration_error(error: ApiError) -> ApplicationError {
    ApplicationError::Integration(error.to_string())
}
