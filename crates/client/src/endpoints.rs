use movemate_core::domain::bid::{BidId, JobId};
use movemate_core::domain::request::RequestId;
use movemate_core::errors::BookingError;
use movemate_core::flows::BookingStep;
use movemate_core::submission::SubmitOptions;

use crate::transport::{ApiRequest, HttpMethod};

pub const REQUESTS: &str = "/requests/";
pub const DRAFTS: &str = "/requests/drafts";
pub const ITEM_CATEGORIES: &str = "/item-categories/";
pub const COMMON_ITEMS: &str = "/common-items/";
pub const BIDS: &str = "/bids/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: String,
}

impl Endpoint {
    fn new(method: HttpMethod, path: String) -> Self {
        Self { method, path }
    }

    pub fn request(&self) -> ApiRequest {
        ApiRequest::new(self.method, self.path.clone())
    }
}

/// Picks the endpoint for one step submission.
///
/// | step | request id | editing | endpoint |
/// |---|---|---|---|
/// | 1 | none | any | `POST /requests/` |
/// | 1 | known | no | `PATCH /requests/{id}/` |
/// | 1 | known | yes | `PUT /requests/{id}/` |
/// | 2-4 | known | no | `PATCH /requests/{id}/step{n}/` |
/// | 2-4 | known | yes | `PUT /requests/{id}/submit_step{n}/` |
/// | 2-4 | none | any | [`BookingError::MissingPrerequisite`] |
pub fn step_endpoint(step: BookingStep, options: &SubmitOptions) -> Result<Endpoint, BookingError> {
    let request_id = options.require_request_id(step)?;
    let method = if options.is_editing { HttpMethod::Put } else { HttpMethod::Patch };

    let endpoint = match (step, request_id) {
        (BookingStep::Contact, None) => Endpoint::new(HttpMethod::Post, REQUESTS.to_string()),
        (BookingStep::Contact, Some(id)) => Endpoint::new(method, request_path(id)),
        (step, Some(id)) if options.is_editing => {
            Endpoint::new(method, format!("{}submit_step{}/", request_path(id), step.number()))
        }
        (step, Some(id)) => {
            Endpoint::new(method, format!("{}step{}/", request_path(id), step.number()))
        }
        (step, None) => return Err(BookingError::MissingPrerequisite { step }),
    };
    Ok(endpoint)
}

pub fn request_path(id: &RequestId) -> String {
    format!("{REQUESTS}{id}/")
}

pub fn complete_booking(id: &RequestId) -> Endpoint {
    Endpoint::new(HttpMethod::Post, format!("{}submit/", request_path(id)))
}

pub fn cancel_request(id: &RequestId) -> Endpoint {
    Endpoint::new(HttpMethod::Post, format!("{}cancel/", request_path(id)))
}

pub fn accept_bid(job: &JobId) -> Endpoint {
    Endpoint::new(HttpMethod::Post, format!("/jobs/{job}/accept-bid/"))
}

pub fn job_bid(job: &JobId, bid: &BidId, method: HttpMethod) -> Endpoint {
    Endpoint::new(method, format!("/jobs/{job}/bids/{bid}/"))
}
