//! Bid management.
//!
//! The server is the only source of truth: no operation patches local bid
//! state. After every successful write the caller's [`BidRefresh`] hook runs so
//! the caller can refetch the job's bids.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use movemate_core::domain::bid::{Bid, BidEdit, BidId, BidStatus, Confirmation, JobId, NewBid};
use movemate_core::errors::DomainError;

use crate::catalog::{list_entries, stringify_ids};
use crate::endpoints;
use crate::transport::{expect_success, ApiError, ApiRequest, ApiTransport, HttpMethod, TransportError};

#[derive(Debug, Error, PartialEq)]
pub enum BidError {
    #[error("{action} is irreversible and needs explicit confirmation")]
    ConfirmationRequired { action: &'static str },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("bid {bid_id} was not found for job {job_id}")]
    NotFound { job_id: JobId, bid_id: BidId },
    #[error("bid service returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("bid response could not be decoded: {0}")]
    Decode(String),
}

impl From<ApiError> for BidError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Transport(error) => Self::Transport(error),
            ApiError::Status { status, message } => Self::Remote { status, message },
        }
    }
}

/// Called after every successful bid write.
pub trait BidRefresh: Send + Sync {
    fn bids_changed(&self, job_id: &JobId);
}

impl<F> BidRefresh for F
where
    F: Fn(&JobId) + Send + Sync,
{
    fn bids_changed(&self, job_id: &JobId) {
        self(job_id)
    }
}

pub struct BidService<T> {
    transport: T,
    refresh: Box<dyn BidRefresh>,
}

impl<T> BidService<T>
where
    T: ApiTransport,
{
    pub fn new(transport: T, refresh: impl BidRefresh + 'static) -> Self {
        Self { transport, refresh: Box::new(refresh) }
    }

    pub async fn list_bids(&self, job_id: &JobId) -> Result<Vec<Bid>, BidError> {
        let request = ApiRequest::get(endpoints::BIDS).with_query("job_id", job_id.0.clone());
        let body = expect_success(&self.transport, request).await?;
        list_entries(body).into_iter().map(|entry| decode_bid(entry, job_id)).collect()
    }

    pub async fn find_bid(&self, job_id: &JobId, bid_id: &BidId) -> Result<Bid, BidError> {
        self.list_bids(job_id)
            .await?
            .into_iter()
            .find(|bid| &bid.id == bid_id)
            .ok_or_else(|| BidError::NotFound { job_id: job_id.clone(), bid_id: bid_id.clone() })
    }

    pub async fn submit_bid(&self, bid: &NewBid) -> Result<Bid, BidError> {
        let bid = bid.validate()?;
        let body = json!({
            "job_id": bid.job_id.0,
            "provider_id": bid.provider_id.0,
            "amount": bid.amount,
            "message": bid.message,
        });
        let request = ApiRequest::new(HttpMethod::Post, endpoints::BIDS).with_body(body);
        let created = expect_success(&self.transport, request).await?;
        let created = decode_bid(created, &bid.job_id)?;

        info!(event_name = "bids.submitted", job_id = %bid.job_id, bid_id = %created.id, "bid submitted");
        self.refresh.bids_changed(&bid.job_id);
        Ok(created)
    }

    /// Assigns the bid's provider to the job. The server rejects the job's
    /// other pending bids, so callers must refetch afterwards.
    pub async fn accept_bid(
        &self,
        job_id: &JobId,
        bid: &Bid,
        confirmation: Confirmation,
    ) -> Result<(), BidError> {
        if !confirmation.is_confirmed() {
            return Err(BidError::ConfirmationRequired { action: "accepting a bid" });
        }
        if !bid.can_transition_to(BidStatus::Accepted) {
            return Err(DomainError::InvalidBidTransition { from: bid.status, to: BidStatus::Accepted }.into());
        }

        let request = endpoints::accept_bid(job_id).request().with_body(json!({"bid_id": bid.id.0}));
        expect_success(&self.transport, request).await?;

        info!(event_name = "bids.accepted", job_id = %job_id, bid_id = %bid.id, "bid accepted");
        self.refresh.bids_changed(job_id);
        Ok(())
    }

    /// Changes the amount or message of a pending bid.
    pub async fn edit_bid(&self, job_id: &JobId, bid: &Bid, edit: &BidEdit) -> Result<(), BidError> {
        bid.ensure_mutable()?;
        let edit = edit.validate()?;
        let body = serde_json::to_value(&edit).map_err(|error| BidError::Decode(error.to_string()))?;

        let request = endpoints::job_bid(job_id, &bid.id, HttpMethod::Patch).request().with_body(body);
        expect_success(&self.transport, request).await?;

        info!(event_name = "bids.edited", job_id = %job_id, bid_id = %bid.id, "bid edited");
        self.refresh.bids_changed(job_id);
        Ok(())
    }

    pub async fn delete_bid(
        &self,
        job_id: &JobId,
        bid: &Bid,
        confirmation: Confirmation,
    ) -> Result<(), BidError> {
        if !confirmation.is_confirmed() {
            return Err(BidError::ConfirmationRequired { action: "deleting a bid" });
        }
        bid.ensure_mutable()?;

        let request = endpoints::job_bid(job_id, &bid.id, HttpMethod::Delete).request();
        expect_success(&self.transport, request).await?;

        info!(event_name = "bids.deleted", job_id = %job_id, bid_id = %bid.id, "bid deleted");
        self.refresh.bids_changed(job_id);
        Ok(())
    }
}

fn decode_bid(mut entry: Value, job_id: &JobId) -> Result<Bid, BidError> {
    stringify_ids(&mut entry, &["id", "job_id"]);
    if let Some(provider) = entry.get_mut("provider") {
        if !provider.is_object() {
            *provider = json!({"id": provider.clone()});
        }
        stringify_ids(provider, &["id"]);
    }
    if let Some(fields) = entry.as_object_mut() {
        if fields.get("message").map_or(true, Value::is_null) {
            if let Some(notes) = fields.get("notes").cloned() {
                fields.insert("message".to_string(), notes);
            }
        }
    }

    let mut bid: Bid =
        serde_json::from_value(entry).map_err(|error| BidError::Decode(error.to_string()))?;
    if bid.job_id.is_none() {
        bid.job_id = Some(job_id.clone());
    }
    Ok(bid)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;

    use movemate_core::domain::bid::{
        BidEdit, BidId, BidStatus, Confirmation, JobId, NewBid, ProviderId,
    };
    use movemate_core::errors::DomainError;

    use super::{BidError, BidService};
    use crate::transport::{HttpMethod, ScriptedTransport};

    fn service() -> (BidService<Arc<ScriptedTransport>>, Arc<ScriptedTransport>, Arc<AtomicUsize>) {
        let transport = Arc::new(ScriptedTransport::new());
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshes);
        let service = BidService::new(Arc::clone(&transport), move |_: &JobId| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (service, transport, refreshes)
    }

    fn job() -> JobId {
        JobId("J1".to_string())
    }

    fn bid_json(id: u64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "provider": {"id": 5, "name": "Swift Movers"},
            "amount": "420.00",
            "notes": "two vans",
            "status": status,
            "created_at": "2026-10-10T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn list_decodes_numeric_ids_and_notes() {
        let (service, transport, _) = service();
        transport.respond(200, json!([bid_json(1, "pending"), bid_json(2, "rejected")]));

        let bids = service.list_bids(&job()).await.expect("list");
        assert_eq!(bids.len(), 2);
        assert_eq!(bids[0].id, BidId("1".to_string()));
        assert_eq!(bids[0].provider.id, ProviderId("5".to_string()));
        assert_eq!(bids[0].message.as_deref(), Some("two vans"));
        assert_eq!(bids[0].job_id, Some(job()));
        assert_eq!(bids[1].status, BidStatus::Rejected);
        assert_eq!(transport.requests()[0].path, "/bids/");
    }

    #[tokio::test]
    async fn list_accepts_camel_case_timestamps() {
        let (service, transport, _) = service();
        let mut camel = bid_json(4, "pending");
        if let Some(fields) = camel.as_object_mut() {
            if let Some(created) = fields.remove("created_at") {
                fields.insert("createdAt".to_string(), created);
            }
        }
        transport.respond(200, json!([camel, bid_json(5, "pending")]));

        let bids = service.list_bids(&job()).await.expect("list");
        assert_eq!(bids.len(), 2);
        assert_eq!(bids[0].id, BidId("4".to_string()));
    }

    #[tokio::test]
    async fn accept_requires_confirmation_and_refreshes_after_success() {
        let (service, transport, refreshes) = service();
        transport.respond(200, json!([bid_json(1, "pending")])).respond(200, json!({"status": "assigned"}));
        let bid = service.find_bid(&job(), &BidId("1".to_string())).await.expect("found");

        let refused = service.accept_bid(&job(), &bid, Confirmation::NotConfirmed).await;
        assert_eq!(refused, Err(BidError::ConfirmationRequired { action: "accepting a bid" }));
        assert_eq!(transport.requests().len(), 1);

        service.accept_bid(&job(), &bid, Confirmation::Confirmed).await.expect("accepted");
        let requests = transport.requests();
        assert_eq!(requests[1].method, HttpMethod::Post);
        assert_eq!(requests[1].path, "/jobs/J1/accept-bid/");
        assert_eq!(requests[1].body, Some(json!({"bid_id": "1"})));
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn terminal_bids_cannot_be_edited_or_deleted() {
        let (service, transport, refreshes) = service();
        transport.respond(200, json!([bid_json(3, "accepted")]));
        let bid = service.find_bid(&job(), &BidId("3".to_string())).await.expect("found");

        let edit = BidEdit { amount: Some(Decimal::new(39_900, 2)), message: None };
        let edited = service.edit_bid(&job(), &bid, &edit).await;
        assert!(matches!(edited, Err(BidError::Domain(DomainError::BidNotMutable { .. }))));

        let deleted = service.delete_bid(&job(), &bid, Confirmation::Confirmed).await;
        assert!(matches!(deleted, Err(BidError::Domain(DomainError::BidNotMutable { .. }))));

        assert_eq!(transport.requests().len(), 1);
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pending_bid_edit_and_delete_hit_job_bid_endpoint() {
        let (service, transport, refreshes) = service();
        transport
            .respond(200, json!([bid_json(4, "pending")]))
            .respond(200, json!({}))
            .respond(204, json!(null));
        let bid = service.find_bid(&job(), &BidId("4".to_string())).await.expect("found");

        let edit = BidEdit { amount: Some(Decimal::new(380_005, 4)), message: None };
        service.edit_bid(&job(), &bid, &edit).await.expect("edited");
        service.delete_bid(&job(), &bid, Confirmation::Confirmed).await.expect("deleted");

        let requests = transport.requests();
        assert_eq!(requests[1].method, HttpMethod::Patch);
        assert_eq!(requests[1].path, "/jobs/J1/bids/4/");
        assert_eq!(requests[1].body, Some(json!({"amount": "38.00"})));
        assert_eq!(requests[2].method, HttpMethod::Delete);
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn submit_validates_amount_before_sending() {
        let (service, transport, _) = service();
        let invalid = NewBid {
            job_id: job(),
            provider_id: ProviderId("P1".to_string()),
            amount: Decimal::ZERO,
            message: None,
        };
        assert!(matches!(service.submit_bid(&invalid).await, Err(BidError::Domain(_))));
        assert!(transport.requests().is_empty());

        transport.respond(201, bid_json(9, "pending"));
        let valid = NewBid { amount: Decimal::new(12_345, 2), ..invalid };
        let created = service.submit_bid(&valid).await.expect("created");
        assert_eq!(created.id, BidId("9".to_string()));
        assert_eq!(transport.requests()[0].body.as_ref().map(|body| body["amount"].clone()), Some(json!("123.45")));
    }
}
