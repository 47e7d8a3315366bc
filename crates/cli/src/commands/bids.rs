use movemate_client::bids::{BidError, BidService};
use movemate_core::domain::bid::{Bid, BidId, Confirmation, JobId};
use movemate_core::errors::ApplicationError;
use tracing::info;

use crate::commands::{api_transport, execute, interface_failure, CommandResult, Failure};

pub fn list(job: &str) -> CommandResult {
    let job_id = JobId(job.to_string());
    execute("bids.list", |config| async move {
        let service = BidService::new(api_transport(&config)?, log_refresh);
        let bids = service.list_bids(&job_id).await.map_err(|error| bid_failure(error, &job_id))?;

        let mut lines = vec![format!("{} bids on job {job_id}", bids.len())];
        lines.extend(bids.iter().map(render_bid));
        Ok(lines.join("\n"))
    })
}

pub fn accept(job: &str, bid: &str, confirmed: bool) -> CommandResult {
    if !confirmed {
        return unconfirmed("bids.accept", "accepting a bid");
    }
    let (job_id, bid_id) = (JobId(job.to_string()), BidId(bid.to_string()));
    execute("bids.accept", |config| async move {
        let service = BidService::new(api_transport(&config)?, log_refresh);
        let bid = service.find_bid(&job_id, &bid_id).await.map_err(|error| bid_failure(error, &job_id))?;
        service.accept_bid(&job_id, &bid, Confirmation::Confirmed).await.map_err(|error| bid_failure(error, &job_id))?;
        Ok(format!("accepted bid {bid_id} on job {job_id}; other pending bids are rejected by the server"))
    })
}

pub fn delete(job: &str, bid: &str, confirmed: bool) -> CommandResult {
    if !confirmed {
        return unconfirmed("bids.delete", "deleting a bid");
    }
    let (job_id, bid_id) = (JobId(job.to_string()), BidId(bid.to_string()));
    execute("bids.delete", |config| async move {
        let service = BidService::new(api_transport(&config)?, log_refresh);
        let bid = service.find_bid(&job_id, &bid_id).await.map_err(|error| bid_failure(error, &job_id))?;
        service.delete_bid(&job_id, &bid, Confirmation::Confirmed).await.map_err(|error| bid_failure(error, &job_id))?;
        Ok(format!("deleted bid {bid_id} on job {job_id}"))
    })
}

/// Refused before any network call.
fn unconfirmed(command: &str, action: &'static str) -> CommandResult {
    let error = BidError::ConfirmationRequired { action };
    CommandResult::failure(command, "confirmation_required", format!("{error}; pass --yes"), 2)
}

fn log_refresh(job_id: &JobId) {
    info!(event_name = "cli.bids.refresh", job_id = %job_id, "bids changed; rerun `bids list` to refetch");
}

fn render_bid(bid: &Bid) -> String {
    format!(
        "  - {} {} {} by {}{}",
        bid.id,
        bid.status.as_str(),
        bid.amount,
        bid.provider.name.as_deref().unwrap_or(&bid.provider.id.0),
        bid.message.as_deref().map(|message| format!(": {message}")).unwrap_or_default()
    )
}

fn bid_failure(error: BidError, job_id: &JobId) -> Failure {
    let error_class = match &error {
        BidError::ConfirmationRequired { .. } => "confirmation_required",
        BidError::Domain(_) => "bid_rule",
        BidError::NotFound { .. } => "not_found",
        BidError::Remote { .. } | BidError::Transport(_) | BidError::Decode(_) => {
            let error = ApplicationError::Integration(error.to_string());
            return interface_failure(error, &format!("job-{job_id}"));
        }
    };
    (error_class, error.to_string(), 2)
}
