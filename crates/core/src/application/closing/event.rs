// Closure outcome events

use crate::domain::AuctionId;
use chrono::{DateTime, Utc};

/// Outcome of one auction closure, published to `ClosingHandle::subscribe` receivers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosureEvent {
    /// Status set to Completed
    Closed {
        auction_id: AuctionId,
        closed_at: DateTime<Utc>,
    },
    /// The update matched no record
    NotMatched { auction_id: AuctionId },
    /// The update failed; the auction stays Active
    Failed { auction_id: AuctionId, reason: String },
}

impl ClosureEvent {
    pub fn auction_id(&self) -> &AuctionId {
        match self {
            ClosureEvent::Closed { auction_id, .. } => auction_id,
            ClosureEvent::NotMatched { auction_id } => auction_id,
            ClosureEvent::Failed { auction_id, .. } => auction_id,
        }
    }
}
