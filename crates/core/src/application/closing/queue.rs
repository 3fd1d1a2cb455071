// Delayed closure queue entries

use crate::domain::AuctionId;
use std::cmp::Ordering;
use tokio::time::Instant;

/// One armed closure, ordered by deadline then arrival
#[derive(Debug)]
pub(crate) struct PendingClosure {
    pub deadline: Instant,
    pub seq: u64,
    pub auction_id: AuctionId,
}

impl PartialEq for PendingClosure {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingClosure {}

impl PartialOrd for PendingClosure {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingClosure {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}
