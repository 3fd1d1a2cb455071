// Create Auction Use Case

use crate::application::closing::ClosingHandle;
use crate::application::store::mapping;
use crate::domain::{Auction, AuctionStatus};
use crate::error::{AppError, Result};
use crate::port::AuctionCollection;
use tracing::{error, info};

const INSERT_FAILED: &str = "Error trying to insert auction";

/// Execute create use case
///
/// Persists `auction`, writes the store-assigned ID back into it and arms its
/// closure. On insert failure `auction` is left untouched and nothing is
/// scheduled.
///
/// # Arguments
///
/// * `collection` - Auction collection (assigns the ID)
/// * `closer` - Closing scheduler handle
/// * `auction` - New auction (empty ID, Active)
pub async fn execute(
    collection: &dyn AuctionCollection,
    closer: &ClosingHandle,
    auction: &mut Auction,
) -> Result<()> {
    if auction.is_persisted() {
        return Err(AppError::Validation(format!(
            "auction already has id {}",
            auction.id
        )));
    }
    if auction.status != AuctionStatus::Active {
        return Err(AppError::Validation(format!(
            "new auctions must be {}, got {}",
            AuctionStatus::Active,
            auction.status
        )));
    }

    let doc = mapping::to_document(auction);

    let auction_id = match collection.insert_one(&doc).await {
        Ok(id) if !id.is_empty() => id,
        Ok(_) => {
            error!("{}: store returned an empty identifier", INSERT_FAILED);
            return Err(AppError::Internal(INSERT_FAILED.to_string()));
        }
        Err(e) => {
            error!(error = %e, "{}", INSERT_FAILED);
            return Err(AppError::Internal(INSERT_FAILED.to_string()));
        }
    };

    auction.id = auction_id;

    // The record exists either way; a stopped scheduler only costs the closure.
    match closer.schedule(&auction.id) {
        Ok(delay) => info!(
            auction_id = %auction.id,
            interval = %humantime::format_duration(delay),
            "Auction created"
        ),
        Err(e) => error!(
            auction_id = %auction.id,
            error = %e,
            "Auction created but its closure could not be scheduled"
        ),
    }

    Ok(())
}
