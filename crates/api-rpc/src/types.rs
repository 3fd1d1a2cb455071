//! RPC Request/Response Types

use gavel_core::domain::Auction;
use serde::{Deserialize, Serialize};

/// auction.create.v1 - Create an auction and arm its closure
#[derive(Debug, Deserialize)]
pub struct CreateAuctionRequest {
    pub product_name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// `NEW` or `USED`
    pub condition: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAuctionResponse {
    pub auction_id: String,
    pub status: String,
    pub timestamp: i64,
}

/// auction.get.v1 - Fetch one auction
#[derive(Debug, Deserialize)]
pub struct GetAuctionRequest {
    pub auction_id: String,
}

/// auction.list.v1 - Filter auctions
#[derive(Debug, Default, Deserialize)]
pub struct ListAuctionsRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListAuctionsResponse {
    pub auctions: Vec<AuctionView>,
}

/// Auction as seen by RPC clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionView {
    pub auction_id: String,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: String,
    pub status: String,
    pub timestamp: i64,
}

impl From<Auction> for AuctionView {
    fn from(auction: Auction) -> Self {
        Self {
            auction_id: auction.id,
            product_name: auction.product_name,
            category: auction.category,
            description: auction.description,
            condition: auction.condition.to_string(),
            status: auction.status.to_string(),
            timestamp: auction.timestamp.timestamp(),
        }
    }
}
