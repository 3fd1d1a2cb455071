// Domain <-> wire mapping for auction documents

use crate::domain::auction::timestamp_from_secs;
use crate::domain::{Auction, AuctionStatus, ProductCondition};
use crate::error::Result;
use crate::port::AuctionDocument;

pub fn to_document(auction: &Auction) -> AuctionDocument {
    AuctionDocument {
        id: auction.id.clone(),
        product_name: auction.product_name.clone(),
        category: auction.category.clone(),
        description: auction.description.clone(),
        condition: auction.condition.to_string(),
        status: auction.status.to_string(),
        timestamp: auction.timestamp.timestamp(),
    }
}

pub fn from_document(doc: AuctionDocument) -> Result<Auction> {
    let condition: ProductCondition = doc.condition.parse()?;
    let status: AuctionStatus = doc.status.parse()?;
    let timestamp = timestamp_from_secs(doc.timestamp)?;

    Ok(Auction {
        id: doc.id,
        product_name: doc.product_name,
        category: doc.category,
        description: doc.description,
        condition,
        status,
        timestamp,
    })
}
