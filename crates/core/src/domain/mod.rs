// Domain Layer - Pure business logic and entities

pub mod auction;
pub mod error;

// Re-exports
pub use auction::{Auction, AuctionId, AuctionStatus, ProductCondition};
pub use error::DomainError;
