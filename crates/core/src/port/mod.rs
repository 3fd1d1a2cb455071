// Port Layer - Interfaces for external dependencies

pub mod auction_collection;
pub mod config_source;
pub mod id_provider; // For deterministic testing
pub mod time_provider;

// Re-exports
pub use auction_collection::{AuctionCollection, AuctionDocument, AuctionFilter, AuctionUpdate};
pub use config_source::{ConfigSource, EnvConfigSource};
pub use id_provider::IdProvider;
pub use time_provider::TimeProvider;
