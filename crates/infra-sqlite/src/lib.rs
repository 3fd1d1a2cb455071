// Gavel Infrastructure - SQLite Adapter
// Implements: AuctionCollection

mod auction_collection;
mod connection;
mod migration;

pub use auction_collection::SqliteAuctionCollection;
pub use connection::create_pool;
pub use migration::run_migrations;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
