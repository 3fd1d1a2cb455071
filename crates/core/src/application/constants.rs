// Auction lifecycle constants (no magic values)
use std::time::Duration;

/// Configuration key naming the closing interval
pub const AUCTION_INTERVAL_KEY: &str = "AUCTION_INTERVAL";

/// Closing interval used when none is configured (5 minutes)
pub const DEFAULT_AUCTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Buffered closure events per subscriber before the oldest are dropped
pub const CLOSURE_EVENT_CAPACITY: usize = 256;
