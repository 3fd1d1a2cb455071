// Application Layer - Use Cases and Business Logic

pub mod closing;
pub mod constants;
pub mod duration;
pub mod shutdown;
pub mod store;

// Re-exports
pub use closing::{ClosingHandle, ClosingScheduler, ClosureEvent};
pub use duration::{DurationResolver, ResolvedDuration};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use store::AuctionStore;
