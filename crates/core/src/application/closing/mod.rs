//! ClosingScheduler - Closes every auction once its interval elapses
//!
//! One driver task owns a queue of armed closures ordered by deadline, rather
//! than one sleeping task per auction. It sleeps until the earliest deadline,
//! wakes for new entries, and runs each due closure as its own task so a slow
//! store never holds back other deadlines.
//!
//! Guarantees:
//! - one queue entry per `ClosingHandle::schedule` call, fired at most once
//! - one conditional update per fired entry, never retried
//! - shutdown abandons pending entries and aborts in-flight updates
//!
//! Outcomes are published as `ClosureEvent`s to `ClosingHandle::subscribe`.

mod event;
mod queue;

pub use event::ClosureEvent;

use crate::application::constants::CLOSURE_EVENT_CAPACITY;
use crate::application::duration::{DurationResolver, ResolvedDuration};
use crate::application::shutdown::ShutdownToken;
use crate::application::store;
use crate::domain::{AuctionId, AuctionStatus};
use crate::error::{AppError, Result};
use crate::port::{AuctionCollection, TimeProvider};
use queue::PendingClosure;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Far-future fallback for intervals too large to add to `Instant::now()`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Cloneable handle used to arm closures
#[derive(Clone)]
pub struct ClosingHandle {
    tx: mpsc::UnboundedSender<PendingClosure>,
    resolver: Arc<DurationResolver>,
    events: broadcast::Sender<ClosureEvent>,
    seq: Arc<AtomicU64>,
}

impl ClosingHandle {
    /// Arm the closure for `auction_id`
    ///
    /// Resolves the interval now, so configuration changes only affect
    /// auctions scheduled afterward. Returns the delay that was armed.
    pub fn schedule(&self, auction_id: &AuctionId) -> Result<Duration> {
        let delay = self.resolve_delay(auction_id);

        let now = Instant::now();
        let deadline = now
            .checked_add(delay)
            .unwrap_or_else(|| now + FAR_FUTURE);

        let entry = PendingClosure {
            deadline,
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            auction_id: auction_id.clone(),
        };

        self.tx.send(entry).map_err(|_| {
            AppError::InvalidState("closing scheduler is not running".to_string())
        })?;

        Ok(delay)
    }

    /// Receive closure outcomes from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ClosureEvent> {
        self.events.subscribe()
    }

    fn resolve_delay(&self, auction_id: &AuctionId) -> Duration {
        match self.resolver.resolve() {
            ResolvedDuration::Explicit(delay) => {
                debug!(
                    auction_id = %auction_id,
                    interval = %humantime::format_duration(delay),
                    "Auction interval resolved"
                );
                delay
            }
            ResolvedDuration::Defaulted { duration, reason } => {
                info!(auction_id = %auction_id, "{}", reason);
                duration
            }
            // Malformed configuration must not close auctions immediately
            ResolvedDuration::Invalid { raw, reason } => {
                let fallback = self.resolver.default_duration();
                error!(
                    auction_id = %auction_id,
                    raw = %raw,
                    fallback = %humantime::format_duration(fallback),
                    "{}",
                    reason
                );
                fallback
            }
        }
    }
}

/// Closing scheduler driver (run it in `tokio::spawn`)
pub struct ClosingScheduler {
    rx: mpsc::UnboundedReceiver<PendingClosure>,
    queue: BinaryHeap<Reverse<PendingClosure>>,
    collection: Arc<dyn AuctionCollection>,
    time_provider: Arc<dyn TimeProvider>,
    events: broadcast::Sender<ClosureEvent>,
}

impl ClosingScheduler {
    /// Create the driver and the handle that feeds it
    pub fn new(
        collection: Arc<dyn AuctionCollection>,
        resolver: DurationResolver,
        time_provider: Arc<dyn TimeProvider>,
    ) -> (Self, ClosingHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(CLOSURE_EVENT_CAPACITY);

        let handle = ClosingHandle {
            tx,
            resolver: Arc::new(resolver),
            events: events.clone(),
            seq: Arc::new(AtomicU64::new(0)),
        };

        let scheduler = Self {
            rx,
            queue: BinaryHeap::new(),
            collection,
            time_provider,
            events,
        };

        (scheduler, handle)
    }

    /// Run the scheduler loop until shutdown
    ///
    /// Also returns once every `ClosingHandle` is dropped and the remaining
    /// closures have fired.
    pub async fn run(mut self, mut shutdown: ShutdownToken) -> Result<()> {
        info!("Closing scheduler started");

        let mut in_flight: JoinSet<()> = JoinSet::new();
        let mut intake_open = true;

        loop {
            if shutdown.is_shutdown() {
                break;
            }
            if !intake_open && self.queue.is_empty() && in_flight.is_empty() {
                debug!("All closing handles dropped and queue drained");
                break;
            }

            let next_deadline = self.queue.peek().map(|Reverse(p)| p.deadline);

            tokio::select! {
                _ = shutdown.wait() => break,

                entry = self.rx.recv(), if intake_open => match entry {
                    Some(entry) => {
                        debug!(auction_id = %entry.auction_id, "Closure armed");
                        self.queue.push(Reverse(entry));
                    }
                    None => intake_open = false,
                },

                _ = sleep_until(next_deadline.unwrap_or_else(Instant::now)), if next_deadline.is_some() => {
                    self.fire_due(&mut in_flight);
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Closure task did not complete");
                    }
                }
            }
        }

        // Later `schedule` calls fail instead of queueing closures that never run
        self.rx.close();
        while let Ok(entry) = self.rx.try_recv() {
            self.queue.push(Reverse(entry));
        }

        let abandoned = self.queue.len();
        if abandoned > 0 {
            warn!(
                abandoned = abandoned,
                "Closing scheduler stopping with pending closures; those auctions stay active"
            );
        }

        if !in_flight.is_empty() {
            warn!(
                in_flight = in_flight.len(),
                "Aborting closing updates in flight"
            );
            in_flight.shutdown().await;
        }

        info!("Closing scheduler stopped");
        Ok(())
    }

    fn fire_due(&mut self, in_flight: &mut JoinSet<()>) {
        let now = Instant::now();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.deadline > now {
                break;
            }
            let Some(Reverse(due)) = self.queue.pop() else {
                break;
            };

            in_flight.spawn(close_auction(
                Arc::clone(&self.collection),
                Arc::clone(&self.time_provider),
                self.events.clone(),
                due.auction_id,
            ));
        }
    }
}

/// Issue the single closing update for one auction and publish the outcome
async fn close_auction(
    collection: Arc<dyn AuctionCollection>,
    time_provider: Arc<dyn TimeProvider>,
    events: broadcast::Sender<ClosureEvent>,
    auction_id: AuctionId,
) {
    let closed_at = time_provider.now();

    let event = match store::update_status(
        collection.as_ref(),
        &auction_id,
        AuctionStatus::Completed,
        closed_at,
    )
    .await
    {
        Ok(0) => {
            warn!(auction_id = %auction_id, "No auction matched the closing update");
            ClosureEvent::NotMatched { auction_id }
        }
        Ok(_) => {
            info!(auction_id = %auction_id, "Auction completed");
            ClosureEvent::Closed {
                auction_id,
                closed_at,
            }
        }
        Err(e) => {
            error!(
                auction_id = %auction_id,
                error = %e,
                "Error trying to update auction status to completed"
            );
            ClosureEvent::Failed {
                auction_id,
                reason: e.to_string(),
            }
        }
    };

    // No subscribers is fine
    let _ = events.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::{shutdown_channel, ShutdownSender};
    use crate::application::store::AuctionStore;
    use crate::domain::{Auction, ProductCondition};
    use crate::port::auction_collection::mocks::InMemoryAuctionCollection;
    use crate::port::config_source::mocks::StaticConfigSource;
    use crate::port::time_provider::SystemTimeProvider;
    use chrono::Utc;
    use tokio::task::JoinHandle;
    use tokio::time::{sleep, timeout};

    const KEY: &str = "AUCTION_INTERVAL";

    struct Harness {
        collection: Arc<InMemoryAuctionCollection>,
        config: Arc<StaticConfigSource>,
        store: AuctionStore,
        shutdown: ShutdownSender,
        driver: JoinHandle<Result<()>>,
    }

    fn start(interval: &str) -> Harness {
        let collection = Arc::new(InMemoryAuctionCollection::new());
        let config = Arc::new(StaticConfigSource::with(KEY, interval));
        let resolver = DurationResolver::new(config.clone());
        let (scheduler, handle) =
            ClosingScheduler::new(collection.clone(), resolver, Arc::new(SystemTimeProvider));
        let (shutdown, token) = shutdown_channel();
        let driver = tokio::spawn(scheduler.run(token));

        Harness {
            store: AuctionStore::new(collection.clone(), handle),
            collection,
            config,
            shutdown,
            driver,
        }
    }

    fn new_auction(name: &str) -> Auction {
        Auction::new(
            name,
            "Test Category",
            "Test Desc",
            ProductCondition::New,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_auction_closes_automatically() {
        let h = start("100ms");
        let mut events = h.store.closer().subscribe();
        let mut auction = new_auction("Test Product");

        h.store.create(&mut auction).await.unwrap();
        assert!(!auction.id.is_empty());

        sleep(Duration::from_secs(1)).await;

        let updates = h.collection.update_calls();
        assert_eq!(updates.len(), 1, "exactly one closing update expected");
        assert_eq!(updates[0].0, auction.id);
        assert_eq!(updates[0].1.status, Some(AuctionStatus::Completed));

        let event = events.try_recv().unwrap();
        assert!(matches!(event, ClosureEvent::Closed { .. }));
        assert_eq!(event.auction_id(), &auction.id);
    }

    #[tokio::test]
    async fn test_status_flips_only_after_interval() {
        let h = start("300ms");
        let mut auction = new_auction("Timed");
        h.store.create(&mut auction).await.unwrap();
        let created_at = auction.timestamp.timestamp();

        sleep(Duration::from_millis(100)).await;
        let early = h.store.find_by_id(&auction.id).await.unwrap().unwrap();
        assert_eq!(early.status, AuctionStatus::Active);

        sleep(Duration::from_millis(600)).await;
        let late = h.store.find_by_id(&auction.id).await.unwrap().unwrap();
        assert_eq!(late.status, AuctionStatus::Completed);
        assert!(late.timestamp.timestamp() >= created_at);
    }

    #[tokio::test]
    async fn test_auctions_close_independently() {
        let h = start("100ms");
        let mut events = h.store.closer().subscribe();

        let mut a = new_auction("A");
        h.store.create(&mut a).await.unwrap();

        // Only auctions created after the change pick it up
        h.config.set(KEY, "1s");
        let mut b = new_auction("B");
        h.store.create(&mut b).await.unwrap();

        let first = timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.auction_id(), &a.id);

        let b_now = h.store.find_by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(b_now.status, AuctionStatus::Active);

        let second = timeout(Duration::from_secs(3), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.auction_id(), &b.id);
    }

    #[tokio::test]
    async fn test_failed_insert_schedules_nothing() {
        let h = start("50ms");
        h.collection.set_fail_inserts(true);
        let mut auction = new_auction("Broken");

        assert!(h.store.create(&mut auction).await.is_err());
        assert!(auction.id.is_empty());

        sleep(Duration::from_millis(500)).await;
        assert!(h.collection.update_calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_is_reported_not_retried() {
        let h = start("50ms");
        h.collection.set_fail_updates(true);
        let mut events = h.store.closer().subscribe();
        let mut auction = new_auction("Stuck");
        h.store.create(&mut auction).await.unwrap();

        let event = timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            ClosureEvent::Failed { auction_id, reason } => {
                assert_eq!(auction_id, auction.id);
                assert!(reason.contains("write conflict"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }

        sleep(Duration::from_millis(300)).await;
        assert_eq!(h.collection.update_calls().len(), 1);
        let stored = h.collection.get(&auction.id).unwrap();
        assert_eq!(stored.status, "ACTIVE");
    }

    #[tokio::test]
    async fn test_missing_record_reports_not_matched() {
        let h = start("50ms");
        let mut events = h.store.closer().subscribe();

        h.store.closer().schedule(&"ghost".to_string()).unwrap();

        let event = timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            ClosureEvent::NotMatched {
                auction_id: "ghost".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_shutdown_abandons_pending_closures() {
        let h = start("300ms");
        let mut auction = new_auction("Abandoned");
        h.store.create(&mut auction).await.unwrap();

        h.shutdown.shutdown();
        timeout(Duration::from_secs(1), h.driver)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        sleep(Duration::from_millis(500)).await;
        assert!(h.collection.update_calls().is_empty());
        assert_eq!(h.collection.get(&auction.id).unwrap().status, "ACTIVE");

        // Scheduler is gone; creation still succeeds
        let mut late = new_auction("Late");
        h.store.create(&mut late).await.unwrap();
        assert!(h.store.closer().schedule(&late.id).is_err());
    }

    #[tokio::test]
    async fn test_shutdown_aborts_in_flight_update() {
        let h = start("10ms");
        h.collection.set_update_delay(Duration::from_secs(1));
        let mut events = h.store.closer().subscribe();
        let mut auction = new_auction("Slow");
        h.store.create(&mut auction).await.unwrap();

        // Closure has fired and is stuck inside the store
        sleep(Duration::from_millis(100)).await;
        assert_eq!(h.collection.update_calls().len(), 1);

        let started = std::time::Instant::now();
        h.shutdown.shutdown();
        timeout(Duration::from_millis(500), h.driver)
            .await
            .expect("shutdown must not wait for the slow update")
            .unwrap()
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(500));

        // Rejected right away once the driver is gone
        let err = h.store.closer().schedule(&auction.id).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        sleep(Duration::from_millis(1200)).await;
        assert_eq!(h.collection.get(&auction.id).unwrap().status, "ACTIVE");
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_interval_falls_back_to_default() {
        let h = start("notaduration");
        let delay = h.store.closer().schedule(&"any".to_string()).unwrap();
        assert_eq!(delay, Duration::from_secs(300));

        h.config.remove(KEY);
        let delay = h.store.closer().schedule(&"any".to_string()).unwrap();
        assert_eq!(delay, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_drains_queue_when_handles_dropped() {
        let h = start("50ms");
        let mut auction = new_auction("Last");
        h.store.create(&mut auction).await.unwrap();

        let Harness {
            collection,
            store,
            shutdown: _shutdown,
            driver,
            ..
        } = h;
        drop(store);

        timeout(Duration::from_secs(1), driver)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(collection.get(&auction.id).unwrap().status, "COMPLETED");
    }
}
