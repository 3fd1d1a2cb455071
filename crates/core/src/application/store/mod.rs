// AuctionStore - Persistence use cases for auctions

pub mod create;
pub mod mapping;

use crate::application::closing::ClosingHandle;
use crate::domain::{Auction, AuctionId, AuctionStatus};
use crate::error::Result;
use crate::port::{AuctionCollection, AuctionFilter, AuctionUpdate};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Auction Store
///
/// Owns the persisted representation of auctions. Creating an auction arms
/// exactly one closure through the injected `ClosingHandle`.
pub struct AuctionStore {
    collection: Arc<dyn AuctionCollection>,
    closer: ClosingHandle,
}

impl AuctionStore {
    pub fn new(collection: Arc<dyn AuctionCollection>, closer: ClosingHandle) -> Self {
        Self { collection, closer }
    }

    /// Persist a new auction and schedule its closure
    pub async fn create(&self, auction: &mut Auction) -> Result<()> {
        create::execute(self.collection.as_ref(), &self.closer, auction).await
    }

    /// Conditional single-record update of status and timestamp
    pub async fn update_status(
        &self,
        id: &AuctionId,
        status: AuctionStatus,
        timestamp: DateTime<Utc>,
    ) -> Result<u64> {
        update_status(self.collection.as_ref(), id, status, timestamp).await
    }

    /// Point lookup by ID
    pub async fn find_by_id(&self, id: &AuctionId) -> Result<Option<Auction>> {
        self.collection
            .find_one(&AuctionFilter::by_id(id.clone()))
            .await?
            .map(mapping::from_document)
            .transpose()
    }

    /// Query auctions by status, category and product name
    pub async fn find(&self, filter: &AuctionFilter) -> Result<Vec<Auction>> {
        self.collection
            .find(filter)
            .await?
            .into_iter()
            .map(mapping::from_document)
            .collect()
    }

    pub fn closer(&self) -> &ClosingHandle {
        &self.closer
    }
}

/// Update one auction's status and timestamp, filtered by ID
///
/// The update only ever moves an active auction forward, so `status` must be
/// a valid target from Active. Returns the match count.
pub async fn update_status(
    collection: &dyn AuctionCollection,
    id: &AuctionId,
    status: AuctionStatus,
    timestamp: DateTime<Utc>,
) -> Result<u64> {
    let status = AuctionStatus::Active.transition_to(status)?;

    let update = AuctionUpdate {
        status: Some(status),
        timestamp: Some(timestamp.timestamp()),
    };
    collection.update_one(id, &update).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::closing::ClosingScheduler;
    use crate::application::duration::DurationResolver;
    use crate::domain::{DomainError, ProductCondition};
    use crate::error::AppError;
    use crate::port::auction_collection::mocks::InMemoryAuctionCollection;
    use crate::port::config_source::mocks::StaticConfigSource;
    use crate::port::time_provider::SystemTimeProvider;
    use chrono::TimeZone;

    fn setup() -> (Arc<InMemoryAuctionCollection>, AuctionStore, ClosingScheduler) {
        let collection = Arc::new(InMemoryAuctionCollection::new());
        let resolver = DurationResolver::new(Arc::new(StaticConfigSource::with(
            "AUCTION_INTERVAL",
            "1h",
        )));
        // Scheduler is kept but never run: armed closures just queue up.
        let (scheduler, handle) =
            ClosingScheduler::new(collection.clone(), resolver, Arc::new(SystemTimeProvider));
        let store = AuctionStore::new(collection.clone(), handle);
        (collection, store, scheduler)
    }

    fn new_auction(name: &str, category: &str) -> Auction {
        Auction::new(
            name,
            category,
            "Test Desc",
            ProductCondition::New,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_assigns_store_id() {
        let (collection, store, _scheduler) = setup();
        let mut auction = new_auction("Test Product", "Test Category");

        store.create(&mut auction).await.unwrap();

        assert_eq!(auction.id, "auction-1");
        let doc = collection.get(&auction.id).unwrap();
        assert_eq!(doc.product_name, "Test Product");
        assert_eq!(doc.status, "ACTIVE");
        assert_eq!(doc.timestamp, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_create_failure_leaves_auction_untouched() {
        let (collection, store, _scheduler) = setup();
        collection.set_fail_inserts(true);
        let mut auction = new_auction("Test Product", "Test Category");
        let before = auction.clone();

        let err = store.create(&mut auction).await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.to_string(), "Internal error: Error trying to insert auction");
        assert_eq!(auction, before);
        assert!(auction.id.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_persisted_or_completed_auction() {
        let (collection, store, _scheduler) = setup();

        let mut persisted = new_auction("A", "c");
        persisted.id = "existing".to_string();
        assert!(matches!(
            store.create(&mut persisted).await,
            Err(AppError::Validation(_))
        ));

        let mut completed = new_auction("B", "c");
        completed.status = AuctionStatus::Completed;
        assert!(matches!(
            store.create(&mut completed).await,
            Err(AppError::Validation(_))
        ));

        assert_eq!(collection.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_find_by_id_and_filter() {
        let (_collection, store, _scheduler) = setup();
        let mut lamp = new_auction("Desk Lamp", "home");
        let mut camera = new_auction("Vintage Camera", "photo");
        store.create(&mut lamp).await.unwrap();
        store.create(&mut camera).await.unwrap();

        let found = store.find_by_id(&camera.id).await.unwrap().unwrap();
        assert_eq!(found, camera);
        assert!(store.find_by_id(&"missing".to_string()).await.unwrap().is_none());

        let photo = store
            .find(&AuctionFilter {
                category: Some("photo".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(photo, vec![camera.clone()]);

        let active = store
            .find(&AuctionFilter {
                status: Some(AuctionStatus::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 2);
    }

    #[tokio::test]
    async fn test_update_status_only_completes() {
        let (collection, store, _scheduler) = setup();
        let mut auction = new_auction("Test Product", "Test Category");
        store.create(&mut auction).await.unwrap();
        let closed_at = Utc.timestamp_opt(1_700_000_300, 0).unwrap();

        let err = store
            .update_status(&auction.id, AuctionStatus::Active, closed_at)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::InvalidStatusTransition { .. })
        ));
        assert!(collection.update_calls().is_empty());

        let matched = store
            .update_status(&auction.id, AuctionStatus::Completed, closed_at)
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let doc = collection.get(&auction.id).unwrap();
        assert_eq!(doc.status, "COMPLETED");
        assert_eq!(doc.timestamp, 1_700_000_300);

        let matched = store
            .update_status(&"missing".to_string(), AuctionStatus::Completed, closed_at)
            .await
            .unwrap();
        assert_eq!(matched, 0);
    }
}
