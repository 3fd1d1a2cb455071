// Auction Collection Port (Interface)
//
// The abstract record collection behind AuctionStore. Concrete storage
// engines live in infra crates.

use crate::domain::{AuctionId, AuctionStatus};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Persisted (wire) representation of an auction
///
/// Enums are stored by their wire names, the timestamp as epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionDocument {
    pub id: AuctionId,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: String,
    pub status: String,
    pub timestamp: i64,
}

/// Partial update applied by `update_one`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuctionUpdate {
    pub status: Option<AuctionStatus>,
    pub timestamp: Option<i64>,
}

/// Query filter for `find_one` / `find`
///
/// All set fields must match. `product_name` matches as a substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuctionFilter {
    pub id: Option<AuctionId>,
    pub status: Option<AuctionStatus>,
    pub category: Option<String>,
    pub product_name: Option<String>,
}

impl AuctionFilter {
    pub fn by_id(id: impl Into<AuctionId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Check a document against this filter (used by in-memory collections)
    pub fn matches(&self, doc: &AuctionDocument) -> bool {
        if let Some(id) = &self.id {
            if &doc.id != id {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if doc.status != status.to_string() {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &doc.category != category {
                return false;
            }
        }
        if let Some(name) = &self.product_name {
            if !doc.product_name.contains(name.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Collection interface for auction persistence
///
/// Must tolerate concurrent use from the creation path and every
/// pending closure at once.
#[async_trait]
pub trait AuctionCollection: Send + Sync {
    /// Insert a new document; the collection assigns and returns its ID.
    /// `doc.id` is ignored.
    async fn insert_one(&self, doc: &AuctionDocument) -> Result<AuctionId>;

    /// Apply a partial update to the document with `id`, returning the match count
    async fn update_one(&self, id: &AuctionId, update: &AuctionUpdate) -> Result<u64>;

    /// Find the first document matching `filter`
    async fn find_one(&self, filter: &AuctionFilter) -> Result<Option<AuctionDocument>>;

    /// Find all documents matching `filter`, oldest first
    async fn find(&self, filter: &AuctionFilter) -> Result<Vec<AuctionDocument>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use crate::port::id_provider::{mocks::SequentialIdProvider, IdProvider};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory collection with failure injection and call recording
    pub struct InMemoryAuctionCollection {
        docs: Mutex<Vec<AuctionDocument>>,
        updates: Mutex<Vec<(AuctionId, AuctionUpdate)>>,
        id_provider: Box<dyn IdProvider>,
        fail_inserts: AtomicBool,
        fail_updates: AtomicBool,
        insert_calls: AtomicUsize,
        update_delay: Mutex<Duration>,
    }

    impl Default for InMemoryAuctionCollection {
        fn default() -> Self {
            Self::new()
        }
    }

    impl InMemoryAuctionCollection {
        pub fn new() -> Self {
            Self {
                docs: Mutex::new(Vec::new()),
                updates: Mutex::new(Vec::new()),
                id_provider: Box::new(SequentialIdProvider::default()),
                fail_inserts: AtomicBool::new(false),
                fail_updates: AtomicBool::new(false),
                insert_calls: AtomicUsize::new(0),
                update_delay: Mutex::new(Duration::ZERO),
            }
        }

        pub fn set_fail_inserts(&self, fail: bool) {
            self.fail_inserts.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_updates(&self, fail: bool) {
            self.fail_updates.store(fail, Ordering::SeqCst);
        }

        /// Make every `update_one` stall before it is applied
        pub fn set_update_delay(&self, delay: Duration) {
            *self.update_delay.lock().unwrap() = delay;
        }

        pub fn insert_calls(&self) -> usize {
            self.insert_calls.load(Ordering::SeqCst)
        }

        /// Every `update_one` call, including failed ones
        pub fn update_calls(&self) -> Vec<(AuctionId, AuctionUpdate)> {
            self.updates.lock().unwrap().clone()
        }

        /// Snapshot of a stored document
        pub fn get(&self, id: &str) -> Option<AuctionDocument> {
            self.docs
                .lock()
                .unwrap()
                .iter()
                .find(|d| d.id == id)
                .cloned()
        }
    }

    #[async_trait]
    impl AuctionCollection for InMemoryAuctionCollection {
        async fn insert_one(&self, doc: &AuctionDocument) -> Result<AuctionId> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(AppError::Database("connection refused".to_string()));
            }

            let id = self.id_provider.generate_id();
            let mut stored = doc.clone();
            stored.id = id.clone();
            self.docs.lock().unwrap().push(stored);
            Ok(id)
        }

        async fn update_one(&self, id: &AuctionId, update: &AuctionUpdate) -> Result<u64> {
            self.updates
                .lock()
                .unwrap()
                .push((id.clone(), update.clone()));

            let delay = *self.update_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(AppError::Database("write conflict".to_string()));
            }

            let mut docs = self.docs.lock().unwrap();
            match docs.iter_mut().find(|d| &d.id == id) {
                Some(doc) => {
                    if let Some(status) = update.status {
                        doc.status = status.to_string();
                    }
                    if let Some(timestamp) = update.timestamp {
                        doc.timestamp = timestamp;
                    }
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        async fn find_one(&self, filter: &AuctionFilter) -> Result<Option<AuctionDocument>> {
            Ok(self
                .docs
                .lock()
                .unwrap()
                .iter()
                .find(|d| filter.matches(d))
                .cloned())
        }

        async fn find(&self, filter: &AuctionFilter) -> Result<Vec<AuctionDocument>> {
            Ok(self
                .docs
                .lock()
                .unwrap()
                .iter()
                .filter(|d| filter.matches(d))
                .cloned()
                .collect())
        }
    }
}
