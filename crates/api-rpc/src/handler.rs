//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::error::to_rpc_error;
use crate::types::{
    AuctionView, CreateAuctionRequest, CreateAuctionResponse, GetAuctionRequest,
    ListAuctionsRequest, ListAuctionsResponse,
};
use gavel_core::application::AuctionStore;
use gavel_core::domain::{Auction, AuctionStatus, ProductCondition};
use gavel_core::error::AppError;
use gavel_core::port::{AuctionFilter, TimeProvider};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    store: Arc<AuctionStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl RpcHandler {
    pub fn new(store: Arc<AuctionStore>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            store,
            time_provider,
        }
    }

    /// auction.create.v1
    pub async fn create(
        &self,
        params: CreateAuctionRequest,
    ) -> Result<CreateAuctionResponse, ErrorObjectOwned> {
        let condition: ProductCondition = params
            .condition
            .parse()
            .map_err(|e| to_rpc_error(AppError::from(e)))?;

        let mut auction = Auction::new(
            params.product_name,
            params.category,
            params.description,
            condition,
            self.time_provider.now(),
        );

        self.store
            .create(&mut auction)
            .await
            .map_err(to_rpc_error)?;

        Ok(CreateAuctionResponse {
            auction_id: auction.id,
            status: auction.status.to_string(),
            timestamp: auction.timestamp.timestamp(),
        })
    }

    /// auction.get.v1
    pub async fn get(&self, params: GetAuctionRequest) -> Result<AuctionView, ErrorObjectOwned> {
        let auction = self
            .store
            .find_by_id(&params.auction_id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "Auction {} not found",
                    params.auction_id
                )))
            })?;

        Ok(auction.into())
    }

    /// auction.list.v1
    pub async fn list(
        &self,
        params: ListAuctionsRequest,
    ) -> Result<ListAuctionsResponse, ErrorObjectOwned> {
        let status = params
            .status
            .as_deref()
            .map(str::parse::<AuctionStatus>)
            .transpose()
            .map_err(|e| to_rpc_error(AppError::from(e)))?;

        let filter = AuctionFilter {
            id: None,
            status,
            category: params.category,
            product_name: params.product_name,
        };

        let auctions = self.store.find(&filter).await.map_err(to_rpc_error)?;

        Ok(ListAuctionsResponse {
            auctions: auctions.into_iter().map(AuctionView::from).collect(),
        })
    }
}
