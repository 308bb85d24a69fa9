//! Store traits for orders and opportunity searches.

use crate::{Order, OrderStatus, OpportunityCollection, OpportunitySearchRecord};
use async_trait::async_trait;

/// Order and order-status store.
///
/// Contract: every read returns an owned copy and every write stores a copy, so callers
/// never alias stored values. `get_orders` preserves insertion order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, StoreError>;

    async fn get_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// Insert or replace an order, keyed by `order.id`.
    async fn put_order(&self, order: Order) -> Result<(), StoreError>;

    /// Returns `Ok(None)` when no status was ever recorded for the order.
    async fn get_order_statuses(&self, order_id: &str)
        -> Result<Option<Vec<OrderStatus>>, StoreError>;

    /// Append a status to the order's history.
    async fn put_order_status(&self, order_id: &str, status: OrderStatus)
        -> Result<(), StoreError>;
}

/// Opportunity search record and collection store.
#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn get_search_record(
        &self,
        search_id: &str,
    ) -> Result<Option<OpportunitySearchRecord>, StoreError>;

    async fn get_search_records(&self) -> Result<Vec<OpportunitySearchRecord>, StoreError>;

    async fn put_search_record(&self, record: OpportunitySearchRecord) -> Result<(), StoreError>;

    async fn get_opportunity_collection(
        &self,
        collection_id: &str,
    ) -> Result<Option<OpportunityCollection>, StoreError>;

    /// Fails with `StoreError::MissingId` when the collection has no id.
    async fn put_opportunity_collection(
        &self,
        collection: OpportunityCollection,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} must have an id")]
    MissingId(&'static str),
    #[error("store error: {0}")]
    Other(String),
}
