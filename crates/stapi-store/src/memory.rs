//! In-memory stores keyed by id; process lifetime only.

use async_trait::async_trait;
use stapi_types::{
    OpportunityCollection, OpportunitySearchRecord, OpportunityStore, Order, OrderStatus,
    OrderStore, StoreError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct OrderTable {
    /// Insertion order of ids.
    ids: Vec<String>,
    by_id: HashMap<String, Order>,
}

/// In-memory implementation of OrderStore.
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<OrderTable>>,
    /// order_id -> status history, oldest first.
    statuses: Arc<RwLock<HashMap<String, Vec<OrderStatus>>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(OrderTable::default())),
            statuses: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        let guard = self.orders.read().await;
        Ok(guard.by_id.get(order_id).cloned())
    }

    async fn get_orders(&self) -> Result<Vec<Order>, StoreError> {
        let guard = self.orders.read().await;
        Ok(guard
            .ids
            .iter()
            .filter_map(|id| guard.by_id.get(id).cloned())
            .collect())
    }

    async fn put_order(&self, order: Order) -> Result<(), StoreError> {
        let mut guard = self.orders.write().await;
        if !guard.by_id.contains_key(&order.id) {
            guard.ids.push(order.id.clone());
        }
        guard.by_id.insert(order.id.clone(), order);
        Ok(())
    }

    async fn get_order_statuses(
        &self,
        order_id: &str,
    ) -> Result<Option<Vec<OrderStatus>>, StoreError> {
        let guard = self.statuses.read().await;
        Ok(guard.get(order_id).cloned())
    }

    async fn put_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        let mut guard = self.statuses.write().await;
        guard.entry(order_id.to_string()).or_default().push(status);
        Ok(())
    }
}

/// In-memory implementation of OpportunityStore.
pub struct InMemoryOpportunityStore {
    search_records: Arc<RwLock<Vec<OpportunitySearchRecord>>>,
    collections: Arc<RwLock<HashMap<String, OpportunityCollection>>>,
}

impl InMemoryOpportunityStore {
    pub fn new() -> Self {
        Self {
            search_records: Arc::new(RwLock::new(Vec::new())),
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryOpportunityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OpportunityStore for InMemoryOpportunityStore {
    async fn get_search_record(
        &self,
        search_id: &str,
    ) -> Result<Option<OpportunitySearchRecord>, StoreError> {
        let guard = self.search_records.read().await;
        Ok(guard.iter().find(|r| r.id == search_id).cloned())
    }

    async fn get_search_records(&self) -> Result<Vec<OpportunitySearchRecord>, StoreError> {
        Ok(self.search_records.read().await.clone())
    }

    async fn put_search_record(&self, record: OpportunitySearchRecord) -> Result<(), StoreError> {
        let mut guard = self.search_records.write().await;
        match guard.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => guard.push(record),
        }
        Ok(())
    }

    async fn get_opportunity_collection(
        &self,
        collection_id: &str,
    ) -> Result<Option<OpportunityCollection>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard.get(collection_id).cloned())
    }

    async fn put_opportunity_collection(
        &self,
        collection: OpportunityCollection,
    ) -> Result<(), StoreError> {
        let id = collection
            .id
            .clone()
            .ok_or(StoreError::MissingId("collection"))?;
        self.collections.write().await.insert(id, collection);
        Ok(())
    }
}
