//! In-memory order and opportunity-search stores.

mod memory;

pub use memory::{InMemoryOpportunityStore, InMemoryOrderStore};
pub use stapi_types::{OpportunityStore, OrderStore, StoreError};
