//! Core types for the STAPI ⇄ Planet tasking adapter.
//!
//! `stapi` holds the standardized tasking API shapes, `planet` the Planet-specific
//! STAPI models, and `vendor` the Planet tasking REST wire format.

mod interval;
pub mod planet;
pub mod stapi;
mod traits;
pub mod vendor;

pub use interval::DatetimeInterval;
pub use stapi::*;
pub use traits::*;

/// JSON object used for free-form properties and parameters.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Malformed or out-of-range input at the translation boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation error: {0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
