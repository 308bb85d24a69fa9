//! Translation layer between STAPI and the Planet tasking API.
//!
//! Pure functions only; every fallible conversion returns `ConvertError`.

mod conversions;
mod status;

pub use conversions::*;
pub use status::{order_status_from_planet, planet_status_to_code};

use stapi_types::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid product id {0:?}: expected \"<pl_number>:<product>\"")]
    InvalidProductId(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
