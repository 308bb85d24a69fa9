//! STAPI REST adapter over the Planet tasking API.

pub mod backends;
pub mod error;
pub mod server;
pub mod settings;

pub use error::ApiError;
pub use settings::ApiSettings;
