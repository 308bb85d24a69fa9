//! HTTP client for the Planet tasking API.
//!
//! Imaging-window searches run as asynchronous jobs on Planet's side; `AsyncJobClient`
//! submits them and polls the returned location until the job is DONE or FAILED.

mod client;
mod credentials;
mod error;
#[cfg(feature = "test-util")]
pub mod fake;
mod job;
mod settings;

pub use client::PlanetClient;
pub use credentials::Credentials;
pub use error::{ClientError, SettingsError};
pub use job::AsyncJobClient;
pub use settings::{Environment, PollPolicy, Settings, API_BASE_PATH, API_DOMAIN};
pub use tokio_util::sync::CancellationToken;
