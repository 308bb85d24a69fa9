//! Server-side configuration.

use planet_client::SettingsError;
use std::net::SocketAddr;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub listen: SocketAddr,
    /// Base for hyperlinks in responses; no trailing slash.
    pub public_url: String,
    /// List products from Planet instead of serving the configured one only.
    pub dynamic_products: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            dynamic_products: false,
        }
    }
}

impl ApiSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(v) = lookup("STAPI_LISTEN") {
            settings.listen = v.trim().parse().map_err(|e: std::net::AddrParseError| {
                SettingsError::Invalid {
                    name: "STAPI_LISTEN",
                    value: v.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(v) = lookup("STAPI_PUBLIC_URL") {
            settings.public_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("STAPI_DYNAMIC_PRODUCTS") {
            settings.dynamic_products = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(SettingsError::Invalid {
                        name: "STAPI_DYNAMIC_PRODUCTS",
                        value: v.clone(),
                        reason: "expected true or false".to_string(),
                    })
                }
            };
        }
        Ok(settings)
    }
}
