//! Vendor-side configuration read from the process environment.

use crate::SettingsError;
use reqwest::Url;
use std::time::Duration;

pub const API_DOMAIN: &str = "https://api.planet.com";
pub const API_BASE_PATH: &str = "/tasking/v2";

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_POLL_MAX_WAIT_SECS: u64 = 600;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Deployment the adapter talks to; selects the Planet contract number and API domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Staging,
}

impl Environment {
    pub fn pl_number(self) -> &'static str {
        match self {
            Environment::Production => "INT-003001",
            Environment::Staging => "INT-004004",
        }
    }

    /// Variable holding this environment's API domain; unset means `API_DOMAIN`.
    pub fn domain_var(self) -> &'static str {
        match self {
            Environment::Production => "PLANET_API_DOMAIN_PRODUCTION",
            Environment::Staging => "PLANET_API_DOMAIN_STAGING",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            _ => Err("expected \"production\" or \"staging\"".to_string()),
        }
    }
}

/// How a search job is polled: fixed interval, bounded by wait time and/or poll count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Option<Duration>,
    pub max_polls: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_wait: Some(Duration::from_secs(DEFAULT_POLL_MAX_WAIT_SECS)),
            max_polls: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    /// Relative poll locations are resolved against this.
    pub api_domain: Url,
    /// No trailing slash.
    pub api_base_url: String,
    pub fallback_token: Option<String>,
    pub poll: PollPolicy,
    pub http_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("PLANET_ENV") {
            Some(v) => v.parse().map_err(|reason| SettingsError::Invalid {
                name: "PLANET_ENV",
                value: v.clone(),
                reason,
            })?,
            None => Environment::default(),
        };
        // PLANET_API_DOMAIN overrides whatever the environment selects.
        let domain = lookup("PLANET_API_DOMAIN")
            .or_else(|| lookup(env.domain_var()))
            .unwrap_or_else(|| API_DOMAIN.to_string());
        let base_url = lookup("PLANET_API_BASE_URL")
            .unwrap_or_else(|| format!("{}{}", domain.trim_end_matches('/'), API_BASE_PATH));
        let mut settings = Self::with_urls(&domain, &base_url)?;
        settings.env = env;
        settings.fallback_token = lookup("BACKEND_TOKEN").filter(|t| !t.trim().is_empty());

        if let Some(ms) = parse_u64(&lookup, "PLANET_POLL_INTERVAL_MS")? {
            settings.poll.interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_u64(&lookup, "PLANET_POLL_MAX_WAIT_SECS")? {
            settings.poll.max_wait = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(n) = parse_u64(&lookup, "PLANET_POLL_MAX_ATTEMPTS")? {
            let n = u32::try_from(n).map_err(|e| SettingsError::Invalid {
                name: "PLANET_POLL_MAX_ATTEMPTS",
                value: n.to_string(),
                reason: e.to_string(),
            })?;
            settings.poll.max_polls = (n > 0).then_some(n);
        }
        if let Some(secs) = parse_u64(&lookup, "PLANET_HTTP_TIMEOUT_SECS")? {
            settings.http_timeout = Duration::from_secs(secs);
        }
        Ok(settings)
    }

    /// Settings pointing at explicit URLs, everything else default.
    pub fn with_urls(api_domain: &str, api_base_url: &str) -> Result<Self, SettingsError> {
        let domain = Url::parse(api_domain).map_err(|e| SettingsError::Invalid {
            name: "PLANET_API_DOMAIN",
            value: api_domain.to_string(),
            reason: e.to_string(),
        })?;
        Url::parse(api_base_url).map_err(|e| SettingsError::Invalid {
            name: "PLANET_API_BASE_URL",
            value: api_base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            env: Environment::default(),
            api_domain: domain,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            fallback_token: None,
            poll: PollPolicy::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        })
    }

    pub fn pl_number(&self) -> &'static str {
        self.env.pl_number()
    }

    pub fn orders_url(&self) -> String {
        format!("{}/orders/", self.api_base_url)
    }

    pub fn products_url(&self) -> String {
        format!("{}/products", self.api_base_url)
    }

    pub fn iw_search_url(&self) -> String {
        format!("{}/imaging-windows/search", self.api_base_url)
    }
}

fn parse_u64<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: std::num::ParseIntError| SettingsError::Invalid {
                name,
                value: v.clone(),
                reason: e.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_target_production() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.env, Environment::Production);
        assert_eq!(s.pl_number(), "INT-003001");
        assert_eq!(s.api_base_url, "https://api.planet.com/tasking/v2");
        assert_eq!(
            s.iw_search_url(),
            "https://api.planet.com/tasking/v2/imaging-windows/search"
        );
        assert_eq!(s.orders_url(), "https://api.planet.com/tasking/v2/orders/");
        assert_eq!(s.poll, PollPolicy::default());
        assert!(s.fallback_token.is_none());
    }

    #[test]
    fn staging_and_overrides() {
        let s = Settings::from_lookup(lookup(&[
            ("PLANET_ENV", "Staging"),
            ("PLANET_API_DOMAIN", "https://api.staging.example/"),
            ("BACKEND_TOKEN", "tok"),
            ("PLANET_POLL_INTERVAL_MS", "250"),
            ("PLANET_POLL_MAX_WAIT_SECS", "0"),
            ("PLANET_POLL_MAX_ATTEMPTS", "12"),
        ]))
        .unwrap();
        assert_eq!(s.pl_number(), "INT-004004");
        assert_eq!(s.api_base_url, "https://api.staging.example/tasking/v2");
        assert_eq!(s.fallback_token.as_deref(), Some("tok"));
        assert_eq!(s.poll.interval, Duration::from_millis(250));
        assert_eq!(s.poll.max_wait, None);
        assert_eq!(s.poll.max_polls, Some(12));
    }

    #[test]
    fn environment_selects_its_domain() {
        let vars = [
            ("PLANET_API_DOMAIN_PRODUCTION", "https://api.prod.example"),
            ("PLANET_API_DOMAIN_STAGING", "https://api.staging.example"),
        ];
        let prod = Settings::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(prod.api_domain.as_str(), "https://api.prod.example/");
        assert_eq!(prod.api_base_url, "https://api.prod.example/tasking/v2");

        let mut staging_vars = vars.to_vec();
        staging_vars.push(("PLANET_ENV", "staging"));
        let staging = Settings::from_lookup(lookup(&staging_vars)).unwrap();
        assert_eq!(staging.api_domain.as_str(), "https://api.staging.example/");
        assert_eq!(staging.api_base_url, "https://api.staging.example/tasking/v2");
        assert_eq!(staging.pl_number(), "INT-004004");

        let staging_default =
            Settings::from_lookup(lookup(&[("PLANET_ENV", "staging")])).unwrap();
        assert_eq!(staging_default.api_domain.as_str(), "https://api.planet.com/");

        staging_vars.push(("PLANET_API_DOMAIN", "https://override.example"));
        let overridden = Settings::from_lookup(lookup(&staging_vars)).unwrap();
        assert_eq!(overridden.api_base_url, "https://override.example/tasking/v2");
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = Settings::from_lookup(lookup(&[("PLANET_ENV", "qa")])).unwrap_err();
        assert!(err.to_string().contains("PLANET_ENV"));
        let err =
            Settings::from_lookup(lookup(&[("PLANET_POLL_INTERVAL_MS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("PLANET_POLL_INTERVAL_MS"));
        assert!(Settings::from_lookup(lookup(&[("PLANET_API_DOMAIN", "not a url")])).is_err());
    }
}
