//! Harness configuration
//!
//! Credentials and URLs are injected explicitly rather than read from
//! ambient process state; [`HarnessConfig::from_env`] exists as a
//! convenience for entry points that do want the `CONDUIT_*` environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::session::Credentials;

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL the application under test is served from
    pub app_url: String,

    /// Base URL of the real Conduit API, including the `/api` prefix
    pub api_url: String,

    /// Login email
    pub username: String,

    /// Login password
    pub password: String,

    /// Directory holding canned response fixtures
    pub fixtures_dir: PathBuf,

    /// Default timeout for waits on intercepted exchanges
    pub default_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:4200".to_string(),
            api_url: "https://api.realworld.io/api".to_string(),
            username: String::new(),
            password: String::new(),
            fixtures_dir: PathBuf::from("fixtures"),
            default_timeout: Duration::from_secs(10),
        }
    }
}

impl HarnessConfig {
    /// Read the `CONDUIT_*` environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_url: env_or("CONDUIT_APP_URL", &defaults.app_url),
            api_url: env_or("CONDUIT_API_URL", &defaults.api_url),
            username: env_or("CONDUIT_USERNAME", &defaults.username),
            password: env_or("CONDUIT_PASSWORD", &defaults.password),
            fixtures_dir: defaults.fixtures_dir,
            default_timeout: defaults.default_timeout,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            email: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_demo_stack() {
        let config = HarnessConfig::default();
        assert_eq!(config.app_url, "http://localhost:4200");
        assert!(config.api_url.ends_with("/api"));
        assert_eq!(config.default_timeout, Duration::from_secs(10));
    }

    #[test]
    fn credentials_come_from_the_config_fields() {
        let config = HarnessConfig {
            username: "user@example.com".to_string(),
            password: "hunter2".to_string(),
            ..Default::default()
        };
        let credentials = config.credentials();
        assert_eq!(credentials.email, "user@example.com");
        assert_eq!(credentials.password, "hunter2");
    }
}
