//! Application configuration

use std::env;
use std::path::PathBuf;

use crate::auth::DEFAULT_STORE_NAME;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port for the HTTP front end
    pub port: u16,

    /// Require a recognised `X-Secret` header
    pub require_auth: bool,

    /// Pass the provider's region through instead of always sending null
    pub include_region: bool,

    /// MaxMind City database
    pub mmdb_path: Option<PathBuf>,

    /// Static JSON geolocation table, used when no database is configured
    pub geo_fixtures_path: Option<PathBuf>,

    /// Name of the auth store (for logs)
    pub auth_store_name: String,

    /// JSON file holding the auth store entries
    pub auth_store_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from any variable source
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let require_auth = var("GEOIP_EDGE_REQUIRE_AUTH")
            .and_then(|s| parse_bool(&s))
            .unwrap_or(false);

        Self {
            port: var("GEOIP_EDGE_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),

            require_auth,

            include_region: var("GEOIP_EDGE_INCLUDE_REGION")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(require_auth),

            mmdb_path: var("GEOIP_EDGE_MMDB_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),

            geo_fixtures_path: var("GEOIP_EDGE_GEO_FIXTURES")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),

            auth_store_name: var("GEOIP_EDGE_AUTH_STORE_NAME")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_STORE_NAME.to_string()),

            auth_store_path: var("GEOIP_EDGE_AUTH_STORE_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    #[cfg(test)]
    pub(crate) fn default_for_tests() -> Self {
        Self::from_vars(|_| None)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
