//! Geolocation providers
//!
//! The handler only sees the [`GeoLookup`] trait. Two backends exist:
//! - [`MaxMindProvider`] reads a GeoLite2/GeoIP2 City database
//! - [`StaticProvider`] serves a fixed table, usually loaded from a JSON fixture
//!
//! [`provider_from_config`] picks one at startup.

pub mod iso;
pub mod maxmind;
pub mod static_table;

use std::sync::Arc;

use anyhow::{Context, Result};
use geoip_edge_sdk::HandlerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

pub use maxmind::MaxMindProvider;
pub use static_table::StaticProvider;

/// Geolocation attributes for one IP address.
///
/// Field order is the order of the JSON response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    #[serde(default)]
    pub city: Option<String>,
    pub continent: String,
    pub country_code: String,
    pub country_code3: String,
    pub country_name: String,
    #[serde(default)]
    pub region: Option<String>,
}

/// Errors returned by a geolocation backend
#[derive(Error, Debug)]
pub enum GeoLookupError {
    #[error("invalid IP address: {0:?}")]
    InvalidAddress(String),

    #[error("no geolocation data for {0}")]
    NotFound(String),

    #[error("geolocation database error: {0}")]
    Database(#[from] maxminddb::MaxMindDbError),
}

impl From<GeoLookupError> for HandlerError {
    fn from(err: GeoLookupError) -> Self {
        HandlerError::LookupError(err.to_string())
    }
}

/// Resolve an IP address to a [`GeoRecord`].
///
/// The address is passed through exactly as the caller supplied it; parsing
/// and validation are up to the backend.
pub trait GeoLookup: Send + Sync {
    fn lookup(&self, ip: &str) -> Result<GeoRecord, GeoLookupError>;

    /// Backend name (for logs)
    fn name(&self) -> &'static str;
}

/// Build the geolocation backend described by the configuration.
///
/// 1. `mmdb_path` set -> [`MaxMindProvider`]
/// 2. `geo_fixtures_path` set -> [`StaticProvider`] loaded from that file
/// 3. neither -> an empty [`StaticProvider`]; every lookup fails
pub fn provider_from_config(config: &AppConfig) -> Result<Arc<dyn GeoLookup>> {
    let provider: Arc<dyn GeoLookup> = if let Some(ref path) = config.mmdb_path {
        let provider = MaxMindProvider::open(path)
            .with_context(|| format!("failed to open MaxMind database {}", path.display()))?;
        tracing::info!("GeoIP: Using MaxMind database at {}", path.display());
        Arc::new(provider)
    } else if let Some(ref path) = config.geo_fixtures_path {
        let provider = StaticProvider::from_file(path)
            .with_context(|| format!("failed to load geolocation fixtures {}", path.display()))?;
        tracing::info!(
            entries = provider.len(),
            "GeoIP: Using static table from {}",
            path.display()
        );
        Arc::new(provider)
    } else {
        tracing::warn!("GeoIP: No database or fixtures configured, every lookup will fail");
        Arc::new(StaticProvider::default())
    };

    tracing::info!("GeoIP: Initialized with {} provider", provider.name());
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_record_field_order() {
        let record = GeoRecord {
            city: Some("Paris".into()),
            continent: "EU".into(),
            country_code: "FR".into(),
            country_code3: "FRA".into(),
            country_name: "France".into(),
            region: None,
        };
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"city":"Paris","continent":"EU","country_code":"FR","country_code3":"FRA","country_name":"France","region":null}"#
        );
    }

    #[test]
    fn test_lookup_error_maps_to_handler_error() {
        let err: HandlerError = GeoLookupError::NotFound("10.0.0.1".into()).into();
        assert!(matches!(err, HandlerError::LookupError(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_provider_from_config_without_sources() {
        let config = AppConfig::default_for_tests();
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "Static");
        assert!(matches!(
            provider.lookup("8.8.8.8"),
            Err(GeoLookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_provider_from_config_with_fixtures() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"8.8.8.8": {{"city": "Mountain View", "continent": "NA", "country_code": "US",
                "country_code3": "USA", "country_name": "United States", "region": "CA"}}}}"#
        )
        .unwrap();

        let mut config = AppConfig::default_for_tests();
        config.geo_fixtures_path = Some(file.path().to_path_buf());

        let provider = provider_from_config(&config).unwrap();
        let record = provider.lookup("8.8.8.8").unwrap();
        assert_eq!(record.city.as_deref(), Some("Mountain View"));
        assert_eq!(record.region.as_deref(), Some("CA"));
    }

    #[test]
    fn test_provider_from_config_missing_database_fails() {
        let mut config = AppConfig::default_for_tests();
        config.mmdb_path = Some("/nonexistent/GeoLite2-City.mmdb".into());
        assert!(provider_from_config(&config).is_err());
    }
}
