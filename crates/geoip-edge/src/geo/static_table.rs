//! Fixed in-memory geolocation table
//!
//! Used for local development and tests. The fixture file is a JSON object
//! keyed by IP address:
//!
//! ```json
//! {
//!   "8.8.8.8": {
//!     "city": "Mountain View", "continent": "NA", "country_code": "US",
//!     "country_code3": "USA", "country_name": "United States", "region": "CA"
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;
use std::path::Path;

use anyhow::{Context, Result};

use super::{GeoLookup, GeoLookupError, GeoRecord};

/// Lookup table keyed by canonical IP address.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    entries: HashMap<IpAddr, GeoRecord>,
}

impl StaticProvider {
    /// Build from `(address, record)` pairs. Unparseable addresses are rejected.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, GeoRecord)>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(ip, record)| {
                let ip = ip.as_ref();
                ip.parse::<IpAddr>()
                    .map(|addr| (addr, record))
                    .with_context(|| format!("invalid IP address in geolocation table: {:?}", ip))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { entries })
    }

    /// Load a JSON fixture file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let table: HashMap<String, GeoRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Self::from_entries(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GeoLookup for StaticProvider {
    fn lookup(&self, ip: &str) -> Result<GeoRecord, GeoLookupError> {
        let addr: IpAddr = ip
            .parse()
            .map_err(|_| GeoLookupError::InvalidAddress(ip.to_string()))?;
        self.entries
            .get(&addr)
            .cloned()
            .ok_or_else(|| GeoLookupError::NotFound(ip.to_string()))
    }

    fn name(&self) -> &'static str {
        "Static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(city: &str) -> GeoRecord {
        GeoRecord {
            city: Some(city.into()),
            continent: "EU".into(),
            country_code: "DE".into(),
            country_code3: "DEU".into(),
            country_name: "Germany".into(),
            region: Some("BE".into()),
        }
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let provider = StaticProvider::from_entries([("192.0.2.1", record("Berlin"))]).unwrap();
        assert_eq!(provider.lookup("192.0.2.1").unwrap().city.as_deref(), Some("Berlin"));
        assert!(matches!(
            provider.lookup("192.0.2.2"),
            Err(GeoLookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_lookup_invalid_address() {
        let provider = StaticProvider::default();
        assert!(matches!(
            provider.lookup("not-an-ip"),
            Err(GeoLookupError::InvalidAddress(_))
        ));
        assert!(matches!(provider.lookup(""), Err(GeoLookupError::InvalidAddress(_))));
    }

    #[test]
    fn test_ipv6_is_canonicalised() {
        let provider = StaticProvider::from_entries([("2001:db8::1", record("Hamburg"))]).unwrap();
        let hit = provider.lookup("2001:0db8:0000:0000:0000:0000:0000:0001").unwrap();
        assert_eq!(hit.city.as_deref(), Some("Hamburg"));
    }

    #[test]
    fn test_from_entries_rejects_bad_key() {
        assert!(StaticProvider::from_entries([("999.1.1.1", record("Nowhere"))]).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"198.51.100.4": {{"continent": "OC", "country_code": "AU",
                "country_code3": "AUS", "country_name": "Australia"}}}}"#
        )
        .unwrap();

        let provider = StaticProvider::from_file(file.path()).unwrap();
        assert_eq!(provider.len(), 1);
        let hit = provider.lookup("198.51.100.4").unwrap();
        assert_eq!(hit.city, None);
        assert_eq!(hit.region, None);
        assert_eq!(hit.country_code3, "AUS");
    }

    #[test]
    fn test_from_file_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(StaticProvider::from_file(file.path()).is_err());
    }
}
