//! MaxMind GeoLite2/GeoIP2 City database backend

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use maxminddb::{geoip2, Reader};

use super::iso::alpha3_for;
use super::{GeoLookup, GeoLookupError, GeoRecord};

/// Lookup backed by a local `.mmdb` file, read fully into memory.
pub struct MaxMindProvider {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindProvider {
    /// Open a City database from a file path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GeoLookupError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }
}

impl GeoLookup for MaxMindProvider {
    fn lookup(&self, ip: &str) -> Result<GeoRecord, GeoLookupError> {
        let addr: IpAddr = ip
            .parse()
            .map_err(|_| GeoLookupError::InvalidAddress(ip.to_string()))?;

        let result = self.reader.lookup(addr)?;
        let city: geoip2::City = result
            .decode()?
            .ok_or_else(|| GeoLookupError::NotFound(ip.to_string()))?;

        let record = record_from_city(&city);
        tracing::trace!(
            "MaxMind lookup for {}: country={}, city={:?}",
            ip,
            record.country_code,
            record.city
        );
        Ok(record)
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}

/// Flatten a City record into the response shape.
///
/// Region is the ISO code of the first, most general subdivision.
fn record_from_city(city: &geoip2::City<'_>) -> GeoRecord {
    let country_code = city.country.iso_code.unwrap_or_default().to_string();
    GeoRecord {
        city: city.city.names.english.map(str::to_string),
        continent: city.continent.code.unwrap_or_default().to_string(),
        country_code3: alpha3_for(&country_code).unwrap_or_default().to_string(),
        country_name: city.country.names.english.unwrap_or_default().to_string(),
        region: city
            .subdivisions
            .first()
            .and_then(|s| s.iso_code)
            .map(str::to_string),
        country_code,
    }
}
