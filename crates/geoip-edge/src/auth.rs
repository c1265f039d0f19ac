//! Shared-secret authorization store
//!
//! Requests present a token in the `X-Secret` header. The token is looked up
//! in a read-only key-value store; the stored value decides whether the
//! request may proceed (see [`is_allowed`]).

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use geoip_edge_sdk::HandlerError;
use thiserror::Error;

use crate::config::AppConfig;

/// Header carrying the shared secret
pub const SECRET_HEADER: &str = "X-Secret";

/// Default store name
pub const DEFAULT_STORE_NAME: &str = "geoip_auth";

/// Errors raised by an auth store backend
#[derive(Error, Debug)]
pub enum AuthStoreError {
    #[error("auth store {store} unavailable: {reason}")]
    Unavailable { store: String, reason: String },
}

impl From<AuthStoreError> for HandlerError {
    fn from(err: AuthStoreError) -> Self {
        HandlerError::AuthStoreError(err.to_string())
    }
}

/// Asynchronous, read-only key lookup
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Fetch the value stored for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, AuthStoreError>;

    /// Store name (for logs)
    fn name(&self) -> &str;
}

/// Decide whether a stored value grants access.
///
/// Missing keys and false-equivalent values (`""`, `false`, `0`, `no`, `off`,
/// case-insensitive, surrounding whitespace ignored) deny.
///
/// Stricter than a plain truthiness check on the stored string: entries
/// migrated from an edge config store that hold `"false"`, `"0"`, `"no"` or
/// `"off"` used to grant access and now deny it.
pub fn is_allowed(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None => false,
        Some(v) => !(v.is_empty()
            || ["false", "0", "no", "off"]
                .iter()
                .any(|f| v.eq_ignore_ascii_case(f))),
    }
}

/// Named, read-only string map.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    name: String,
    entries: HashMap<String, String>,
}

impl ConfigStore {
    /// Create an empty store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Builder pattern: add an entry
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Load entries from a JSON object of string values:
    /// `{"s3cr3t": "true", "revoked": "false"}`
    pub fn from_file(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let entries: HashMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Self {
            name: name.into(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl AuthStore for ConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthStoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build the auth store described by the configuration, if one is configured.
pub fn store_from_config(config: &AppConfig) -> Result<Option<Arc<dyn AuthStore>>> {
    let Some(ref path) = config.auth_store_path else {
        return Ok(None);
    };
    let store = ConfigStore::from_file(config.auth_store_name.clone(), path)
        .with_context(|| format!("failed to load auth store {}", config.auth_store_name))?;
    tracing::info!(
        entries = store.len(),
        "Auth store {} loaded from {}",
        store.name(),
        path.display()
    );
    Ok(Some(Arc::new(store)))
}
