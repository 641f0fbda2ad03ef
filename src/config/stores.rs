use std::collections::BTreeMap;

use serde::Deserialize;

use crate::cache::StoreOptions;
use crate::config::settings::SettingsConfig;
use crate::ttl::TtlSpec;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub stores: BTreeMap<String, StoreConfig>,
}

/// ================================
/// Stores
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// Backend key; the store name when omitted.
    /// invariant: unique across stores and distinct from the auth token key
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub initial: Option<serde_json::Value>,
    #[serde(default)]
    pub expires: TtlSpec,
    #[serde(default)]
    pub update_timestamp: bool,
}

impl StoreConfig {
    pub fn options(&self) -> StoreOptions {
        StoreOptions::default()
            .with_expires(self.expires.clone())
            .with_update_timestamp(self.update_timestamp)
    }
}
