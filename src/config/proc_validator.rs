//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * logging level
//!   * backend path
//!   * auth token key and login route
//!   * every ttl parses
//!   * backend keys are unique (one store per key)

use std::collections::HashMap;

use chrono::Utc;
use tracing::{error, info};

use crate::config::settings::{BackendConfig, SettingsConfig};
use crate::config::stores::{ServiceConfig, StoreConfig};
use crate::ttl::{parse_ttl, TtlSpec};

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);

    if cfg.stores.is_empty() {
        errors.push("config: 'stores' is empty; at least one store required".to_string());
    }

    // backend key -> owner
    let mut keys: HashMap<&str, String> = HashMap::new();
    keys.insert(cfg.settings.auth.token_key.as_str(), "settings.auth".to_string());

    for (name, store) in &cfg.stores {
        validate_store(name, store, &mut errors);

        if let Some(prev) = keys.insert(store.key.as_str(), format!("stores.{}", name)) {
            errors.push(format!(
                "{} and stores.{} both use backend key '{}'; keys must be unique",
                prev, name, store.key
            ));
        }
    }

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }

    if let BackendConfig::File { path } = &settings.backend {
        if path.trim().is_empty() {
            errors.push("settings.backend.path cannot be empty for a file backend".to_string());
        }
    }

    let auth = &settings.auth;
    if auth.token_key.trim().is_empty() {
        errors.push("settings.auth.token_key cannot be empty".to_string());
    }
    if !auth.login_route.starts_with('/') {
        errors.push(format!(
            "settings.auth.login_route '{}' must start with '/'",
            auth.login_route
        ));
    }
    validate_ttl("settings.auth.expires", &auth.expires, errors);
}

/// STORE BASICS
fn validate_store(name: &str, store: &StoreConfig, errors: &mut Vec<String>) {
    if store.key.trim().is_empty() {
        errors.push(format!("stores.{}: key cannot be empty", name));
    }
    validate_ttl(&format!("stores.{}.expires", name), &store.expires, errors);
}

fn validate_ttl(path: &str, spec: &TtlSpec, errors: &mut Vec<String>) {
    if let Err(e) = parse_ttl(spec, Utc::now()) {
        errors.push(format!("{}: {}", path, e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::proc_loader::parse_config_unchecked;

    #[test]
    fn valid_config_passes() {
        let cfg = parse_config_unchecked(
            r#"
stores:
  lang: { initial: zh-CN, expires: 10s }
  theme: { initial: dark }
"#,
        )
        .unwrap();
        assert!(validate_service_config(&cfg).is_ok());
    }

    #[test]
    fn every_issue_is_reported() {
        let cfg = parse_config_unchecked(
            r#"
settings:
  logging: { level: loud }
  backend: { type: file, path: "" }
  auth: { token_key: shared, login_route: login }
stores:
  lang: { expires: 10x }
  other: { key: shared }
"#,
        )
        .unwrap();

        let errors = validate_service_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 5, "{errors:#?}");
        assert!(errors.iter().any(|e| e.contains("settings.logging.level")));
        assert!(errors.iter().any(|e| e.contains("settings.backend.path")));
        assert!(errors.iter().any(|e| e.contains("login_route")));
        assert!(errors.iter().any(|e| e.contains("stores.lang.expires") && e.contains("10x")));
        assert!(errors.iter().any(|e| e.contains("backend key 'shared'")));
    }

    #[test]
    fn empty_stores_are_rejected() {
        let cfg = parse_config_unchecked("stores: {}").unwrap();
        let errors = validate_service_config(&cfg).unwrap_err();
        assert!(errors[0].contains("'stores' is empty"));
    }
}
