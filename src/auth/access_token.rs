use std::cell::OnceCell;
use std::rc::Rc;

use base64::Engine;
use chrono::{DateTime, Utc};
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backend::StorageBackend;
use crate::cache::{ExpiringStore, StoreOptions, WriteOutcome};
use crate::config::settings::AuthConfig;
use crate::errors::StoreError;
use crate::ttl::TtlSpec;

// jwt token
#[derive(Debug, Deserialize)]
struct JwtClaims {
    exp: i64,
}

/// Shared bearer token, built on first use
///
/// One slot is created at startup and handed to whoever needs the token;
/// the underlying [`ExpiringStore`] is only constructed the first time it is
/// touched.
pub struct AccessTokenSlot {
    key: String,
    backend: Rc<dyn StorageBackend>,
    options: StoreOptions,
    store: OnceCell<ExpiringStore<String>>,
}

impl AccessTokenSlot {
    /// `options.expires` is the TTL used for tokens that carry no `exp` claim.
    pub fn new(key: impl Into<String>, backend: Rc<dyn StorageBackend>, options: StoreOptions) -> Self {
        Self {
            key: key.into(),
            backend,
            options,
            store: OnceCell::new(),
        }
    }

    pub fn from_config(config: &AuthConfig, backend: Rc<dyn StorageBackend>, options: StoreOptions) -> Self {
        Self::new(
            config.token_key.clone(),
            backend,
            options.with_expires(config.expires.clone()),
        )
    }

    pub fn store(&self) -> Result<&ExpiringStore<String>, StoreError> {
        if let Some(store) = self.store.get() {
            return Ok(store);
        }

        debug!(key = %self.key, "initializing access token store");
        let store = ExpiringStore::new(
            self.key.clone(),
            None,
            Some(Rc::clone(&self.backend)),
            self.options.clone(),
        )?;
        Ok(self.store.get_or_init(|| store))
    }

    pub fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.store()?.get())
    }

    /// Store `token`, expiring at its JWT `exp` claim when it has one.
    pub fn store_token(&self, token: &str) -> Result<WriteOutcome, StoreError> {
        let ttl = jwt_expiration(token)
            .map(TtlSpec::Until)
            .unwrap_or_else(|| self.options.expires.clone());

        Ok(self.store()?.set_with_ttl(Some(token.to_owned()), Some(ttl)))
    }

    pub fn clear(&self) -> Result<WriteOutcome, StoreError> {
        Ok(self.store()?.set(None))
    }

    /// Insert `Authorization: Bearer <token>` when a live token exists.
    pub fn authorize(&self, headers: &mut HeaderMap) -> Result<bool, StoreError> {
        let Some(token) = self.token()? else {
            return Ok(false);
        };

        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "stored token is not a valid header value");
                Ok(false)
            }
        }
    }
}

/// `exp` claim of a JWT, `None` for anything that is not a decodable JWT
pub fn jwt_expiration(token: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .inspect_err(|e| debug!("jwt payload base64 decode error: {}", e))
        .ok()?;

    let claims = serde_json::from_slice::<JwtClaims>(&decoded)
        .inspect_err(|e| debug!("invalid JWT payload: {}", e))
        .ok()?;

    DateTime::from_timestamp(claims.exp, 0)
}
