use std::rc::Rc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::{MemoryBackend, StorageBackend};
use crate::cache::cell::{ErrorHandler, ExpiringCell, SubscriptionId, WriteOutcome};
use crate::cache::expiry::ExpiryClock;
use crate::errors::StoreError;
use crate::helpers::time::{Clock, SystemClock};
use crate::ttl::TtlSpec;

/// Options recognised by [`ExpiringStore::new`]
///
/// ```rust
/// use expiring_store::cache::store::StoreOptions;
///
/// let options = StoreOptions::default()
///     .with_expires("10s")
///     .with_update_timestamp(true);
/// assert!(options.update_timestamp);
/// ```
#[derive(Clone, Default)]
pub struct StoreOptions {
    /// TTL established at construction (default: never expires)
    pub expires: TtlSpec,
    /// Re-run the TTL on every accepted write
    pub update_timestamp: bool,
    /// Receives every recoverable error (default: `warn!` and continue)
    pub on_error: Option<ErrorHandler>,
    /// Source of "now" (default: wall clock)
    pub clock: Option<Rc<dyn Clock>>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expires(mut self, expires: impl Into<TtlSpec>) -> Self {
        self.expires = expires.into();
        self
    }

    pub fn with_update_timestamp(mut self, update_timestamp: bool) -> Self {
        self.update_timestamp = update_timestamp;
        self
    }

    pub fn with_on_error(mut self, on_error: impl Fn(&StoreError) + 'static) -> Self {
        self.on_error = Some(Rc::new(on_error));
        self
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

fn default_error_handler() -> ErrorHandler {
    Rc::new(|err: &StoreError| {
        warn!(kind = err.kind(), error = %err, "expiring store error");
    })
}

/// Expiring, reactive value bound to one backend key
///
/// ```rust
/// use expiring_store::cache::store::{ExpiringStore, StoreOptions};
///
/// let lang = ExpiringStore::new("lang", Some("zh-CN".to_string()), None, StoreOptions::default())
///     .unwrap();
/// assert_eq!(lang.get().as_deref(), Some("zh-CN"));
///
/// lang.set(Some("en-US".to_string()));
/// assert_eq!(lang.get().as_deref(), Some("en-US"));
/// ```
pub struct ExpiringStore<T> {
    backend: Rc<dyn StorageBackend>,
    clock: Rc<dyn Clock>,
    cell: ExpiringCell<T>,
}

impl<T> ExpiringStore<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    /// Bind `key` on `backend` (in-memory when `None`).
    ///
    /// Fails on an empty key or an `expires` that does not parse.
    pub fn new(
        key: impl Into<String>,
        initial: Option<T>,
        backend: Option<Rc<dyn StorageBackend>>,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let key = key.into();
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let backend: Rc<dyn StorageBackend> =
            backend.unwrap_or_else(|| Rc::new(MemoryBackend::new()));
        let clock: Rc<dyn Clock> = options.clock.unwrap_or_else(|| Rc::new(SystemClock));
        let on_error = options.on_error.unwrap_or_else(default_error_handler);

        let expiry = ExpiryClock::new(options.expires, clock.now())?;
        debug!(key = %key, ttl = %expiry.spec(), expires_at = ?expiry.expires_at(), "store created");

        let cell = ExpiringCell::new(key, None, expiry, options.update_timestamp, on_error);
        cell.hydrate(backend.as_ref(), initial);

        Ok(Self { backend, clock, cell })
    }

    pub fn key(&self) -> &str {
        self.cell.key()
    }

    pub fn get(&self) -> Option<T> {
        self.cell.get(self.backend.as_ref(), self.clock.now())
    }

    pub fn set(&self, value: Option<T>) -> WriteOutcome {
        self.cell.set(self.backend.as_ref(), self.clock.now(), value)
    }

    /// Establish `ttl` (or re-run the current one when `None`), then write.
    pub fn set_with_ttl(&self, value: Option<T>, ttl: Option<TtlSpec>) -> WriteOutcome {
        self.cell
            .set_with_ttl(self.backend.as_ref(), self.clock.now(), value, ttl)
    }

    pub fn update_expiry(&self, ttl: Option<TtlSpec>) -> bool {
        self.cell.update_expiry(self.clock.now(), ttl)
    }

    /// Restart the current TTL from now
    pub fn refresh_expiry(&self) -> bool {
        self.update_expiry(None)
    }

    pub fn is_expired(&self) -> bool {
        self.cell.is_expired()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.cell.expires_at()
    }

    pub fn expires_at_millis(&self) -> Option<i64> {
        self.cell.expires_at_millis()
    }

    pub fn ttl(&self) -> TtlSpec {
        self.cell.ttl()
    }

    pub fn remaining(&self) -> Option<TimeDelta> {
        self.cell.remaining(self.clock.now())
    }

    pub fn subscribe(&self, subscriber: impl Fn(Option<&T>) + 'static) -> SubscriptionId {
        self.cell.subscribe(subscriber)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.cell.unsubscribe(id)
    }

    pub fn backend(&self) -> &Rc<dyn StorageBackend> {
        &self.backend
    }
}
