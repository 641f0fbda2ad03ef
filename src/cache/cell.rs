use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::StorageBackend;
use crate::cache::expiry::ExpiryClock;
use crate::errors::{AdapterOp, StoreError};
use crate::observability::metrics::get_metrics;
use crate::ttl::TtlSpec;

pub type ErrorHandler = Rc<dyn Fn(&StoreError)>;
pub type Subscriber<T> = Rc<dyn Fn(Option<&T>)>;

/// What happened to a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Value persisted and subscribers notified
    Accepted,
    /// Cell was already expired; the write was dropped
    LockedOut,
    /// Expiry was discovered by this write; the value was cleared instead
    Expired,
    /// Backend or serialization failure; nothing changed
    Failed,
}

impl WriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Accepted => "accepted",
            WriteOutcome::LockedOut => "locked_out",
            WriteOutcome::Expired => "expired",
            WriteOutcome::Failed => "failed",
        }
    }

    pub fn is_accepted(&self) -> bool {
        *self == WriteOutcome::Accepted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

enum ExpiryCheck {
    Unchanged,
    Transitioned,
    // instant elapsed but clearing the backend failed; retried on the next call,
    // reported once per expiry epoch
    Unflushed(StoreError),
}

struct CellState<T> {
    value: Option<T>,
    expiry: ExpiryClock,
}

/// Reactive cell over one backend key
///
/// Expiry is lazy: every `get` and `set` first checks whether the established
/// instant has passed and, if so, clears the backend and flips the cell to
/// expired in the same step. An expired cell drops plain writes until a TTL is
/// re-established through [`ExpiringCell::update_expiry`] or
/// [`ExpiringCell::set_with_ttl`].
///
/// The backend is borrowed per call and never owned by the cell.
pub struct ExpiringCell<T> {
    key: String,
    update_timestamp: bool,
    state: RefCell<CellState<T>>,
    subscribers: RefCell<Vec<(SubscriptionId, Subscriber<T>)>>,
    next_subscription: Cell<u64>,
    unflushed_reported: Cell<bool>,
    on_error: ErrorHandler,
}

impl<T> ExpiringCell<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    pub fn new(
        key: String,
        value: Option<T>,
        expiry: ExpiryClock,
        update_timestamp: bool,
        on_error: ErrorHandler,
    ) -> Self {
        Self {
            key,
            update_timestamp,
            state: RefCell::new(CellState { value, expiry }),
            subscribers: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
            unflushed_reported: Cell::new(false),
            on_error,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted value. An absent key falls back to `initial`, which
    /// is written back; an unreadable one falls back to `initial` untouched.
    pub fn hydrate(&self, backend: &dyn StorageBackend, initial: Option<T>) {
        let value = match backend.get_item(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => Some(value),
                Err(source) => {
                    self.report(StoreError::Serialization {
                        key: self.key.clone(),
                        source,
                    });
                    initial
                }
            },
            Ok(None) => {
                if initial.is_some() {
                    if let Err(err) = self.persist(backend, initial.as_ref()) {
                        self.report(err);
                    }
                }
                initial
            }
            Err(source) => {
                self.report(StoreError::Adapter {
                    key: self.key.clone(),
                    op: AdapterOp::Get,
                    source,
                });
                initial
            }
        };

        self.state.borrow_mut().value = value;
    }

    /// Current value, after the lazy expiry check
    pub fn get(&self, backend: &dyn StorageBackend, now: DateTime<Utc>) -> Option<T> {
        let (value, check) = {
            let mut state = self.state.borrow_mut();
            let check = self.check_expiry(&mut state, backend, now);
            let value = match check {
                ExpiryCheck::Unflushed(_) => None,
                _ => state.value.clone(),
            };
            (value, check)
        };

        get_metrics()
            .store_reads
            .with_label_values(&[self.key.as_str()])
            .inc();
        self.settle(check);
        value
    }

    pub fn set(&self, backend: &dyn StorageBackend, now: DateTime<Utc>, value: Option<T>) -> WriteOutcome {
        let mut state = self.state.borrow_mut();

        if state.expiry.is_expired() {
            drop(state);
            debug!(key = %self.key, "write dropped, cell is expired");
            return self.record(WriteOutcome::LockedOut);
        }

        match self.check_expiry(&mut state, backend, now) {
            ExpiryCheck::Unchanged => {}
            check @ ExpiryCheck::Transitioned => {
                drop(state);
                self.settle(check);
                return self.record(WriteOutcome::Expired);
            }
            check @ ExpiryCheck::Unflushed(_) => {
                drop(state);
                self.settle(check);
                return self.record(WriteOutcome::Failed);
            }
        }

        if let Err(err) = self.persist(backend, value.as_ref()) {
            drop(state);
            self.report(err);
            return self.record(WriteOutcome::Failed);
        }

        state.value = value.clone();
        let refresh = if self.update_timestamp {
            state.expiry.establish(None, now).err()
        } else {
            None
        };
        drop(state);

        debug!(key = %self.key, "value written");
        self.notify(value.as_ref());
        if let Some(err) = refresh {
            self.report(err);
        }
        self.record(WriteOutcome::Accepted)
    }

    /// Establish a new TTL (`None` re-runs the current one) and write `value`.
    ///
    /// This is the only write that can revive an expired cell.
    pub fn set_with_ttl(
        &self,
        backend: &dyn StorageBackend,
        now: DateTime<Utc>,
        value: Option<T>,
        ttl: Option<TtlSpec>,
    ) -> WriteOutcome {
        self.update_expiry(now, ttl);
        self.set(backend, now, value)
    }

    /// Re-establish the TTL. `None` keeps the current specification and only
    /// recomputes the instant from `now`. Returns whether the TTL was accepted.
    pub fn update_expiry(&self, now: DateTime<Utc>, ttl: Option<TtlSpec>) -> bool {
        let result = self.state.borrow_mut().expiry.establish(ttl, now);
        match result {
            Ok(()) => {
                self.unflushed_reported.set(false);
                true
            }
            Err(err) => {
                self.report(err);
                false
            }
        }
    }

    pub fn is_expired(&self) -> bool {
        self.state.borrow().expiry.is_expired()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().expiry.expires_at()
    }

    pub fn expires_at_millis(&self) -> Option<i64> {
        self.state.borrow().expiry.expires_at_millis()
    }

    pub fn ttl(&self) -> TtlSpec {
        self.state.borrow().expiry.spec().clone()
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.state.borrow().expiry.remaining(now)
    }

    /// Register a dependent, called synchronously after every accepted write
    /// and on the transition to expired.
    pub fn subscribe(&self, subscriber: impl Fn(Option<&T>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        let subscriber: Subscriber<T> = Rc::new(subscriber);
        self.subscribers.borrow_mut().push((id, subscriber));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    pub(crate) fn report(&self, err: StoreError) {
        get_metrics()
            .store_errors
            .with_label_values(&[err.kind()])
            .inc();
        (self.on_error)(&err);
    }

    fn check_expiry(
        &self,
        state: &mut CellState<T>,
        backend: &dyn StorageBackend,
        now: DateTime<Utc>,
    ) -> ExpiryCheck {
        if state.expiry.is_expired() || !state.expiry.is_elapsed(now) {
            return ExpiryCheck::Unchanged;
        }

        if let Err(source) = backend.remove_item(&self.key) {
            return ExpiryCheck::Unflushed(StoreError::Adapter {
                key: self.key.clone(),
                op: AdapterOp::Remove,
                source,
            });
        }

        state.expiry.mark_expired();
        state.value = None;
        info!(key = %self.key, expires_at = ?state.expiry.expires_at(), "value expired");
        get_metrics()
            .store_expirations
            .with_label_values(&[self.key.as_str()])
            .inc();
        ExpiryCheck::Transitioned
    }

    // must run with the state borrow released
    fn settle(&self, check: ExpiryCheck) {
        match check {
            ExpiryCheck::Unchanged => {}
            ExpiryCheck::Transitioned => {
                self.unflushed_reported.set(false);
                self.notify(None);
            }
            ExpiryCheck::Unflushed(err) => {
                if self.unflushed_reported.replace(true) {
                    debug!(key = %self.key, error = %err, "expired value still not cleared");
                } else {
                    self.report(err);
                }
            }
        }
    }

    fn persist(&self, backend: &dyn StorageBackend, value: Option<&T>) -> Result<(), StoreError> {
        match value {
            None => backend.remove_item(&self.key).map_err(|source| StoreError::Adapter {
                key: self.key.clone(),
                op: AdapterOp::Remove,
                source,
            }),
            Some(value) => {
                let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialization {
                    key: self.key.clone(),
                    source,
                })?;
                backend.set_item(&self.key, &raw).map_err(|source| StoreError::Adapter {
                    key: self.key.clone(),
                    op: AdapterOp::Set,
                    source,
                })
            }
        }
    }

    fn notify(&self, value: Option<&T>) {
        let subscribers: Vec<Subscriber<T>> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| Rc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            subscriber(value);
        }
    }

    fn record(&self, outcome: WriteOutcome) -> WriteOutcome {
        get_metrics()
            .store_writes
            .with_label_values(&[self.key.as_str(), outcome.as_str()])
            .inc();
        outcome
    }
}
