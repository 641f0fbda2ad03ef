// tests/common/mod.rs
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::{MemoryBackend, StorageBackend};
use crate::cache::{ExpiringStore, StoreOptions};
use crate::errors::StoreError;
use crate::helpers::time::ManualClock;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
}

pub fn manual_clock() -> ManualClock {
    ManualClock::new(t0())
}

/// Memory backend that counts every call it receives
#[derive(Default)]
pub struct CountingBackend {
    inner: MemoryBackend,
    pub gets: Cell<usize>,
    pub sets: Cell<usize>,
    pub removes: Cell<usize>,
}

impl StorageBackend for CountingBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.gets.set(self.gets.get() + 1);
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.sets.set(self.sets.get() + 1);
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.removes.set(self.removes.get() + 1);
        self.inner.remove_item(key)
    }
}

/// Collects everything passed to the error handler
pub fn error_sink() -> (Rc<RefCell<Vec<String>>>, impl Fn(&StoreError) + 'static) {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    (errors, move |e: &StoreError| sink.borrow_mut().push(e.kind().to_string()))
}

pub fn build_store<T>(
    key: &str,
    initial: Option<T>,
    backend: Rc<dyn StorageBackend>,
    clock: &ManualClock,
    options: StoreOptions,
) -> ExpiringStore<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    ExpiringStore::new(key, initial, Some(backend), options.with_clock(Rc::new(clock.clone())))
        .expect("store must build")
}
