//! Persistence capability the expiring store is layered over.
//!
//! A backend is a flat string-to-string map with interior mutability, the same
//! shape as browser `localStorage`. The store serializes values before handing
//! them over; callers share the backend through `Rc`, and several stores may
//! sit on one backend as long as each owns a distinct key.

use std::rc::Rc;

use anyhow::Result;

use crate::config::settings::BackendConfig;

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

pub fn build_backend(config: &BackendConfig) -> Rc<dyn StorageBackend> {
    match config {
        BackendConfig::Memory => Rc::new(MemoryBackend::new()),
        BackendConfig::File { path } => Rc::new(FileBackend::new(path)),
    }
}
