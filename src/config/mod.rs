pub mod proc_initiator;
pub mod proc_loader;
pub mod proc_validator;
pub mod settings;
pub mod stores;

pub use stores::{ServiceConfig, StoreConfig};
