//! # Expiring Store Library
//!
//! Reactive key-value cells layered over a pluggable persistence backend,
//! with lazily enforced time-to-live and bearer token plumbing on top.
//!
//! Modules:
//! - `ttl` — ttl specifications and their resolution into expiry instants
//! - `cache` — expiry bookkeeping, the reactive cell and the store facade
//! - `backend` — persistence capability (memory, json file)
//! - `auth` — access token slot and authorization failure guard
//! - `config` — YAML configuration, defaults and validation
//! - `console` — line commands driving the configured stores

pub mod auth;
pub mod backend;
pub mod cache;
pub mod config;
pub mod console;
pub mod errors;
pub mod helpers;
pub mod observability;
#[cfg(test)]
mod tests;
pub mod ttl;
pub mod utils;

pub use crate::cache::{ExpiringStore, StoreOptions, WriteOutcome};
pub use crate::errors::StoreError;
pub use crate::ttl::TtlSpec;
