pub mod cell;
pub mod expiry;
pub mod store;

pub use cell::{ExpiringCell, SubscriptionId, WriteOutcome};
pub use expiry::ExpiryClock;
pub use store::{ExpiringStore, StoreOptions};
