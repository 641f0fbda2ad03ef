pub mod access_token;
pub mod guard;

pub use access_token::{jwt_expiration, AccessTokenSlot};
pub use guard::{AuthGuard, LogNotifier, Navigator, Notifier};
