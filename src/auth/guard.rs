use std::rc::Rc;

use http::StatusCode;
use tracing::{info, warn};

use crate::auth::access_token::AccessTokenSlot;
use crate::config::settings::AuthConfig;

/// Moves the user somewhere else, e.g. a router push
pub trait Navigator {
    fn navigate(&self, route: &str);
}

/// Surfaces a message to the user
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Reacts to authorization failures on outgoing requests
pub struct AuthGuard<N, M> {
    tokens: Rc<AccessTokenSlot>,
    navigator: N,
    notifier: M,
    login_route: String,
    message: String,
}

impl<N: Navigator, M: Notifier> AuthGuard<N, M> {
    pub fn new(tokens: Rc<AccessTokenSlot>, navigator: N, notifier: M, config: &AuthConfig) -> Self {
        Self {
            tokens,
            navigator,
            notifier,
            login_route: config.login_route.clone(),
            message: config.message.clone(),
        }
    }

    /// Returns `true` when `status` was an authorization failure and the
    /// token was dropped, the user redirected and notified.
    pub fn on_response(&self, status: StatusCode) -> bool {
        if status != StatusCode::UNAUTHORIZED {
            return false;
        }

        info!(status = %status, route = %self.login_route, "request unauthorized, redirecting to login");
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "failed to clear access token");
        }
        self.navigator.navigate(&self.login_route);
        self.notifier.notify(&self.message);
        true
    }
}

impl<F: Fn(&str)> Navigator for F {
    fn navigate(&self, route: &str) {
        self(route)
    }
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!(notification = %message, "user notification");
    }
}
