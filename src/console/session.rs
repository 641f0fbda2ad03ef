use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use http::StatusCode;
use serde_json::Value;
use tracing::info;

use crate::auth::{AccessTokenSlot, AuthGuard, Navigator, Notifier};
use crate::backend::StorageBackend;
use crate::cache::{ExpiringStore, StoreOptions};
use crate::config::ServiceConfig;
use crate::console::command::Command;
use crate::helpers::time::Clock;
use crate::observability::metrics::get_metrics;

/// What the caller should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Sleep(Duration),
    Quit,
}

/// Every configured store plus the access token, driven by console commands
pub struct Session<N, M> {
    stores: BTreeMap<String, ExpiringStore<Value>>,
    tokens: Rc<AccessTokenSlot>,
    guard: AuthGuard<N, M>,
}

impl<N: Navigator, M: Notifier> Session<N, M> {
    pub fn from_config(
        config: &ServiceConfig,
        backend: Rc<dyn StorageBackend>,
        clock: Rc<dyn Clock>,
        navigator: N,
        notifier: M,
    ) -> Result<Self> {
        let mut stores = BTreeMap::new();
        for (name, store_config) in &config.stores {
            let store = ExpiringStore::new(
                store_config.key.clone(),
                store_config.initial.clone(),
                Some(Rc::clone(&backend)),
                store_config.options().with_clock(Rc::clone(&clock)),
            )
            .map_err(|e| anyhow!("store '{}': {}", name, e))?;

            let store_name = name.clone();
            store.subscribe(move |value| {
                info!(store = %store_name, value = ?value, "store changed");
            });
            stores.insert(name.clone(), store);
        }

        let tokens = Rc::new(AccessTokenSlot::from_config(
            &config.settings.auth,
            backend,
            StoreOptions::default().with_clock(clock),
        ));
        let guard = AuthGuard::new(Rc::clone(&tokens), navigator, notifier, &config.settings.auth);

        Ok(Self { stores, tokens, guard })
    }

    pub fn store(&self, name: &str) -> Result<&ExpiringStore<Value>> {
        self.stores
            .get(name)
            .ok_or_else(|| anyhow!("unknown store '{}'", name))
    }

    pub fn tokens(&self) -> &Rc<AccessTokenSlot> {
        &self.tokens
    }

    pub fn execute(&self, command: Command) -> Result<Reply> {
        let text = match command {
            Command::Get(name) => render(self.store(&name)?.get().as_ref()),
            Command::Set { store, value } => self.store(&store)?.set(value).as_str().to_owned(),
            Command::SetTtl { store, ttl, value } => {
                self.store(&store)?.set_with_ttl(value, ttl).as_str().to_owned()
            }
            Command::Expire { store, ttl } => {
                if self.store(&store)?.update_expiry(ttl) {
                    "ok".to_owned()
                } else {
                    "rejected".to_owned()
                }
            }
            Command::Inspect(name) => {
                let store = self.store(&name)?;
                format!(
                    "key={} ttl={} expires_at={} expired={}",
                    store.key(),
                    store.ttl(),
                    store
                        .expires_at_millis()
                        .map_or_else(|| "never".to_owned(), |ms| ms.to_string()),
                    store.is_expired()
                )
            }
            Command::Token(None) => match self.tokens.token()? {
                Some(token) => token,
                None => "null".to_owned(),
            },
            Command::Token(Some(token)) => self.tokens.store_token(&token)?.as_str().to_owned(),
            Command::Status(code) => {
                let status = StatusCode::from_u16(code)?;
                if self.guard.on_response(status) {
                    "unauthorized".to_owned()
                } else {
                    "ignored".to_owned()
                }
            }
            Command::Sleep(ms) => return Ok(Reply::Sleep(Duration::from_millis(ms))),
            Command::Metrics => get_metrics().encode_text()?,
            Command::Quit => return Ok(Reply::Quit),
        };

        Ok(Reply::Text(text))
    }
}

fn render(value: Option<&Value>) -> String {
    value.map_or_else(|| "null".to_owned(), Value::to_string)
}
