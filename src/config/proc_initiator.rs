use crate::config::settings::LoggingConfig;
use crate::config::stores::ServiceConfig;

pub fn initiate_default_values(mut config: ServiceConfig) -> ServiceConfig {
    if config.settings.logging.is_none() {
        config.settings.logging = Some(LoggingConfig::default());
    }

    // propagate store name to backend key
    for (name, store) in config.stores.iter_mut() {
        if store.key.is_empty() {
            store.key = name.to_owned();
        }
    }

    config
}
