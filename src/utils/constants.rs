//! Shared constants

pub const DEFAULT_CONFIG_PATH: &str = "expiring-store.yaml";
pub const PROMPT_HINT: &str = "commands: get | set | set-ttl | expire | inspect | token | status | sleep | metrics | quit";
