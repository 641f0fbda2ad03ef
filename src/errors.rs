use thiserror::Error;

/// Errors raised by the expiring store.
///
/// None of them are fatal: everything except `EmptyKey` is routed through the
/// store's `on_error` callback and the cell keeps its last well-defined state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid ttl format '{spec}', expected <integer><unit> (ms, s, m, h, d, w, M, y)")]
    InvalidTtlFormat { spec: String },

    #[error("storage backend failed to {op} key '{key}': {source}")]
    Adapter {
        key: String,
        op: AdapterOp,
        #[source]
        source: anyhow::Error,
    },

    #[error("value under key '{key}' does not round-trip: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store key must not be empty")]
    EmptyKey,
}

impl StoreError {
    pub fn invalid_ttl(spec: impl Into<String>) -> Self {
        StoreError::InvalidTtlFormat { spec: spec.into() }
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::InvalidTtlFormat { .. } => "invalid_ttl",
            StoreError::Adapter { .. } => "adapter",
            StoreError::Serialization { .. } => "serialization",
            StoreError::EmptyKey => "empty_key",
        }
    }
}

/// Backend operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterOp {
    Get,
    Set,
    Remove,
}

impl std::fmt::Display for AdapterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            AdapterOp::Get => "get",
            AdapterOp::Set => "set",
            AdapterOp::Remove => "remove",
        };
        f.write_str(op)
    }
}
