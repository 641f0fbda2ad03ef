use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ================================
/// Time-to-live specification
/// ================================
///
/// Accepted forms (untagged in YAML/JSON):
/// - `null`                    → never expires
/// - `1500`                    → milliseconds from the moment it is established
/// - `"2026-01-01T00:00:00Z"`  → absolute instant
/// - `"10s"`, `"1d"`, `"3M"`   → `<integer><unit>` from the moment it is established
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TtlSpec {
    #[default]
    Never,
    Millis(u64),
    // must stay ahead of `Text`: untagged variants are tried in order
    Until(DateTime<Utc>),
    Text(String),
}

impl fmt::Display for TtlSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtlSpec::Never => f.write_str("never"),
            TtlSpec::Millis(ms) => write!(f, "{ms}"),
            TtlSpec::Until(at) => write!(f, "{}", at.to_rfc3339()),
            TtlSpec::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for TtlSpec {
    fn from(ms: u64) -> Self {
        TtlSpec::Millis(ms)
    }
}

impl From<&str> for TtlSpec {
    fn from(text: &str) -> Self {
        TtlSpec::Text(text.to_owned())
    }
}

impl From<String> for TtlSpec {
    fn from(text: String) -> Self {
        TtlSpec::Text(text)
    }
}

impl From<DateTime<Utc>> for TtlSpec {
    fn from(at: DateTime<Utc>) -> Self {
        TtlSpec::Until(at)
    }
}
