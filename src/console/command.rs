use serde_json::Value;
use thiserror::Error;

use crate::ttl::TtlSpec;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },
    #[error("invalid value '{0}', expected JSON")]
    InvalidValue(String),
    #[error("invalid ttl '{0}'")]
    InvalidTtl(String),
}

/// One console line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `get <store>`
    Get(String),
    /// `set <store> <json>`
    Set { store: String, value: Option<Value> },
    /// `set-ttl <store> <ttl|-> <json>`
    SetTtl {
        store: String,
        ttl: Option<TtlSpec>,
        value: Option<Value>,
    },
    /// `expire <store> [ttl]`
    Expire { store: String, ttl: Option<TtlSpec> },
    /// `inspect <store>`
    Inspect(String),
    /// `token [value]`
    Token(Option<String>),
    /// `status <code>`, feeds a response status to the auth guard
    Status(u16),
    /// `sleep <ms>`
    Sleep(u64),
    Metrics,
    Quit,
}

const USAGE_STORE: &str = "<store>";
const USAGE_SET: &str = "<store> <json>";
const USAGE_SET_TTL: &str = "<store> <ttl|-> <json>";
const USAGE_EXPIRE: &str = "<store> [ttl]";
const USAGE_STATUS: &str = "<http status code>";
const USAGE_SLEEP: &str = "<milliseconds>";

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (name, rest) = split_word(line);

        match name {
            "" => Err(CommandError::Empty),
            "get" => Ok(Command::Get(store_arg("get", rest, USAGE_STORE)?)),
            "inspect" => Ok(Command::Inspect(store_arg("inspect", rest, USAGE_STORE)?)),
            "set" => {
                let (store, value) = split_word(rest);
                if store.is_empty() || value.is_empty() {
                    return Err(CommandError::Usage { command: "set", expected: USAGE_SET });
                }
                Ok(Command::Set {
                    store: store.to_owned(),
                    value: parse_value(value)?,
                })
            }
            "set-ttl" => {
                let (store, rest) = split_word(rest);
                let (ttl, value) = split_word(rest);
                if store.is_empty() || ttl.is_empty() || value.is_empty() {
                    return Err(CommandError::Usage { command: "set-ttl", expected: USAGE_SET_TTL });
                }
                Ok(Command::SetTtl {
                    store: store.to_owned(),
                    ttl: parse_ttl_arg(ttl)?,
                    value: parse_value(value)?,
                })
            }
            "expire" => {
                let (store, ttl) = split_word(rest);
                if store.is_empty() {
                    return Err(CommandError::Usage { command: "expire", expected: USAGE_EXPIRE });
                }
                let ttl = if ttl.is_empty() { None } else { parse_ttl_arg(ttl)? };
                Ok(Command::Expire { store: store.to_owned(), ttl })
            }
            "token" => Ok(Command::Token((!rest.is_empty()).then(|| rest.to_owned()))),
            "status" => rest
                .parse::<u16>()
                .map(Command::Status)
                .map_err(|_| CommandError::Usage { command: "status", expected: USAGE_STATUS }),
            "sleep" => rest
                .parse::<u64>()
                .map(Command::Sleep)
                .map_err(|_| CommandError::Usage { command: "sleep", expected: USAGE_SLEEP }),
            "metrics" => Ok(Command::Metrics),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_owned())),
        }
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn store_arg(command: &'static str, rest: &str, expected: &'static str) -> Result<String, CommandError> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(CommandError::Usage { command, expected });
    }
    Ok(rest.to_owned())
}

/// JSON value; `null` clears the store
fn parse_value(raw: &str) -> Result<Option<Value>, CommandError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(CommandError::InvalidValue(raw.to_owned())),
    }
}

/// `-` keeps the current ttl, `never`/`null` makes the value permanent
fn parse_ttl_arg(raw: &str) -> Result<Option<TtlSpec>, CommandError> {
    match raw {
        "-" => Ok(None),
        "never" => Ok(Some(TtlSpec::Never)),
        _ => serde_yaml::from_str::<TtlSpec>(raw)
            .map(Some)
            .map_err(|_| CommandError::InvalidTtl(raw.to_owned())),
    }
}
