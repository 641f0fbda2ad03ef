pub mod parser;
pub mod spec;

pub use parser::{parse_ttl, parse_ttl_text, TtlUnit};
pub use spec::TtlSpec;
