//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::TesterArgs;
pub use types::HttpMethod;

pub(crate) use defaults::{
    DEFAULT_BODY_SIZE, DEFAULT_CONCURRENCY, DEFAULT_DELAY_MAX, DEFAULT_DELAY_MIN,
    DEFAULT_DURATION_SECS, DEFAULT_REQUEST_TIMEOUT,
};
pub(crate) use parsers::parse_header;
