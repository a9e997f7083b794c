mod app;
mod args;
mod config;
mod engine;
mod entry;
mod error;
mod http;
mod logger;
mod metrics;
mod shutdown;
mod shutdown_handlers;

#[cfg(test)]
mod test_support;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
