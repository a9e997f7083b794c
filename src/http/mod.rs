//! Request execution: client setup, identity headers and outcome
//! classification.
mod client;
mod executor;
mod identity;


pub use executor::RequestExecutor;
pub use identity::{IdentityGenerator, USER_AGENTS, random_payload};
