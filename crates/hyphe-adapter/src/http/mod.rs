/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod public;
pub mod trade;

pub use error::{ErrorKind, HypheError, Result, TOO_MANY_REQUESTS};

pub use client::{ClientConfig, HypheClient};
