//! HTTP API: the command endpoint and the version endpoint

mod routes;

pub use routes::{router, serve, ApiState};
