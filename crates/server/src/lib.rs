//! Scout HTTP service — library interface for integration tests.

pub mod guard;
pub mod server;
