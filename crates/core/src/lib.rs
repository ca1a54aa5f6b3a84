//! # scout-core
//!
//! Shared plumbing for the Scout position prediction service: layered
//! configuration and the logging setup used by every binary.

pub mod config;
pub mod logging;
