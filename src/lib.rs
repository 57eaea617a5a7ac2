//! Sceneloom - prompt-to-mezzanine video production pipeline.
//!
//! This library crate exposes the core functionality for integration testing.

pub mod batch;
pub mod clients;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod store;
pub mod transcode;

pub use error::{Error, Result};
