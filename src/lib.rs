//! # Property Visual Search
//!
//! Finds property listings whose photos look like a picture you already have.
//!
//! ## How it works
//! - Every listing photo is fingerprinted once (pHash, dominant colors, aspect ratio)
//! - A query image is fingerprinted the same way and scored against the index
//! - Each matching property is reported once, with a plain-language explanation
//!
//! ## Architecture
//! - `core` - Feature extraction, scoring, indexing and search
//! - `events` - Progress reporting over channels
//! - `error` - Error types
//! - `cli` - Command-line interface

pub mod core;
pub mod error;
pub mod events;

pub use error::{Result, VisualSearchError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
