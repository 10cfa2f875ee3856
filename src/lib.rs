//! # Perceptual Dedup
//!
//! Finds visually duplicate images with a difference hash (dHash).
//!
//! ## How It Works
//! - Every image is reduced to a small grayscale grid and turned into a
//!   fingerprint of horizontal brightness gradients
//! - Fingerprints within a Hamming distance threshold are clustered into
//!   duplicate groups
//! - Files are only read, never modified
//!
//! ## Architecture
//! - `core` - The detection engine (UI-agnostic)
//! - `events` - Event-driven progress reporting
//! - `error` - User-friendly error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DedupError, Result};

/// Initialize tracing for the application
///
/// Called by the binary entry point; the library never installs a
/// subscriber itself. `RUST_LOG` wins when set, otherwise `verbose`
/// picks `debug` over `warn`. Output goes to stderr so JSON results on
/// stdout stay clean.
pub fn init_tracing(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
