//! # Pipeline Module
//!
//! Runs the whole duplicate detection workflow for a list of candidates.
//!
//! ## Pipeline Stages
//! 1. **Fingerprint** - Compute a dHash for every candidate on a worker pool
//! 2. **Cluster** - Group fingerprints within the threshold
//! 3. **Size** - Total the bytes held by each group's duplicates
//!
//! Cancellation during the first stage skips the second entirely.
//!
//! ## Example
//! ```rust,ignore
//! use perceptual_dedup::core::pipeline::{CancellationToken, DuplicateFinder};
//!
//! let finder = DuplicateFinder::builder().threshold(5).build();
//! let result = finder.run(&candidates, &CancellationToken::new())?;
//! ```

mod executor;

pub use crate::core::coordinator::CancellationToken;
pub use executor::{ClusterResult, DuplicateFinder, DuplicateFinderBuilder};
