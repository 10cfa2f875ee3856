//! # dupe-scan CLI
//!
//! Command-line interface for the perceptual duplicate finder.
//!
//! ## Usage
//! ```bash
//! dupe-scan scan ~/Photos --threshold 5
//! dupe-scan scan ~/Photos --verbose --output json
//! ```

mod cli;

use perceptual_dedup::Result;

fn main() -> Result<()> {
    cli::run()
}
