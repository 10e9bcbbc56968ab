//! Terminal rendering of run statistics.
//!
//! The exported JSON is the real output; this is what `--stats` prints to
//! stderr once the run is over.

mod summary;

pub use summary::{Colorizer, RunSummary};
