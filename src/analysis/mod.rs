//! Analysis modules.
//!
//! The aggregator owns the molecule table; the pipeline drives detection
//! and catalog lookups over every window.

pub mod aggregator;
pub mod pipeline;

pub use aggregator::*;
pub use pipeline::identify_lines;
