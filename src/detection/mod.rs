//! Peak detection.
//!
//! A peak is any sample whose flux reaches a multiple of the spectrum's
//! flux standard deviation.

pub mod peaks;

pub use peaks::*;
