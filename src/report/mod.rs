//! Report generation modules.
//!
//! Text and JSON summaries of the molecule table, plus the spectra plot.

pub mod generator;
pub mod plot;

pub use generator::*;
pub use plot::{render_spectra, PlotAnnotations};
