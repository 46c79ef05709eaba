pub mod buffer;
pub mod config;
pub mod detectors;
pub mod error;
pub mod filters;
pub mod io;
pub mod signal;
pub mod synth;

pub use detectors::*;
pub use error::*;
pub use signal::*;
