//! Runtime plumbing around the synth: settings and the producer loop.

pub mod config;
pub mod driver;

pub use config::SynthConfig;
pub use driver::{DriverHandle, SynthDriver};
