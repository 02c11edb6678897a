pub mod dsp; // Per-sample primitives: sine table, envelope, FM operator
pub mod engine; // Configuration and the realtime driver loop
pub mod io;
pub mod synth; // Voice pool, instrument bank, control surface

pub use engine::{DriverHandle, SynthConfig, SynthDriver};
pub use synth::{FmSynth, Instrument, SynthMessage, INSTRUMENTS};

/// Voice slots, and also the number of addressable channels.
pub const MAX_VOICES: usize = 8;
/// Stereo frames per buffer handed to the transport.
pub const BUFFER_SIZE: usize = 64;
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const MAX_BLOCK_SIZE: usize = 2048;
/// Floor for envelope segment times; keeps the per-sample divisions finite.
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
