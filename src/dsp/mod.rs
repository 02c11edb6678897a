//! Low-level DSP primitives used by the voice pool.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs. They stay focused on the per-sample
//! math; voice bookkeeping lives in [`crate::synth`].

/// Attack/decay/sustain/release envelope state machine.
pub mod envelope;
/// Two-operator FM oscillator.
pub mod fm;
/// Precomputed sine cycle.
pub mod wavetable;

pub use envelope::{Adsr, Envelope, EnvelopeState};
pub use fm::FmOperator;
pub use wavetable::{sine_table, SineTable, SINE_TABLE_SIZE};
