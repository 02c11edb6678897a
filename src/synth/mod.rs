// Purpose: voice management, polyphony, control messages
// This layer sits above the dsp primitives and owns all per-voice state

pub mod instrument;
pub mod message;
pub mod pool;
pub mod synth;
pub mod voice;

pub use instrument::{Instrument, INSTRUMENTS, NUM_INSTRUMENTS};
#[cfg(feature = "rtrb")]
pub use message::SynthController;
pub use message::{MessageReceiver, SynthMessage};
pub use pool::VoicePool;
pub use synth::{FmSynth, VoiceSnapshot};
pub use voice::FmVoice;
