//! Snapshot type sent from the audio thread to the UI
//!
//! `Copy` and fixed-size so pushing it from the driver never allocates.

use minifm::{synth::VoiceSnapshot, FmSynth, MAX_VOICES};

#[derive(Clone, Copy, Debug, Default)]
pub struct MonitorFrame {
    pub voices: [VoiceSnapshot; MAX_VOICES],
    pub volume: f32,
    pub max_notes: u8,
}

impl MonitorFrame {
    pub fn capture(synth: &FmSynth) -> Self {
        Self {
            voices: synth.snapshot(),
            volume: synth.volume(),
            max_notes: synth.max_notes(),
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }
}
