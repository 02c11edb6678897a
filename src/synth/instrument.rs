#[cfg(feature = "serde")]
use serde::Serialize;

use crate::dsp::envelope::Adsr;

pub const NUM_INSTRUMENTS: usize = 12;

/// One timbre in the bank.
///
/// Field units:
/// - `loudness`: gain numerator, divided by 64 at note-on (64 = unity)
/// - `pitch_offset`: semitones added to the played note
/// - `attack`/`decay`/`release`: seconds
/// - `sustain`: level 0.0-1.0; 0.0 makes the timbre a one-shot
/// - `fm_freq_multiplier`: modulator/carrier ratio in x/256 fixed point
/// - `fm_amp_start`/`fm_amp_end`: modulation index at velocity 0 and 127
/// - `fm_decay`: reserved, not read by the current algorithm
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instrument {
    pub name: &'static str,
    pub loudness: f32,
    pub pitch_offset: f32,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub fm_freq_multiplier: f32,
    pub fm_amp_start: f32,
    pub fm_amp_end: f32,
    pub fm_decay: f32,
}

impl Instrument {
    pub fn envelope(&self) -> Adsr {
        Adsr::new(self.attack, self.decay, self.sustain, self.release)
    }

    /// One-shot timbres ignore note-off and run their envelope to the end.
    pub fn is_one_shot(&self) -> bool {
        self.sustain <= 0.0
    }

    /// Modulation index for a normalized velocity, interpolated between the endpoints.
    pub fn modulation_index(&self, velocity: f32) -> f32 {
        self.fm_amp_start + (self.fm_amp_end - self.fm_amp_start) * velocity
    }

    /// Voice gain for a normalized velocity.
    pub fn amplitude(&self, velocity: f32) -> f32 {
        self.loudness * velocity / 64.0
    }
}

macro_rules! instrument {
    ($name:literal, $loud:expr, $pitch:expr, $a:expr, $d:expr, $s:expr, $r:expr,
     $ratio:expr, $amp_start:expr, $amp_end:expr, $fm_decay:expr) => {
        Instrument {
            name: $name,
            loudness: $loud,
            pitch_offset: $pitch,
            attack: $a,
            decay: $d,
            sustain: $s,
            release: $r,
            fm_freq_multiplier: $ratio,
            fm_amp_start: $amp_start,
            fm_amp_end: $amp_end,
            fm_decay: $fm_decay,
        }
    };
}

/// The built-in bank, indexed by program number.
#[rustfmt::skip]
pub static INSTRUMENTS: [Instrument; NUM_INSTRUMENTS] = [
    //           name          loud  pitch  attack decay sus  release ratio   start   end    fm_decay
    instrument!("piano",       57.6,   0.0, 0.05,  0.3,  0.6, 0.5,    256.0,  128.0,  51.2, 102.4),
    instrument!("xylophone",   51.2,  12.0, 0.01,  0.15, 0.0, 0.2,    768.0,  512.0, 128.0,  25.6),
    instrument!("guitar",      44.8,   0.0, 0.03,  0.4,  0.5, 0.6,    384.0,  256.0,  76.8, 128.0),
    instrument!("cymbal",      38.4,  24.0, 0.001, 0.8,  0.0, 0.4,   1280.0, 1024.0, 256.0, 179.2),
    instrument!("bell",        51.2,  12.0, 0.02,  0.9,  0.0, 0.3,    640.0,  384.0,  51.2, 204.8),
    instrument!("funky",       57.6,   0.0, 0.03,  0.2,  0.7, 0.3,    128.0,  768.0, 256.0,  51.2),
    instrument!("vibraphone",  44.8,  12.0, 0.1,   0.3,  0.6, 0.4,    512.0,  307.2, 102.4, 153.6),
    instrument!("gong",        38.4,  24.0, 0.01,  1.0,  0.0, 0.5,   1792.0, 1280.0, 256.0, 230.4),
    instrument!("violin",      51.2,   0.0, 0.2,   0.1,  0.9, 0.6,    256.0,   76.8,  25.6,  76.8),
    instrument!("bass",        64.0, -12.0, 0.05,  0.2,  0.8, 0.4,    128.0,  128.0,  51.2,  76.8),
    instrument!("trumpet",     57.6,   0.0, 0.08,  0.2,  0.8, 0.3,    307.2,  256.0, 128.0,  51.2),
    instrument!("harmonica",   51.2,   0.0, 0.04,  0.2,  0.7, 0.3,    384.0,  204.8,  76.8, 102.4),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_respects_parameter_ranges() {
        for instr in &INSTRUMENTS {
            assert!((0.0..=1.0).contains(&instr.sustain), "{}", instr.name);
            assert!(instr.attack > 0.0 && instr.decay > 0.0 && instr.release > 0.0);
            assert!(instr.loudness <= 64.0, "{} louder than unity", instr.name);
        }
    }

    #[test]
    fn percussive_timbres_are_one_shots() {
        let one_shots: Vec<_> = INSTRUMENTS
            .iter()
            .filter(|i| i.is_one_shot())
            .map(|i| i.name)
            .collect();
        assert_eq!(one_shots, ["xylophone", "cymbal", "bell", "gong"]);
    }

    #[test]
    fn velocity_interpolates_modulation_index() {
        let piano = &INSTRUMENTS[0];
        assert_eq!(piano.modulation_index(0.0), 128.0);
        assert!((piano.modulation_index(1.0) - 51.2).abs() < 1e-4);
        assert!((piano.amplitude(1.0) - 0.9).abs() < 1e-6);
    }
}
