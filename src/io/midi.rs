/// Already-decoded MIDI channel messages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// 14-bit bend, centred on 0 (-8192..=8191).
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

// f = 440 * 2^((n - 69) / 12) rewritten as A * e^(B * n):
//   B = ln(2) / 12, A = 440 * e^(-69 * B) (the frequency of note 0)
const NOTE_ZERO_HZ: f32 = 8.175_799;
const SEMITONE_EXP: f32 = 0.057_762_265;

/// Convert a (possibly fractional) MIDI note number to Hz. A4 = 69 = 440 Hz.
#[inline]
pub fn note_to_freq(note: f32) -> f32 {
    NOTE_ZERO_HZ * (SEMITONE_EXP * note).exp()
}

#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    note_to_freq(note as f32)
}

/// Map a 7-bit bend amount onto whole semitones, -16 at 0 up to +17 at 127.
///
/// Integer math, so 64 lands exactly on 0.
pub fn bend_semitones(amount: u8) -> f32 {
    let amount = amount.min(127) as i32;
    (amount * 33 / 127 - 16) as f32
}
