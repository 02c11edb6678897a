use log::{debug, trace};

use crate::{
    dsp::{envelope::EnvelopeState, wavetable::{sine_table, SineTable}},
    engine::config::SynthConfig,
    io::{midi::bend_semitones, sink::pack_stereo},
    synth::{
        instrument::{Instrument, INSTRUMENTS},
        message::{MessageReceiver, SynthMessage},
        pool::VoicePool,
    },
    MAX_VOICES,
};

/// The FM engine: voice pool, channel map and global volume.
///
/// Owned by the audio thread. Other threads talk to it through
/// [`SynthMessage`]s, which are applied between buffers by [`FmSynth::process_messages`].
pub struct FmSynth {
    bank: &'static [Instrument],
    pool: VoicePool,
    channel_instruments: [u8; MAX_VOICES],
    volume: f32,
    max_notes: u8,
    table: &'static SineTable,
    sample_rate: f32,
    dt: f32,
}

impl FmSynth {
    pub fn new(config: SynthConfig) -> Self {
        Self::with_bank(config, &INSTRUMENTS)
    }

    /// Use a different fixed bank. An empty bank falls back to the built-in one.
    pub fn with_bank(config: SynthConfig, bank: &'static [Instrument]) -> Self {
        let config = config.sanitized();
        let bank = if bank.is_empty() { &INSTRUMENTS[..] } else { bank };

        Self {
            bank,
            pool: VoicePool::new(),
            channel_instruments: [0; MAX_VOICES],
            volume: 1.0,
            max_notes: MAX_VOICES as u8,
            table: sine_table(),
            sample_rate: config.sample_rate,
            dt: config.time_step(),
        }
    }

    // --- control surface -------------------------------------------------

    pub fn set_instrument(&mut self, channel: u8, instrument: u8) {
        if !valid_channel(channel) || instrument as usize >= self.bank.len() {
            return;
        }
        self.channel_instruments[channel as usize] = instrument;
        debug!(
            "channel {channel} -> instrument {instrument} ({})",
            self.bank[instrument as usize].name
        );
    }

    pub fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        if !valid_channel(channel) || note > 127 {
            return;
        }

        let instrument_index = self.channel_instruments[channel as usize];
        let instrument = self.instrument_at(instrument_index);
        let idx = self.pool.allocate();
        self.pool.voice_mut(idx).start(
            channel,
            note,
            normalize(velocity),
            instrument_index,
            instrument,
        );
        trace!("note on ch {channel} note {note} vel {velocity} -> voice {idx}");
    }

    pub fn note_off(&mut self, channel: u8, note: u8) {
        if !valid_channel(channel) {
            return;
        }

        let bank = self.bank;
        if let Some(voice) = self.pool.find_note(channel, note) {
            let instrument = instrument_in(bank, voice.instrument());
            // One-shots finish their own envelope.
            if !instrument.is_one_shot() {
                voice.release();
                trace!("note off ch {channel} note {note}");
            }
        }
    }

    pub fn all_notes_off(&mut self) {
        for voice in self.pool.iter_mut() {
            voice.silence();
        }
        debug!("all notes off");
    }

    /// Global volume in percent; values above 100 are clamped.
    pub fn set_volume(&mut self, percent: u8) {
        self.volume = percent.min(100) as f32 / 100.0;
        debug!("volume {:.2}", self.volume);
    }

    pub fn alter_vol_note(&mut self, channel: u8, velocity: u8) {
        if !valid_channel(channel) {
            return;
        }

        let instrument = self.instrument_at(self.channel_instruments[channel as usize]);
        if let Some(voice) = self.pool.find_on_channel(channel) {
            voice.amplitude = instrument.amplitude(normalize(velocity));
            trace!("ch {channel} amplitude {:.3}", voice.amplitude);
        }
    }

    pub fn alter_pitch_note(&mut self, channel: u8, amount: u8) {
        if !valid_channel(channel) {
            return;
        }

        let instrument = self.instrument_at(self.channel_instruments[channel as usize]);
        let semitones = bend_semitones(amount);
        if let Some(voice) = self.pool.find_on_channel(channel) {
            voice.retune(instrument, semitones);
            trace!("ch {channel} bend {semitones:+} semitones");
        }
    }

    /// Advertised polyphony ceiling, clamped to 1..=MAX_VOICES. The pool keeps its size.
    pub fn set_max_notes(&mut self, count: u8) -> u8 {
        self.max_notes = count.clamp(1, MAX_VOICES as u8);
        debug!("max notes {}", self.max_notes);
        self.max_notes
    }

    pub fn apply(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::SetInstrument {
                channel,
                instrument,
            } => self.set_instrument(channel, instrument),
            SynthMessage::NoteOn {
                channel,
                note,
                velocity,
            } => self.note_on(channel, note, velocity),
            SynthMessage::NoteOff { channel, note } => self.note_off(channel, note),
            SynthMessage::AllNotesOff => self.all_notes_off(),
            SynthMessage::SetVolume { percent } => self.set_volume(percent),
            SynthMessage::AlterVolume { channel, velocity } => {
                self.alter_vol_note(channel, velocity)
            }
            SynthMessage::AlterPitch { channel, amount } => {
                self.alter_pitch_note(channel, amount)
            }
            SynthMessage::SetMaxNotes { count } => {
                self.set_max_notes(count);
            }
        }
    }

    /// Apply every queued control message, in order.
    pub fn process_messages<R: MessageReceiver + ?Sized>(&mut self, rx: &mut R) {
        while let Some(msg) = rx.pop() {
            self.apply(msg);
        }
    }

    // --- rendering -------------------------------------------------------

    /// Advance every voice by one sample and return the quantized mix.
    #[inline]
    pub fn next_sample(&mut self) -> i16 {
        let (bank, table, dt, volume) = (self.bank, self.table, self.dt, self.volume);

        let mut mix = 0.0f32;
        for voice in self.pool.iter_mut() {
            if voice.is_active() {
                let instrument = instrument_in(bank, voice.instrument());
                mix += voice.render_sample(instrument, table, dt) * volume;
            }
        }

        (mix.clamp(-1.0, 1.0) * 32767.0) as i16
    }

    /// Fill a buffer with packed stereo frames.
    pub fn render_frames(&mut self, frames: &mut [u32]) {
        for frame in frames.iter_mut() {
            *frame = pack_stereo(self.next_sample());
        }
    }

    /// Fill an interleaved buffer with `channels` copies of each mono sample.
    pub fn render_interleaved(&mut self, out: &mut [i16], channels: usize) {
        for frame in out.chunks_mut(channels.max(1)) {
            frame.fill(self.next_sample());
        }
    }

    // --- inspection ------------------------------------------------------

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn channel_instrument(&self, channel: u8) -> Option<u8> {
        self.channel_instruments.get(channel as usize).copied()
    }

    pub fn instrument(&self, index: u8) -> Option<&'static Instrument> {
        self.bank.get(index as usize)
    }

    pub fn bank(&self) -> &'static [Instrument] {
        self.bank
    }

    /// Global volume, 0.0-1.0.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn max_notes(&self) -> u8 {
        self.max_notes
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn time_step(&self) -> f32 {
        self.dt
    }

    /// Copyable per-voice view for meters and displays.
    pub fn snapshot(&self) -> [VoiceSnapshot; MAX_VOICES] {
        let mut out = [VoiceSnapshot::default(); MAX_VOICES];
        for (slot, voice) in out.iter_mut().zip(self.pool.iter()) {
            *slot = VoiceSnapshot {
                active: voice.is_active(),
                state: voice.state(),
                level: voice.level(),
                note: voice.note(),
                channel: voice.channel(),
                instrument: voice.instrument(),
                time_elapsed: voice.time_elapsed(),
            };
        }
        out
    }

    fn instrument_at(&self, index: u8) -> &'static Instrument {
        instrument_in(self.bank, index)
    }
}

/// Allocation-free copy of one voice's state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VoiceSnapshot {
    pub active: bool,
    pub state: EnvelopeState,
    pub level: f32,
    pub note: u8,
    pub channel: u8,
    pub instrument: u8,
    pub time_elapsed: f32,
}

fn valid_channel(channel: u8) -> bool {
    (channel as usize) < MAX_VOICES
}

fn normalize(velocity: u8) -> f32 {
    velocity.min(127) as f32 / 127.0
}

// Indices are checked on the way in; fall back to slot 0 rather than panic.
fn instrument_in(bank: &'static [Instrument], index: u8) -> &'static Instrument {
    bank.get(index as usize).unwrap_or(&bank[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sink::unpack_stereo;

    fn synth() -> FmSynth {
        FmSynth::new(SynthConfig::default())
    }

    fn advance(synth: &mut FmSynth, seconds: f32) {
        let samples = (seconds * synth.sample_rate()).ceil() as usize;
        for _ in 0..samples {
            synth.next_sample();
        }
    }

    #[test]
    fn invalid_indices_are_ignored() {
        let mut s = synth();
        s.set_instrument(MAX_VOICES as u8, 3);
        s.set_instrument(0, INSTRUMENTS.len() as u8);
        assert_eq!(s.channel_instrument(0), Some(0));

        s.note_on(MAX_VOICES as u8, 60, 127);
        s.note_on(0, 128, 127);
        assert_eq!(s.pool().active_count(), 0);

        s.note_off(200, 60);
        s.alter_vol_note(200, 10);
        s.alter_pitch_note(200, 10);
    }

    #[test]
    fn note_on_uses_the_channel_instrument() {
        let mut s = synth();
        s.set_instrument(2, 9);
        s.note_on(2, 69, 127);

        let voice = s.pool().voice(0).unwrap();
        assert_eq!(voice.instrument(), 9);
        assert!((voice.oscillator().carrier_freq - 220.0).abs() < 0.5);
    }

    #[test]
    fn velocity_scales_amplitude_and_index() {
        let mut s = synth();
        s.note_on(0, 60, 0);
        s.note_on(0, 62, 127);

        let soft = s.pool().voice(0).unwrap();
        let hard = s.pool().voice(1).unwrap();
        assert_eq!(soft.amplitude(), 0.0);
        assert_eq!(soft.oscillator().modulation_index, 128.0);
        assert!((hard.amplitude() - 0.9).abs() < 1e-6);
        assert!((hard.oscillator().modulation_index - 51.2).abs() < 1e-3);
    }

    #[test]
    fn piano_reaches_sustain_after_attack_plus_decay() {
        let mut s = synth();
        s.note_on(0, 69, 127);
        // 0.05s attack + 0.3s decay at 44.1kHz.
        for _ in 0..2205 + 13_230 - 1 {
            s.next_sample();
        }
        assert_eq!(s.pool().voice(0).unwrap().state(), EnvelopeState::Decay);
        s.next_sample();

        let voice = s.pool().voice(0).unwrap();
        assert_eq!(voice.state(), EnvelopeState::Sustain);
        assert_eq!(voice.level(), 0.6);
    }

    #[test]
    fn repeated_note_off_releases_each_duplicate() {
        let mut s = synth();
        s.note_on(0, 60, 127);
        s.note_on(0, 60, 127);
        advance(&mut s, 0.01);

        s.note_off(0, 60);
        assert_eq!(s.pool().voice(0).unwrap().state(), EnvelopeState::Release);
        assert_eq!(s.pool().voice(1).unwrap().state(), EnvelopeState::Attack);

        s.note_off(0, 60);
        assert_eq!(s.pool().voice(1).unwrap().state(), EnvelopeState::Release);

        advance(&mut s, 0.6);
        assert_eq!(s.pool().active_count(), 0);
    }

    #[test]
    fn note_off_releases_matching_voice_only() {
        let mut s = synth();
        s.note_on(0, 60, 127);
        s.note_on(0, 64, 127);
        s.note_on(1, 60, 127);
        advance(&mut s, 0.01);

        s.note_off(0, 60);
        assert_eq!(s.pool().voice(0).unwrap().state(), EnvelopeState::Release);
        assert_eq!(s.pool().voice(1).unwrap().state(), EnvelopeState::Attack);
        assert_eq!(s.pool().voice(2).unwrap().state(), EnvelopeState::Attack);
    }

    #[test]
    fn one_shot_ignores_note_off() {
        let mut s = synth();
        s.set_instrument(0, 1); // xylophone
        s.note_on(0, 72, 127);
        advance(&mut s, 0.005);

        s.note_off(0, 72);
        assert_eq!(s.pool().voice(0).unwrap().state(), EnvelopeState::Attack);

        // 0.01 attack + 0.15 decay, then an immediate release from zero.
        advance(&mut s, 0.2);
        let voice = s.pool().voice(0).unwrap();
        assert!(!voice.is_active());
        assert_eq!(voice.state(), EnvelopeState::Idle);
    }

    #[test]
    fn alter_vol_note_rescales_first_voice_on_channel() {
        let mut s = synth();
        s.note_on(3, 60, 127);
        s.note_on(3, 64, 127);
        s.alter_vol_note(3, 0);

        assert_eq!(s.pool().voice(0).unwrap().amplitude(), 0.0);
        assert!(s.pool().voice(1).unwrap().amplitude() > 0.0);
    }

    #[test]
    fn alter_pitch_note_retunes_carrier_and_modulator() {
        let mut s = synth();
        s.set_instrument(0, 2); // guitar, ratio 384/256
        s.note_on(0, 69, 127);

        s.alter_pitch_note(0, 127);
        let osc = *s.pool().voice(0).unwrap().oscillator();
        let expected = crate::io::midi::note_to_freq(69.0 + 17.0);
        assert!((osc.carrier_freq - expected).abs() < 0.01);
        assert!((osc.modulator_freq - expected * 1.5).abs() < 0.01);

        s.alter_pitch_note(0, 64);
        let osc = *s.pool().voice(0).unwrap().oscillator();
        assert!((osc.carrier_freq - 440.0).abs() < 0.5);
    }

    #[test]
    fn set_max_notes_clamps_without_resizing() {
        let mut s = synth();
        assert_eq!(s.set_max_notes(0), 1);
        assert_eq!(s.set_max_notes(50), MAX_VOICES as u8);
        assert_eq!(s.set_max_notes(4), 4);

        for note in 60..60 + MAX_VOICES as u8 {
            s.note_on(0, note, 127);
        }
        assert_eq!(s.pool().active_count(), MAX_VOICES);
    }

    #[test]
    fn volume_is_clamped_to_percent() {
        let mut s = synth();
        s.set_volume(250);
        assert_eq!(s.volume(), 1.0);
        s.set_volume(25);
        assert_eq!(s.volume(), 0.25);
    }

    #[test]
    fn messages_apply_in_order() {
        let mut s = synth();
        let mut queue: std::collections::VecDeque<_> = [
            SynthMessage::SetInstrument {
                channel: 1,
                instrument: 9,
            },
            SynthMessage::NoteOn {
                channel: 1,
                note: 48,
                velocity: 100,
            },
            SynthMessage::SetVolume { percent: 40 },
            SynthMessage::SetMaxNotes { count: 3 },
        ]
        .into_iter()
        .collect();

        s.process_messages(&mut queue);
        assert!(queue.is_empty());
        assert_eq!(s.pool().voice(0).unwrap().instrument(), 9);
        assert_eq!(s.volume(), 0.4);
        assert_eq!(s.max_notes(), 3);
    }

    #[test]
    fn frames_carry_identical_channels() {
        let mut s = synth();
        s.note_on(0, 57, 127);
        let mut frames = [0u32; 256];
        s.render_frames(&mut frames);

        assert!(frames.iter().any(|&f| f != 0));
        for frame in frames {
            let (l, r) = unpack_stereo(frame);
            assert_eq!(l, r);
        }
    }

    #[test]
    fn interleaved_output_duplicates_mono() {
        let mut s = synth();
        s.note_on(0, 57, 127);
        let mut out = [0i16; 3 * 128];
        s.render_interleaved(&mut out, 3);
        for frame in out.chunks(3) {
            assert!(frame.iter().all(|&x| x == frame[0]));
        }
    }
}
