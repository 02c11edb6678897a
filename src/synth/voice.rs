use crate::{
    dsp::{
        envelope::{Envelope, EnvelopeState, Step},
        fm::FmOperator,
        wavetable::SineTable,
    },
    io::midi::note_to_freq,
    synth::instrument::Instrument,
};

/// One synthesis slot. Slots are created inert and reused forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct FmVoice {
    pub(crate) osc: FmOperator,
    pub(crate) amplitude: f32,
    pub(crate) env: Envelope,
    pub(crate) active: bool,
    pub(crate) time_elapsed: f32,
    pub(crate) note: u8,
    pub(crate) channel: u8,
    pub(crate) instrument: u8,
}

impl FmVoice {
    /// Claim this slot for a new note.
    ///
    /// The slot is deactivated first and only reactivated once every field is
    /// written, so a stolen voice never renders a mix of old and new parameters.
    pub fn start(
        &mut self,
        channel: u8,
        note: u8,
        velocity: f32,
        instrument_index: u8,
        instrument: &Instrument,
    ) {
        self.active = false;

        self.osc.tune(
            note_to_freq(note as f32 + instrument.pitch_offset),
            instrument.fm_freq_multiplier,
        );
        self.osc.modulation_index = instrument.modulation_index(velocity);
        self.osc.reset_phase();
        self.amplitude = instrument.amplitude(velocity);
        self.env.trigger();
        self.time_elapsed = 0.0;
        self.note = note;
        self.channel = channel;
        self.instrument = instrument_index;

        self.active = true;
    }

    /// Enter the release stage from the current level.
    pub fn release(&mut self) {
        if self.active {
            self.env.release();
        }
    }

    /// Sounding and not yet released.
    pub fn is_held(&self) -> bool {
        self.active && self.env.state() != EnvelopeState::Release
    }

    /// Hard stop with no release ramp.
    pub fn silence(&mut self) {
        self.active = false;
        self.env.reset();
        self.time_elapsed = 0.0;
        self.note = 0;
        self.channel = 0;
    }

    /// Recompute carrier and modulator for a pitch offset in semitones.
    pub fn retune(&mut self, instrument: &Instrument, semitones: f32) {
        self.osc.tune(
            note_to_freq(self.note as f32 + instrument.pitch_offset + semitones),
            instrument.fm_freq_multiplier,
        );
    }

    /// Envelope step plus oscillator step; returns the voice's signal before
    /// global volume. Returns 0.0 for an inactive slot without touching it.
    #[inline]
    pub fn render_sample(&mut self, instrument: &Instrument, table: &SineTable, dt: f32) -> f32 {
        if !self.active {
            return 0.0;
        }

        if self.env.step(&instrument.envelope(), dt) == Step::Finished {
            self.active = false;
        }
        self.time_elapsed += dt;

        self.amplitude * self.env.level() * self.osc.next_sample(table, dt)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> EnvelopeState {
        self.env.state()
    }

    pub fn level(&self) -> f32 {
        self.env.level()
    }

    pub fn time_elapsed(&self) -> f32 {
        self.time_elapsed
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn instrument(&self) -> u8 {
        self.instrument
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn oscillator(&self) -> &FmOperator {
        &self.osc
    }
}
