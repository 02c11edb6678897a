use std::f32::consts::TAU;

use crate::dsp::wavetable::SineTable;

/*
Two-Operator FM
===============

Each voice is a carrier sine whose instantaneous frequency is pushed around by
a second sine, the modulator:

    mod_phase += 2π * f_mod * dt
    m          = index * sin(mod_phase)
    phase     += 2π * (f_carrier + m) * dt
    out        = sin(phase)

`index` is in Hz here: it is the peak frequency deviation the modulator adds
to the carrier. The modulator output is summed into the carrier's rate sample
by sample, so a large index can briefly drive the carrier backwards; phases
are wrapped with `rem_euclid` to keep them in [0, 2π) either way.

Ratios are carried as "x/256" fixed point in the bank (256 = 1:1, 768 = 3:1),
so the modulator frequency is `f_carrier * ratio / 256`.
*/

/// Carrier/modulator pair for one voice.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FmOperator {
    pub carrier_freq: f32,
    pub modulator_freq: f32,
    pub modulation_index: f32,
    pub phase: f32,
    pub mod_phase: f32,
}

impl FmOperator {
    /// Retune from a carrier frequency and an x/256 modulator ratio.
    pub fn tune(&mut self, carrier_freq: f32, fm_freq_multiplier: f32) {
        self.carrier_freq = carrier_freq;
        self.modulator_freq = carrier_freq * fm_freq_multiplier / 256.0;
    }

    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
        self.mod_phase = 0.0;
    }

    /// Advance both phases by `dt` seconds and return the carrier's sine.
    #[inline]
    pub fn next_sample(&mut self, table: &SineTable, dt: f32) -> f32 {
        self.mod_phase = (self.mod_phase + TAU * self.modulator_freq * dt).rem_euclid(TAU);
        let mod_signal = self.modulation_index * table.lookup(self.mod_phase);

        self.phase = (self.phase + TAU * (self.carrier_freq + mod_signal) * dt).rem_euclid(TAU);
        table.lookup(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::wavetable::sine_table;

    const DT: f32 = 1.0 / 44_100.0;

    #[test]
    fn unmodulated_carrier_is_a_plain_sine() {
        let mut op = FmOperator::default();
        op.tune(441.0, 256.0);
        op.modulation_index = 0.0;

        let table = sine_table();
        for n in 1..200 {
            let actual = op.next_sample(table, DT);
            let expected = (TAU * 441.0 * n as f32 * DT).sin();
            assert!(
                (actual - expected).abs() < 0.01,
                "sample {n}: expected {expected}, got {actual}"
            );
        }
    }

    #[test]
    fn ratio_is_fixed_point_over_256() {
        let mut op = FmOperator::default();
        op.tune(200.0, 768.0);
        assert_eq!(op.modulator_freq, 600.0);
    }

    #[test]
    fn phases_stay_wrapped_under_deep_modulation() {
        let mut op = FmOperator::default();
        op.tune(55.0, 1792.0);
        op.modulation_index = 5_000.0;

        let table = sine_table();
        for _ in 0..10_000 {
            let s = op.next_sample(table, DT);
            assert!((-1.0..=1.0).contains(&s));
            assert!((0.0..=TAU).contains(&op.phase), "phase {}", op.phase);
            assert!((0.0..=TAU).contains(&op.mod_phase));
        }
    }

    #[test]
    fn modulation_changes_the_waveform() {
        let table = sine_table();
        let mut plain = FmOperator::default();
        plain.tune(220.0, 256.0);
        let mut bright = plain;
        bright.modulation_index = 300.0;

        let diff: f32 = (0..512)
            .map(|_| (plain.next_sample(table, DT) - bright.next_sample(table, DT)).abs())
            .sum();
        assert!(diff > 1.0);
    }
}
