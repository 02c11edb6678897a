//! Spectrum widget
//!
//! Hann-windowed FFT folded into log-spaced bands. Each band keeps the
//! strongest FFT bin it covers and falls back slowly so transients stay visible.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

const BANDS: usize = 32;
const FLOOR_DB: f32 = -90.0;
/// dB lost per UI frame when the signal drops.
const FALLBACK_DB: f32 = 1.5;

pub struct Spectrum {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// Half-open FFT bin range per band.
    ranges: Vec<(usize, usize)>,
    /// Lower edge of each band in Hz, for labels.
    edges: Vec<f32>,
    levels: [f32; BANDS],
}

impl Spectrum {
    pub fn new(size: usize, sample_rate: f32) -> Self {
        let size = size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);

        let window = (0..size)
            .map(|i| {
                let x = i as f32 / (size - 1) as f32;
                0.5 - 0.5 * (std::f32::consts::TAU * x).cos()
            })
            .collect();

        let nyquist = sample_rate / 2.0;
        let low = 40.0f32.min(nyquist);
        let high = 16_000.0f32.min(nyquist).max(low);
        let hz_per_bin = sample_rate / size as f32;
        let last_bin = size / 2;

        let mut ranges = Vec::with_capacity(BANDS);
        let mut edges = Vec::with_capacity(BANDS);
        for band in 0..BANDS {
            let lo = low * (high / low).powf(band as f32 / BANDS as f32);
            let hi = low * (high / low).powf((band + 1) as f32 / BANDS as f32);
            let start = ((lo / hz_per_bin) as usize).min(last_bin - 1);
            let end = ((hi / hz_per_bin).ceil() as usize).clamp(start + 1, last_bin);
            ranges.push((start, end));
            edges.push(lo);
        }

        Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); size],
            ranges,
            edges,
            levels: [FLOOR_DB; BANDS],
        }
    }

    /// Analyse the newest `size` samples of `signal`; shorter input is ignored.
    pub fn update(&mut self, signal: &[f32]) {
        let size = self.window.len();
        let Some(recent) = signal.len().checked_sub(size).map(|skip| &signal[skip..]) else {
            return;
        };

        for ((bin, &s), &w) in self.scratch.iter_mut().zip(recent).zip(&self.window) {
            *bin = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        // Hann window halves the coherent gain.
        let norm = 4.0 / (size * size) as f32;
        for (level, &(start, end)) in self.levels.iter_mut().zip(&self.ranges) {
            let peak = self.scratch[start..end]
                .iter()
                .map(|c| c.norm_sqr())
                .fold(0.0f32, f32::max);
            let db = (10.0 * (peak * norm).max(1e-12).log10()).max(FLOOR_DB);
            *level = db.max(*level - FALLBACK_DB);
        }
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    fn label(&self, band: usize) -> String {
        let hz = self.edges[band];
        if hz >= 1000.0 {
            format!("{:.0}k", hz / 1000.0)
        } else {
            format!("{hz:.0}")
        }
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &Spectrum) {
    let bars: Vec<Bar> = spectrum
        .levels()
        .iter()
        .enumerate()
        .map(|(band, &db)| {
            let height = ((db - FLOOR_DB) * 10.0) as u64;
            let bar = Bar::default().value(height).text_value(String::new());
            // Label every fourth band so the axis stays readable.
            if band % 4 == 0 {
                bar.label(spectrum.label(band).into())
            } else {
                bar
            }
        })
        .collect();

    let inner_width = area.width.saturating_sub(2) as usize;
    let bar_width = (inner_width / BANDS).clamp(1, 4) as u16;

    let chart = BarChart::default()
        .block(Block::default().title(" Spectrum ").borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(0)
        .max((-FLOOR_DB * 10.0) as u64)
        .bar_style(Style::default().fg(Color::Green));

    frame.render_widget(chart, area);
}
