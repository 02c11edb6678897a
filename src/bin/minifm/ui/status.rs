//! Status bar widget - instrument, volume, run state and output levels

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use minifm::INSTRUMENTS;

use super::state::MonitorFrame;

/// Output level of the most recent scope window
pub struct Levels {
    pub peak: f32,
    pub rms: f32,
}

impl Levels {
    pub fn measure(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (samples.iter().map(|&x| x * x).sum::<f32>() / samples.len() as f32).sqrt();
        Self { peak, rms }
    }
}

fn to_db(x: f32) -> f32 {
    20.0 * x.max(1e-5).log10()
}

pub struct StatusLine<'a> {
    pub instrument: u8,
    pub paused: bool,
    pub sample_rate: f32,
    pub buffers: u64,
    pub monitor: &'a MonitorFrame,
    pub levels: Levels,
}

pub fn render_status(frame: &mut Frame, area: Rect, status: &StatusLine) {
    let name = INSTRUMENTS
        .get(status.instrument as usize)
        .map_or("?", |i| i.name);
    let (symbol, state, state_color) = if status.paused {
        ("⏸", "Paused", Color::Yellow)
    } else {
        ("▶", "Running", Color::Green)
    };
    let peak_color = if status.levels.peak >= 0.99 {
        Color::Red
    } else {
        Color::White
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {:>2}:{:<11}", status.instrument, name),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{symbol} {state}  "), Style::default().fg(state_color)),
        Span::raw(format!("vol {:>3}%  ", (status.monitor.volume * 100.0).round())),
        Span::styled(
            format!("peak {:6.1} dB  ", to_db(status.levels.peak)),
            Style::default().fg(peak_color),
        ),
        Span::raw(format!("rms {:6.1} dB  ", to_db(status.levels.rms))),
        Span::styled(
            format!(
                "{:.1}kHz  {} buffers",
                status.sample_rate / 1000.0,
                status.buffers
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let widget =
        Paragraph::new(line).block(Block::default().title(" minifm ").borders(Borders::ALL));
    frame.render_widget(widget, area);
}
