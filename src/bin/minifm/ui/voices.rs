//! Voice table widget - one row per pool slot

use minifm::{dsp::EnvelopeState, INSTRUMENTS};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Row, Table},
    Frame,
};

use super::state::MonitorFrame;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

fn note_name(note: u8) -> String {
    format!("{}{}", NOTE_NAMES[note as usize % 12], note as i32 / 12 - 1)
}

fn state_style(state: EnvelopeState) -> (&'static str, Color) {
    match state {
        EnvelopeState::Idle => ("idle", Color::DarkGray),
        EnvelopeState::Attack => ("attack", Color::Green),
        EnvelopeState::Decay => ("decay", Color::Yellow),
        EnvelopeState::Sustain => ("sustain", Color::Cyan),
        EnvelopeState::Release => ("release", Color::Magenta),
    }
}

/// Render the envelope level as a fixed-width bar.
fn level_bar(level: f32, width: usize) -> String {
    let filled = (level.clamp(0.0, 1.0) * width as f32).round() as usize;
    format!("{}{}", "█".repeat(filled), "·".repeat(width - filled))
}

pub fn render_voices(frame: &mut Frame, area: Rect, monitor: &MonitorFrame) {
    let rows = monitor.voices.iter().enumerate().map(|(slot, voice)| {
        let (label, color) = state_style(voice.state);
        let style = if voice.active {
            Style::default().fg(color)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let instrument = INSTRUMENTS
            .get(voice.instrument as usize)
            .map_or("?", |i| i.name);

        Row::new(vec![
            format!("{slot}"),
            label.to_string(),
            if voice.active { note_name(voice.note) } else { "-".into() },
            format!("{}", voice.channel),
            instrument.to_string(),
            level_bar(voice.level, 16),
            format!("{:6.2}s", voice.time_elapsed),
        ])
        .style(style)
    });

    let header = Row::new(vec!["#", "stage", "note", "ch", "timbre", "level", "age"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Length(11),
            Constraint::Length(17),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(format!(
                " Voices {}/{} ",
                monitor.active_voices(),
                monitor.max_notes
            ))
            .borders(Borders::ALL),
    );

    frame.render_widget(table, area);
}
