//! Terminal front end for minifm
//!
//! Plays notes from the keyboard and shows what the voice pool is doing.

pub mod state;
mod spectrum;
mod status;
mod voices;
mod waveform;

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};

use minifm::{
    synth::{message::SendResult, NUM_INSTRUMENTS},
    MAX_VOICES,
};

use crate::app::Session;
use spectrum::{render_spectrum, Spectrum};
use state::MonitorFrame;
use status::{render_status, Levels, StatusLine};
use voices::render_voices;
use waveform::render_waveform;

/// Samples kept for the scope and the FFT
const VIS_BUFFER_SIZE: usize = 2048;

/// How long a key press holds its note before the automatic note-off
const HOLD: Duration = Duration::from_millis(400);

/// Home row, C major from middle C
const SCALE_KEYS: [(char, u8); 8] = [
    ('a', 60),
    ('s', 62),
    ('d', 64),
    ('f', 65),
    ('g', 67),
    ('h', 69),
    ('j', 71),
    ('k', 72),
];

const VOLUME_STEP: u8 = 5;
const BEND_STEP: u8 = 8;
const BEND_CENTRE: u8 = 64;

struct HeldNote {
    channel: u8,
    note: u8,
    until: Instant,
}

pub struct UiApp {
    session: Session,
    monitor: MonitorFrame,
    audio_buffer: Vec<f32>,
    spectrum: Spectrum,
    held: Vec<HeldNote>,
    instrument: u8,
    volume: u8,
    bend: u8,
    /// Channel the next key press plays on; rotates so held notes overlap.
    next_channel: u8,
    last_channel: u8,
    /// Control messages lost to a full queue
    dropped: u32,
    should_quit: bool,
}

impl UiApp {
    pub fn new(session: Session, instrument: u8, volume: u8) -> Self {
        let spectrum = Spectrum::new(VIS_BUFFER_SIZE, session.sample_rate);
        Self {
            session,
            monitor: MonitorFrame::default(),
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum,
            held: Vec::with_capacity(MAX_VOICES * 2),
            instrument,
            volume: volume.min(100),
            bend: BEND_CENTRE,
            next_channel: 0,
            last_channel: 0,
            dropped: 0,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_monitor();
            self.release_expired(Instant::now());

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        let result = self.session.controller.all_notes_off();
        self.track(result);
        Ok(())
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    fn poll_audio(&mut self) {
        let available = self.session.scope_rx.slots();
        if available == 0 {
            return;
        }
        if let Ok(chunk) = self.session.scope_rx.read_chunk(available) {
            self.audio_buffer.extend(chunk);
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(..excess);
        }
        if !self.session.driver.is_paused() {
            self.spectrum.update(&self.audio_buffer);
        }
    }

    fn poll_monitor(&mut self) {
        while let Ok(frame) = self.session.monitor_rx.pop() {
            self.monitor = frame;
        }
    }

    fn release_expired(&mut self, now: Instant) {
        let mut i = 0;
        while i < self.held.len() {
            if self.held[i].until <= now {
                let HeldNote { channel, note, .. } = self.held.swap_remove(i);
                let result = self.session.controller.note_off(channel, note);
                self.track(result);
            } else {
                i += 1;
            }
        }
    }

    fn track(&mut self, result: SendResult) {
        if result.is_err() {
            self.dropped += 1;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let result = match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('p') => {
                if self.session.driver.is_paused() {
                    self.session.driver.resume();
                } else {
                    self.session.driver.pause();
                }
                return;
            }
            KeyCode::Char(' ') => {
                self.held.clear();
                self.session.controller.all_notes_off()
            }
            KeyCode::Char('[') => {
                self.volume = self.volume.saturating_sub(VOLUME_STEP);
                self.session.controller.set_volume(self.volume)
            }
            KeyCode::Char(']') => {
                self.volume = (self.volume + VOLUME_STEP).min(100);
                self.session.controller.set_volume(self.volume)
            }
            KeyCode::Char(',') => {
                self.bend = self.bend.saturating_sub(BEND_STEP);
                self.session.controller.alter_pitch_note(self.last_channel, self.bend)
            }
            KeyCode::Char('.') => {
                self.bend = (self.bend + BEND_STEP).min(127);
                self.session.controller.alter_pitch_note(self.last_channel, self.bend)
            }
            KeyCode::Char(c) => {
                if let Some(instrument) = instrument_for_key(c) {
                    self.select_instrument(instrument);
                    return;
                }
                match SCALE_KEYS.iter().find(|(k, _)| *k == c) {
                    Some(&(_, note)) => self.play(note),
                    None => return,
                }
            }
            _ => return,
        };
        self.track(result);
    }

    fn select_instrument(&mut self, instrument: u8) {
        self.instrument = instrument;
        for channel in 0..MAX_VOICES as u8 {
            let result = self.session.controller.set_instrument(channel, instrument);
            self.track(result);
        }
    }

    fn play(&mut self, note: u8) -> SendResult {
        let channel = self.next_channel;
        self.next_channel = (channel + 1) % MAX_VOICES as u8;
        self.last_channel = channel;
        self.bend = BEND_CENTRE;

        self.held.push(HeldNote {
            channel,
            note,
            until: Instant::now() + HOLD,
        });
        self.session.controller.note_on_default(channel, note)
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                      // Status bar
                Constraint::Length(MAX_VOICES as u16 + 3),  // Voice table
                Constraint::Min(8),                         // Scope + spectrum
                Constraint::Length(1),                      // Help bar
            ])
            .split(frame.area());

        let status = StatusLine {
            instrument: self.instrument,
            paused: self.session.driver.is_paused(),
            sample_rate: self.session.sample_rate,
            buffers: self.session.driver.buffers_rendered(),
            monitor: &self.monitor,
            levels: Levels::measure(&self.audio_buffer),
        };
        render_status(frame, chunks[0], &status);
        render_voices(frame, chunks[1], &self.monitor);

        let scopes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        render_waveform(frame, scopes[0], &self.audio_buffer);
        render_spectrum(frame, scopes[1], &self.spectrum);

        let mut help = String::from(
            " [a-k] Play  [0-9 - =] Timbre  [[ ]] Volume  [, .] Bend  [Space] Silence  [P] Pause  [Q] Quit",
        );
        if self.dropped > 0 {
            help.push_str(&format!("  ({} dropped)", self.dropped));
        }
        frame.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            chunks[3],
        );
    }
}

fn instrument_for_key(c: char) -> Option<u8> {
    let index = match c {
        '0'..='9' => c as u8 - b'0',
        '-' => 10,
        '=' => 11,
        _ => return None,
    };
    (index < NUM_INSTRUMENTS as u8).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_keys_cover_the_bank() {
        let picked: Vec<u8> = "0123456789-="
            .chars()
            .filter_map(instrument_for_key)
            .collect();
        assert_eq!(picked, (0..NUM_INSTRUMENTS as u8).collect::<Vec<_>>());
        assert_eq!(instrument_for_key('x'), None);
    }

    #[test]
    fn scale_keys_climb() {
        assert!(SCALE_KEYS.windows(2).all(|w| w[0].1 < w[1].1));
    }
}
