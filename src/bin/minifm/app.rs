//! Audio plumbing: cpal output stream fed by the synth driver thread.

use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::info;
use rtrb::{Consumer, Producer, RingBuffer};

use minifm::{
    io::unpack_stereo,
    synth::{message::SendResult, SynthController, SynthMessage},
    DriverHandle, FmSynth, SynthConfig, SynthDriver, INSTRUMENTS, MAX_VOICES,
};

use super::ui::{state::MonitorFrame, UiApp};
use super::Args;

/// Frames of slack between the driver and the device callback.
const TRANSPORT_FRAMES: usize = 4096;
/// Samples kept for the scope/spectrum.
const SCOPE_FRAMES: usize = 4096;

pub type Driver = DriverHandle<Consumer<SynthMessage>, Producer<u32>>;

/// Everything the front ends need once audio is running.
pub struct Session {
    pub controller: SynthController,
    pub driver: Driver,
    pub scope_rx: Consumer<f32>,
    pub monitor_rx: Consumer<MonitorFrame>,
    pub sample_rate: f32,
    // Dropped last: the driver must be stopped while the device still drains.
    stream: cpal::Stream,
}

impl Session {
    pub fn start(args: &Args) -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let supported = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels() as usize;
        let config = SynthConfig::default().with_sample_rate(sample_rate);

        let (mut controller, commands) = SynthController::channel(config.command_capacity);
        let (frames_tx, frames_rx) = RingBuffer::<u32>::new(TRANSPORT_FRAMES);
        let (scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_FRAMES);
        let (monitor_tx, monitor_rx) = RingBuffer::<MonitorFrame>::new(16);

        let driver = SynthDriver::new(config, commands, frames_tx)
            .with_observer(monitor(scope_tx, monitor_tx))
            .spawn()
            .wrap_err("failed to start synth thread")?;

        let stream = device.build_output_stream(
            &supported.into(),
            device_callback(frames_rx, channels),
            |err| log::error!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        for channel in 0..MAX_VOICES as u8 {
            send(controller.set_instrument(channel, args.instrument))?;
        }
        send(controller.set_volume(args.volume))?;

        info!("output: {sample_rate} Hz, {channels} channels");

        Ok(Self {
            controller,
            driver,
            scope_rx,
            monitor_rx,
            sample_rate,
            stream,
        })
    }

    pub fn shutdown(self) -> EyreResult<()> {
        let Self { driver, stream, .. } = self;
        driver
            .stop()
            .map_err(|_| eyre!("synth thread panicked"))?;
        drop(stream);
        Ok(())
    }
}

/// Driver observer: forward the mono signal and a voice snapshot to the UI.
/// Drops data instead of waiting when the UI falls behind.
fn monitor(
    mut scope_tx: Producer<f32>,
    mut monitor_tx: Producer<MonitorFrame>,
) -> impl FnMut(&FmSynth, &[u32]) + Send + 'static {
    move |synth, frames| {
        for &frame in frames {
            let (left, _) = unpack_stereo(frame);
            if scope_tx.push(left as f32 / 32768.0).is_err() {
                break;
            }
        }
        let _ = monitor_tx.push(MonitorFrame::capture(synth));
    }
}

/// Device callback: unpack stereo words, hold the last frame on underrun.
fn device_callback(
    mut frames_rx: Consumer<u32>,
    channels: usize,
) -> impl FnMut(&mut [f32], &cpal::OutputCallbackInfo) + Send + 'static {
    let mut last = (0.0f32, 0.0f32);
    move |data: &mut [f32], _| {
        for out in data.chunks_mut(channels.max(1)) {
            if let Ok(frame) = frames_rx.pop() {
                let (l, r) = unpack_stereo(frame);
                last = (l as f32 / 32768.0, r as f32 / 32768.0);
            }
            match out {
                [mono] => *mono = last.0,
                [left, right, rest @ ..] => {
                    *left = last.0;
                    *right = last.1;
                    rest.fill(last.0);
                }
                [] => {}
            }
        }
    }
}

pub fn run_tui(args: &Args) -> EyreResult<()> {
    let session = Session::start(args)?;

    let mut terminal = ratatui::init();
    let mut ui = UiApp::new(session, args.instrument, args.volume);
    let result = ui.run(&mut terminal);
    ratatui::restore();

    result?;
    ui.into_session().shutdown()
}

/// Walk the bank, one short phrase per instrument, on channels 0..MAX_VOICES.
pub fn run_headless(args: &Args) -> EyreResult<()> {
    let mut session = Session::start(args)?;
    let per_instrument = Duration::from_secs_f32(
        (args.seconds / INSTRUMENTS.len() as f32).max(0.25),
    );
    let step = per_instrument / 4;
    let phrase = [60u8, 64, 67, 72];

    for (index, instrument) in INSTRUMENTS.iter().enumerate() {
        let channel = (index % MAX_VOICES) as u8;
        info!("instrument {index}: {} on channel {channel}", instrument.name);
        send(session.controller.set_instrument(channel, index as u8))?;

        for &note in &phrase {
            send(session.controller.note_on(channel, note, 110))?;
            std::thread::sleep(step);
            send(session.controller.note_off(channel, note))?;
        }
    }

    info!("bending an A3 up, then silencing");
    send(session.controller.note_on(0, 57, 127))?;
    for amount in (64..=127).step_by(8) {
        send(session.controller.alter_pitch_note(0, amount))?;
        std::thread::sleep(Duration::from_millis(40));
    }
    send(session.controller.all_notes_off())?;
    std::thread::sleep(Duration::from_millis(200));

    info!("{} buffers rendered", session.driver.buffers_rendered());
    session.shutdown()
}

fn send(result: SendResult) -> EyreResult<()> {
    result.map_err(|_| eyre!("control queue full"))
}
