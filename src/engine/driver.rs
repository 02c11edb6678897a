//! The realtime producer loop.
//!
//! One `tick` = apply queued control messages, render one buffer of packed
//! stereo frames, hand it to the transport. The hand-off is the only place the
//! loop waits; everything else is bounded work per sample.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::{info, warn};

use crate::{
    engine::config::SynthConfig,
    io::sink::{FrameSink, SinkClosed},
    synth::{message::MessageReceiver, synth::FmSynth},
};

type Observer = Box<dyn FnMut(&FmSynth, &[u32]) + Send>;

/// Flags shared between the producer thread and its handle.
#[derive(Default)]
struct DriverControl {
    paused: AtomicBool,
    stopped: AtomicBool,
    buffers: AtomicU64,
}

pub struct SynthDriver<R, S> {
    synth: FmSynth,
    rx: R,
    sink: S,
    buffer: Vec<u32>,
    observer: Option<Observer>,
    control: Arc<DriverControl>,
}

impl<R: MessageReceiver, S: FrameSink> SynthDriver<R, S> {
    pub fn new(config: SynthConfig, rx: R, sink: S) -> Self {
        Self::with_synth(FmSynth::new(config), config, rx, sink)
    }

    pub fn with_synth(synth: FmSynth, config: SynthConfig, rx: R, sink: S) -> Self {
        let config = config.sanitized();
        Self {
            synth,
            rx,
            sink,
            buffer: vec![0; config.buffer_frames],
            observer: None,
            control: Arc::new(DriverControl::default()),
        }
    }

    /// Called with the synth and the finished buffer, just before hand-off.
    ///
    /// Runs on the audio thread: keep it allocation-free.
    pub fn with_observer(
        mut self,
        observer: impl FnMut(&FmSynth, &[u32]) + Send + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Render and deliver exactly one buffer.
    pub fn tick(&mut self) -> Result<(), SinkClosed> {
        self.synth.process_messages(&mut self.rx);
        self.synth.render_frames(&mut self.buffer);

        if let Some(observer) = self.observer.as_mut() {
            observer(&self.synth, &self.buffer);
        }

        self.sink.push_frames(&self.buffer)?;
        self.control.buffers.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Loop until stopped through a [`DriverHandle`] or the transport closes.
    ///
    /// While paused the thread parks between buffers; voice state is left as is.
    pub fn run(&mut self) {
        info!(
            "synth driver running: {} Hz, {} frames per buffer",
            self.synth.sample_rate(),
            self.buffer.len()
        );

        while !self.control.stopped.load(Ordering::Acquire) {
            if self.control.paused.load(Ordering::Acquire) {
                thread::park();
                continue;
            }

            if let Err(err) = self.tick() {
                warn!("synth driver stopping: {err}");
                break;
            }
        }

        info!(
            "synth driver stopped after {} buffers",
            self.control.buffers.load(Ordering::Relaxed)
        );
    }

    pub fn synth(&self) -> &FmSynth {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut FmSynth {
        &mut self.synth
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn buffers_rendered(&self) -> u64 {
        self.control.buffers.load(Ordering::Relaxed)
    }
}

impl<R, S> SynthDriver<R, S>
where
    R: MessageReceiver + Send + 'static,
    S: FrameSink + Send + 'static,
{
    /// Move the driver onto its own thread.
    pub fn spawn(mut self) -> std::io::Result<DriverHandle<R, S>> {
        let control = Arc::clone(&self.control);
        let thread = thread::Builder::new()
            .name("minifm-synth".into())
            .spawn(move || {
                self.run();
                self
            })?;

        Ok(DriverHandle { control, thread })
    }
}

/// Owner-side handle for a spawned driver.
pub struct DriverHandle<R, S> {
    control: Arc<DriverControl>,
    thread: JoinHandle<SynthDriver<R, S>>,
}

impl<R, S> DriverHandle<R, S> {
    /// Suspend after the current buffer is handed off.
    pub fn pause(&self) {
        self.control.paused.store(true, Ordering::Release);
        info!("synth paused");
    }

    pub fn resume(&self) {
        self.control.paused.store(false, Ordering::Release);
        self.thread.thread().unpark();
        info!("synth resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.control.paused.load(Ordering::Acquire)
    }

    pub fn buffers_rendered(&self) -> u64 {
        self.control.buffers.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Stop the loop and take the driver back.
    pub fn stop(self) -> thread::Result<SynthDriver<R, S>> {
        self.control.stopped.store(true, Ordering::Release);
        self.thread.thread().unpark();
        self.thread.join()
    }
}
