#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{BUFFER_SIZE, DEFAULT_SAMPLE_RATE, MAX_BLOCK_SIZE};

/// Runtime settings for the synth and its driver.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    /// Output rate in Hz; the envelope and oscillators step by `1 / sample_rate`.
    pub sample_rate: f32,
    /// Stereo frames per buffer handed to the transport.
    pub buffer_frames: usize,
    /// Capacity of the control message queue.
    pub command_capacity: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE as f32,
            buffer_frames: BUFFER_SIZE,
            command_capacity: 256,
        }
    }
}

impl SynthConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_buffer_frames(mut self, frames: usize) -> Self {
        self.buffer_frames = frames;
        self
    }

    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    /// Replace unusable values with defaults and cap the buffer length.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            sample_rate: if self.sample_rate.is_finite() && self.sample_rate > 0.0 {
                self.sample_rate
            } else {
                defaults.sample_rate
            },
            buffer_frames: match self.buffer_frames {
                0 => defaults.buffer_frames,
                n => n.min(MAX_BLOCK_SIZE),
            },
            command_capacity: match self.command_capacity {
                0 => defaults.command_capacity,
                n => n,
            },
        }
    }

    /// Seconds per sample.
    pub fn time_step(&self) -> f32 {
        1.0 / self.sample_rate
    }

    /// Wall-clock length of one buffer; the driver must beat this every time.
    pub fn buffer_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.buffer_frames as f64 / self.sample_rate as f64)
    }
}
