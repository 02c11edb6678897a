use crate::MIN_TIME;

/*
ADSR Envelope
=============

A linear four-segment envelope, advanced once per output sample by a fixed
time step `dt = 1 / sample_rate`.

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release

Segments
--------

Each segment is a straight line from the level it started at (`origin`) to
its target, sampled by a tick counter rather than by adding an increment
every sample. Summing thousands of tiny f32 steps drifts by several samples;
`origin + (target - origin) * n / len` lands on the target exactly at tick
`len`, and the stage changes on that same tick.

  Segment   target    len (samples)
  Attack    1.0       attack / dt
  Decay     S         decay / dt
  Release   0.0       origin * release / dt

Release uses a full-scale rate: releasing from the sustain level S takes
S * release seconds, releasing mid-attack takes proportionally less.
Lengths are rounded to whole samples and are never shorter than one.

Transitions
-----------

  Idle ──note_on──→ Attack ──level≥1──→ Decay ──level≤S──→ Sustain
                                          │                  │
                                          │ S == 0           │ note_off
                                          ↓                  ↓
                   Idle ←──level≤0─── Release ←──────────────┘

A zero-sustain timbre is a one-shot: Decay hands straight to Release, and an
explicit note_off is ignored by the voice pool. Note_off from Attack or Decay
is allowed for sustaining timbres and ramps down from wherever the level is.

All three times are floored to MIN_TIME before dividing, so a zero in the bank
produces an instant segment instead of infinity.
*/

/// Stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeState {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Envelope shape: three segment times in seconds plus the sustain level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    fn sustain_level(&self) -> f32 {
        self.sustain.clamp(0.0, 1.0)
    }
}

/// Outcome of one envelope step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Still producing output.
    Running,
    /// Release reached zero on this step; the voice can be returned to the pool.
    Finished,
}

/// Whole samples covered by a segment of `seconds`, at least one.
fn segment_len(seconds: f32, dt: f32) -> u32 {
    let samples = seconds.max(MIN_TIME) as f64 / dt as f64;
    samples.round().max(1.0) as u32
}

/// Per-voice envelope: stage, current level and position inside the stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Envelope {
    state: EnvelopeState,
    level: f32,
    /// Level the current segment started from.
    origin: f32,
    ticks: u32,
    /// Segment length in samples; 0 until the first step of the segment.
    len: u32,
}

impl Envelope {
    /// Start a fresh attack from silence.
    pub fn trigger(&mut self) {
        self.level = 0.0;
        self.enter(EnvelopeState::Attack);
    }

    /// Ramp down from wherever the level is. No-op when idle or already releasing.
    pub fn release(&mut self) {
        if !matches!(self.state, EnvelopeState::Idle | EnvelopeState::Release) {
            self.enter(EnvelopeState::Release);
        }
    }

    /// Drop to idle at zero without a ramp.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    fn enter(&mut self, state: EnvelopeState) {
        self.state = state;
        self.origin = self.level;
        self.ticks = 0;
        self.len = 0;
    }

    /// Advance by one time step of `dt` seconds.
    #[inline]
    pub fn step(&mut self, adsr: &Adsr, dt: f32) -> Step {
        let sustain = adsr.sustain_level();
        let (target, seconds) = match self.state {
            EnvelopeState::Idle => return Step::Running,
            EnvelopeState::Sustain => {
                self.level = sustain;
                return Step::Running;
            }
            EnvelopeState::Attack => (1.0, adsr.attack),
            EnvelopeState::Decay => (sustain, adsr.decay),
            EnvelopeState::Release => (0.0, self.origin * adsr.release.max(MIN_TIME)),
        };

        if self.len == 0 {
            self.len = segment_len(seconds, dt);
        }
        self.ticks += 1;

        if self.ticks < self.len {
            let t = self.ticks as f32 / self.len as f32;
            self.level = self.origin + (target - self.origin) * t;
            return Step::Running;
        }

        self.level = target;
        match self.state {
            EnvelopeState::Attack => self.enter(EnvelopeState::Decay),
            EnvelopeState::Decay if sustain == 0.0 => self.enter(EnvelopeState::Release),
            EnvelopeState::Decay => self.enter(EnvelopeState::Sustain),
            _ => {
                self.enter(EnvelopeState::Idle);
                return Step::Finished;
            }
        }
        Step::Running
    }
}
