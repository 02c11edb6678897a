#[cfg(feature = "rtrb")]
use rtrb::{Consumer, PushError, Producer, RingBuffer};

/// Control operations, queued from the input thread to the audio thread.
///
/// Small and `Copy` so the queue never allocates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    SetInstrument { channel: u8, instrument: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    AllNotesOff,
    /// Global volume in percent, 0-100.
    SetVolume { percent: u8 },
    /// Rescale the first active voice on `channel`.
    AlterVolume { channel: u8, velocity: u8 },
    /// Bend the first active voice on `channel`; 0-127, 64 is centre.
    AlterPitch { channel: u8, amount: u8 },
    SetMaxNotes { count: u8 },
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

/// Drains a fixed list; handy for tests and offline rendering.
impl MessageReceiver for std::collections::VecDeque<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        self.pop_front()
    }
}

/// Sending half of the control queue.
///
/// Every method is a non-blocking push. A full queue hands the message back in
/// the error instead of waiting on the audio thread.
#[cfg(feature = "rtrb")]
pub struct SynthController {
    tx: Producer<SynthMessage>,
}

#[cfg(feature = "rtrb")]
pub type SendResult = Result<(), PushError<SynthMessage>>;

#[cfg(feature = "rtrb")]
impl SynthController {
    /// Create a controller and the matching receiver for the audio thread.
    pub fn channel(capacity: usize) -> (Self, Consumer<SynthMessage>) {
        let (tx, rx) = RingBuffer::<SynthMessage>::new(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn send(&mut self, msg: SynthMessage) -> SendResult {
        self.tx.push(msg)
    }

    pub fn set_instrument(&mut self, channel: u8, instrument: u8) -> SendResult {
        self.send(SynthMessage::SetInstrument {
            channel,
            instrument,
        })
    }

    pub fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> SendResult {
        self.send(SynthMessage::NoteOn {
            channel,
            note,
            velocity,
        })
    }

    /// Note-on at full velocity.
    pub fn note_on_default(&mut self, channel: u8, note: u8) -> SendResult {
        self.note_on(channel, note, 127)
    }

    pub fn note_off(&mut self, channel: u8, note: u8) -> SendResult {
        self.send(SynthMessage::NoteOff { channel, note })
    }

    pub fn all_notes_off(&mut self) -> SendResult {
        self.send(SynthMessage::AllNotesOff)
    }

    pub fn set_volume(&mut self, percent: u8) -> SendResult {
        self.send(SynthMessage::SetVolume { percent })
    }

    pub fn alter_vol_note(&mut self, channel: u8, velocity: u8) -> SendResult {
        self.send(SynthMessage::AlterVolume { channel, velocity })
    }

    pub fn alter_pitch_note(&mut self, channel: u8, amount: u8) -> SendResult {
        self.send(SynthMessage::AlterPitch { channel, amount })
    }

    pub fn set_max_notes(&mut self, count: u8) -> SendResult {
        self.send(SynthMessage::SetMaxNotes { count })
    }

    /// Free slots left in the queue.
    pub fn slots(&self) -> usize {
        self.tx.slots()
    }

    /// True once the audio side has dropped its receiver.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_abandoned()
    }
}
