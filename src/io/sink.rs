use std::fmt;

/// Pack one mono sample into a stereo word: left in the high half, right in the low.
#[inline]
pub fn pack_stereo(sample: i16) -> u32 {
    let bits = sample as u16 as u32;
    (bits << 16) | bits
}

/// Split a stereo word back into `(left, right)`.
#[inline]
pub fn unpack_stereo(frame: u32) -> (i16, i16) {
    ((frame >> 16) as u16 as i16, frame as u16 as i16)
}

/// The transport on the other side went away; no more buffers will be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

impl fmt::Display for SinkClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("audio transport closed")
    }
}

impl std::error::Error for SinkClosed {}

/// Destination for finished buffers of packed stereo frames.
///
/// `push_frames` may block until the transport has room; it is the only place
/// the synthesis loop is allowed to wait.
pub trait FrameSink {
    fn push_frames(&mut self, frames: &[u32]) -> Result<(), SinkClosed>;
}

/// Offline capture.
impl FrameSink for Vec<u32> {
    fn push_frames(&mut self, frames: &[u32]) -> Result<(), SinkClosed> {
        self.extend_from_slice(frames);
        Ok(())
    }
}

#[cfg(feature = "rtrb")]
mod ring {
    use std::time::Duration;

    use rtrb::Producer;

    use super::{FrameSink, SinkClosed};

    /// Back-off while the consumer drains the ring.
    const WAIT: Duration = Duration::from_micros(250);

    impl FrameSink for Producer<u32> {
        fn push_frames(&mut self, mut frames: &[u32]) -> Result<(), SinkClosed> {
            while !frames.is_empty() {
                if self.is_abandoned() {
                    return Err(SinkClosed);
                }

                let n = self.slots().min(frames.len());
                if n == 0 {
                    std::thread::sleep(WAIT);
                    continue;
                }

                if let Ok(chunk) = self.write_chunk_uninit(n) {
                    let written = chunk.fill_from_iter(frames[..n].iter().copied());
                    frames = &frames[written..];
                }
            }
            Ok(())
        }
    }
}
