// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;
pub mod sink;

pub use sink::{pack_stereo, unpack_stereo, FrameSink, SinkClosed};
