//! Streaming: the background loop, its command handle and packet delivery.

pub mod controller;
pub mod sink;

pub use controller::{
    ControlError, StreamHandle, StreamLoop, StreamStatus, TickError, TickOutcome,
};
pub use sink::{ChannelSink, NullSink, PacketSink};
