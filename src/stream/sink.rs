//! Packet delivery collaborators.
//!
//! The stream loop hands every packet to a [`PacketSink`] and moves on. Sinks must not block:
//! a slow or absent consumer loses packets rather than stalling the cadence.

use crate::core::packet::DataPacket;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Accepts packets from the stream loop without blocking it.
pub trait PacketSink: Send + Sync {
    /// Offer a packet. Returns whether the sink accepted it.
    fn deliver(&self, packet: &DataPacket) -> bool;
}

/// Discards every packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PacketSink for NullSink {
    fn deliver(&self, _packet: &DataPacket) -> bool {
        true
    }
}

/// Forwards packets over a bounded channel, dropping them when the channel is full.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<DataPacket>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn bounded(capacity: usize) -> (Self, Receiver<DataPacket>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl PacketSink for ChannelSink {
    fn deliver(&self, packet: &DataPacket) -> bool {
        match self.sender.try_send(packet.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Packet consumer is behind, dropping packet");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packet::PacketBuilder;
    use crate::core::windowing::WindowSamples;
    use crate::simulator::types::Mode;

    fn packet() -> DataPacket {
        PacketBuilder::default()
            .build(&WindowSamples::new(Vec::new()), Mode::Relaxed)
            .unwrap()
    }

    #[test]
    fn test_channel_sink_delivers() {
        let (sink, receiver) = ChannelSink::bounded(4);
        assert!(sink.deliver(&packet()));
        assert_eq!(receiver.try_recv().unwrap().current_mode, Mode::Relaxed);
    }

    #[test]
    fn test_channel_sink_drops_when_full() {
        let (sink, receiver) = ChannelSink::bounded(1);
        assert!(sink.deliver(&packet()));
        assert!(!sink.deliver(&packet()));
        assert_eq!(receiver.len(), 1);
    }

    #[test]
    fn test_channel_sink_disconnected() {
        let (sink, receiver) = ChannelSink::bounded(1);
        drop(receiver);
        assert!(!sink.deliver(&packet()));
    }
}
