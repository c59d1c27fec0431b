//! FIFO packet queue with an optional capacity.

use std::collections::VecDeque;

use crate::contract::{Capabilities, EndpointKind, PacketProcessor, Port};
use crate::core::{
    ConfigError, DropReason, LinkEvent, Notifications, Packet, PacketSink, PassiveSource,
    QueueConfig, QueueError, StreamSink,
};

/// Passive FIFO queue. Pushed into from upstream, popped from downstream.
///
/// A full queue drops the incoming packet and reports it; it never blocks.
#[derive(Debug)]
pub struct PacketQueue {
    name: String,
    capacity: Option<usize>,
    packets: VecDeque<Packet>,
    events: Notifications,
}

impl PacketQueue {
    /// Create a queue from configuration.
    pub fn new(config: &QueueConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            name: config.name.clone(),
            capacity: config.capacity,
            packets: VecDeque::new(),
            events: Notifications::new(),
        })
    }

    /// An unbounded queue.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: None,
            packets: VecDeque::new(),
            events: Notifications::new(),
        }
    }

    /// Queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of packets, if bounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Number of queued packets.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Check if at capacity.
    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.packets.len() >= cap)
    }

    /// Take pending notifications.
    pub fn drain_events(&mut self) -> Vec<LinkEvent> {
        self.events.drain()
    }

    /// Pending notifications.
    pub fn events(&self) -> &Notifications {
        &self.events
    }

    fn enqueue(&mut self, packet: Packet) {
        if self.is_full() {
            tracing::debug!(queue = %self.name, %packet, "queue full, dropping packet");
            self.events.emit(LinkEvent::PacketDropped {
                component: self.name.clone(),
                packet,
                reason: DropReason::QueueOverflow,
                limit: self.capacity,
            });
            return;
        }
        tracing::debug!(queue = %self.name, %packet, len = self.packets.len() + 1, "packet queued");
        self.packets.push_back(packet);
    }
}

impl PacketSink for PacketQueue {
    fn can_push(&self) -> bool {
        !self.is_full()
    }

    fn push(&mut self, packet: Packet) {
        self.enqueue(packet);
    }
}

impl StreamSink for PacketQueue {
    fn push_start(&mut self, packet: Packet) {
        tracing::trace!(queue = %self.name, %packet, "packet arriving");
    }

    fn push_progress(&mut self, packet: Packet, position: u64) {
        tracing::trace!(queue = %self.name, %packet, position, "packet progress");
    }

    fn push_end(&mut self, packet: Packet) {
        self.enqueue(packet);
    }
}

impl PassiveSource for PacketQueue {
    fn can_pop_some(&self) -> bool {
        !self.packets.is_empty()
    }

    fn can_pop(&self) -> Option<&Packet> {
        self.packets.front()
    }

    fn pop(&mut self) -> Result<Packet, QueueError> {
        self.packets.pop_front().ok_or_else(|| QueueError::Empty {
            component: self.name.clone(),
        })
    }
}

impl PacketProcessor for PacketQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self, port: Port) -> Option<Capabilities> {
        match port {
            Port::Input => Some(
                EndpointKind::PushSink
                    .capabilities()
                    .union(EndpointKind::StreamingSink.capabilities()),
            ),
            Port::Output(0) => Some(EndpointKind::PullSource.capabilities()),
            Port::Output(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(hex_payload: &str) -> Packet {
        Packet::new(hex_payload, hex::decode(hex_payload).unwrap())
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = PacketQueue::unbounded("q");
        queue.push(packet("01"));
        queue.push_end(packet("02"));

        assert_eq!(queue.can_pop().map(Packet::name), Some("01"));
        assert_eq!(queue.pop().unwrap().data(), [0x01]);
        assert_eq!(queue.pop().unwrap().data(), [0x02]);
        assert_eq!(
            queue.pop(),
            Err(QueueError::Empty {
                component: "q".into()
            })
        );
    }

    #[test]
    fn test_overflow_drops_with_limit() {
        let config = QueueConfig {
            capacity: Some(1),
            ..Default::default()
        };
        let mut queue = PacketQueue::new(&config).unwrap();
        queue.push(packet("aa"));
        assert!(!queue.can_push());
        queue.push(packet("bb"));

        assert_eq!(queue.len(), 1);
        let events = queue.drain_events();
        assert_eq!(
            events,
            vec![LinkEvent::PacketDropped {
                component: "queue".into(),
                packet: packet("bb"),
                reason: DropReason::QueueOverflow,
                limit: Some(1),
            }]
        );
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = QueueConfig {
            capacity: Some(0),
            ..Default::default()
        };
        assert_eq!(PacketQueue::new(&config).unwrap_err(), ConfigError::ZeroCapacity);
    }

    #[test]
    fn test_stream_start_does_not_enqueue() {
        let mut queue = PacketQueue::unbounded("q");
        queue.push_start(packet("01"));
        queue.push_progress(packet("01"), 4);
        assert!(queue.is_empty());
        queue.push_end(packet("01"));
        assert_eq!(queue.len(), 1);
    }
}
