//! Pull-driven fan-out from one passive source to many collectors.
//!
//! The relay holds no packets. Pops on any output go straight to the
//! provider; availability announcements from the provider are forwarded to
//! each registered collector in registration order until the provider runs
//! dry.

use std::fmt;

use thiserror::Error;

use crate::contract::{Capabilities, EndpointKind, PacketProcessor, Port};
use crate::core::{Packet, PacketCollector, PassiveSource, QueueError};

/// Handle of a relay output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(usize);

impl OutputId {
    /// Output port index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "out[{}]", self.0)
    }
}

/// Flow relay errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The output is not registered.
    #[error("{component}: unknown output {output}")]
    UnknownOutput {
        /// Relay name.
        component: String,
        /// The offending output.
        output: OutputId,
    },

    /// The provider refused the pop.
    #[error(transparent)]
    Source(#[from] QueueError),
}

/// One relay output as seen by its collector.
struct RelayOutput<'a, P> {
    provider: &'a mut P,
}

impl<P: PassiveSource> PassiveSource for RelayOutput<'_, P> {
    fn can_pop_some(&self) -> bool {
        self.provider.can_pop_some()
    }

    fn can_pop(&self) -> Option<&Packet> {
        self.provider.can_pop()
    }

    fn pop(&mut self) -> Result<Packet, QueueError> {
        self.provider.pop()
    }
}

/// Demultiplexer translating one pullable provider into many pull outputs.
pub struct FlowRelay<P> {
    name: String,
    provider: P,
    collectors: Vec<Option<Box<dyn PacketCollector>>>,
}

impl<P: PassiveSource> FlowRelay<P> {
    /// Create a relay in front of `provider`.
    pub fn new(name: impl Into<String>, provider: P) -> Self {
        Self {
            name: name.into(),
            provider,
            collectors: Vec::new(),
        }
    }

    /// Relay name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a collector on a new output.
    pub fn add_output(&mut self, collector: Box<dyn PacketCollector>) -> OutputId {
        let id = OutputId(self.collectors.len());
        self.collectors.push(Some(collector));
        tracing::debug!(relay = %self.name, output = %id, "output added");
        id
    }

    /// Unregister the collector on `output` and hand it back.
    pub fn remove_output(
        &mut self,
        output: OutputId,
    ) -> Result<Box<dyn PacketCollector>, RelayError> {
        self.collectors
            .get_mut(output.0)
            .and_then(Option::take)
            .ok_or_else(|| self.unknown(output))
    }

    /// Number of registered outputs.
    pub fn output_count(&self) -> usize {
        self.collectors.iter().flatten().count()
    }

    /// Check if `output` is registered.
    pub fn has_output(&self, output: OutputId) -> bool {
        matches!(self.collectors.get(output.0), Some(Some(_)))
    }

    /// Check if `output` could pop at least one packet.
    pub fn can_pop_some(&self, output: OutputId) -> Result<bool, RelayError> {
        self.check_output(output)?;
        Ok(self.provider.can_pop_some())
    }

    /// Peek at the packet `output` would pop next.
    pub fn can_pop(&self, output: OutputId) -> Result<Option<&Packet>, RelayError> {
        self.check_output(output)?;
        Ok(self.provider.can_pop())
    }

    /// Pop the provider's next packet on behalf of `output`.
    pub fn pop(&mut self, output: OutputId) -> Result<Packet, RelayError> {
        self.check_output(output)?;
        let packet = self.provider.pop()?;
        tracing::debug!(relay = %self.name, %output, %packet, "packet relayed");
        Ok(packet)
    }

    /// The provider announced packets: let collectors pull.
    ///
    /// Collectors are asked in registration order; asking stops once the
    /// provider is empty.
    pub fn handle_can_pop(&mut self) {
        for collector in self.collectors.iter_mut().flatten() {
            if !self.provider.can_pop_some() {
                break;
            }
            let mut output = RelayOutput {
                provider: &mut self.provider,
            };
            collector.handle_can_pop(&mut output);
        }
    }

    /// The provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The provider, mutably; used to feed it.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Take the provider back, dropping all collectors.
    pub fn into_provider(self) -> P {
        self.provider
    }

    fn check_output(&self, output: OutputId) -> Result<(), RelayError> {
        if self.has_output(output) {
            Ok(())
        } else {
            Err(self.unknown(output))
        }
    }

    fn unknown(&self, output: OutputId) -> RelayError {
        RelayError::UnknownOutput {
            component: self.name.clone(),
            output,
        }
    }
}

impl<P> fmt::Debug for FlowRelay<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowRelay")
            .field("name", &self.name)
            .field("outputs", &self.collectors.iter().flatten().count())
            .finish_non_exhaustive()
    }
}

impl<P: PassiveSource> PacketProcessor for FlowRelay<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self, port: Port) -> Option<Capabilities> {
        match port {
            Port::Input => Some(EndpointKind::PullSink.capabilities()),
            Port::Output(index) if self.has_output(OutputId(index)) => {
                Some(EndpointKind::PullSource.capabilities())
            }
            Port::Output(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::contract::{Endpoint, validate};
    use crate::core::PacketSink;
    use crate::queueing::PacketQueue;

    /// Collector that pulls at most `budget` packets per announcement.
    struct Greedy {
        name: &'static str,
        budget: usize,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl PacketCollector for Greedy {
        fn handle_can_pop(&mut self, source: &mut dyn PassiveSource) {
            for _ in 0..self.budget {
                if !source.can_pop_some() {
                    break;
                }
                let packet = source.pop().unwrap();
                self.log
                    .borrow_mut()
                    .push(format!("{}:{}", self.name, packet.name()));
            }
        }
    }

    fn relay_with(packets: &[&str]) -> FlowRelay<PacketQueue> {
        let mut queue = PacketQueue::unbounded("q");
        for name in packets {
            queue.push(Packet::with_bit_length(*name, 8));
        }
        FlowRelay::new("relay", queue)
    }

    #[test]
    fn test_pop_delegates_without_buffering() {
        let mut relay = relay_with(&["a", "b"]);
        let log = Rc::new(RefCell::new(Vec::new()));
        let out = relay.add_output(Box::new(Greedy {
            name: "x",
            budget: 0,
            log,
        }));

        assert_eq!(relay.can_pop(out).unwrap().map(Packet::name), Some("a"));
        assert_eq!(relay.pop(out).unwrap().name(), "a");
        assert_eq!(relay.provider().len(), 1);
        assert_eq!(relay.pop(out).unwrap().name(), "b");
        assert!(!relay.can_pop_some(out).unwrap());
        assert!(matches!(relay.pop(out), Err(RelayError::Source(_))));
    }

    #[test]
    fn test_fan_out_stops_when_dry() {
        let mut relay = relay_with(&["a", "b", "c"]);
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, budget) in [("x", 2), ("y", 2), ("z", 2)] {
            relay.add_output(Box::new(Greedy {
                name,
                budget,
                log: Rc::clone(&log),
            }));
        }

        relay.handle_can_pop();
        assert_eq!(*log.borrow(), ["x:a", "x:b", "y:c"]);
        assert!(relay.provider().is_empty());
    }

    #[test]
    fn test_unknown_output() {
        let mut relay = relay_with(&["a"]);
        let log = Rc::new(RefCell::new(Vec::new()));
        let out = relay.add_output(Box::new(Greedy {
            name: "x",
            budget: 1,
            log,
        }));
        relay.remove_output(out).unwrap();

        assert_eq!(
            relay.pop(out),
            Err(RelayError::UnknownOutput {
                component: "relay".into(),
                output: out,
            })
        );
        assert!(relay.remove_output(out).is_err());
        assert_eq!(relay.output_count(), 0);
        // The packet is still with the provider.
        assert_eq!(relay.provider().len(), 1);
    }

    #[test]
    fn test_relay_output_wires_to_collector() {
        let mut relay = relay_with(&[]);
        let log = Rc::new(RefCell::new(Vec::new()));
        relay.add_output(Box::new(Greedy {
            name: "x",
            budget: 1,
            log,
        }));

        let out = relay.endpoint(Port::Output(0)).unwrap();
        let collector = Endpoint::new("x", Port::Input, EndpointKind::PullSink);
        assert!(validate(Some(&out), Some(&collector)).is_ok());
        assert!(relay.endpoint(Port::Output(1)).is_none());
    }
}
