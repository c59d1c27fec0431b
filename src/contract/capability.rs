//! Capability descriptors for pipeline endpoints.

use std::fmt;

/// A single capability an endpoint may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Active side initiates transfers (push flow control).
    Pushing,
    /// Passive side is asked for packets (pull flow control).
    Pulling,
    /// Whole packets change hands atomically.
    Passing,
    /// Packets are observed incrementally: start, progress, end.
    Streaming,
    /// Fire-and-forget sending with no flow control, e.g. onto a channel.
    Sending,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Pushing => f.write_str("pushing"),
            Capability::Pulling => f.write_str("pulling"),
            Capability::Passing => f.write_str("passing"),
            Capability::Streaming => f.write_str("streaming"),
            Capability::Sending => f.write_str("sending"),
        }
    }
}

/// The five independent capabilities of one endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// Supports push flow control.
    pub pushing: bool,
    /// Supports pull flow control.
    pub pulling: bool,
    /// Supports atomic packet passing.
    pub passing: bool,
    /// Supports incremental streaming.
    pub streaming: bool,
    /// Supports raw sending.
    pub sending: bool,
}

impl Capabilities {
    /// No capabilities at all.
    pub const NONE: Self = Self {
        pushing: false,
        pulling: false,
        passing: false,
        streaming: false,
        sending: false,
    };

    /// Raw sending only (an endpoint facing an unmanaged link).
    pub const SENDING: Self = Self {
        sending: true,
        ..Self::NONE
    };

    /// Check a single capability.
    pub const fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Pushing => self.pushing,
            Capability::Pulling => self.pulling,
            Capability::Passing => self.passing,
            Capability::Streaming => self.streaming,
            Capability::Sending => self.sending,
        }
    }

    /// Add a capability.
    pub const fn with(mut self, capability: Capability) -> Self {
        match capability {
            Capability::Pushing => self.pushing = true,
            Capability::Pulling => self.pulling = true,
            Capability::Passing => self.passing = true,
            Capability::Streaming => self.streaming = true,
            Capability::Sending => self.sending = true,
        }
        self
    }

    /// Capabilities offered by either descriptor.
    pub const fn union(self, other: Self) -> Self {
        Self {
            pushing: self.pushing || other.pushing,
            pulling: self.pulling || other.pulling,
            passing: self.passing || other.passing,
            streaming: self.streaming || other.streaming,
            sending: self.sending || other.sending,
        }
    }
}

/// The closed set of endpoint shapes a stage can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// Accepts whole packets pushed into it.
    PushSink,
    /// Pushes whole packets out.
    PushSource,
    /// Pulls whole packets from its provider.
    PullSink,
    /// Hands out whole packets when pulled.
    PullSource,
    /// Accepts packets streamed into it.
    StreamingSink,
    /// Streams packets out.
    StreamingSource,
}

impl EndpointKind {
    /// Capability descriptor of this shape.
    pub const fn capabilities(self) -> Capabilities {
        match self {
            EndpointKind::PushSink | EndpointKind::PushSource => Capabilities::NONE
                .with(Capability::Pushing)
                .with(Capability::Passing),
            EndpointKind::PullSink | EndpointKind::PullSource => Capabilities::NONE
                .with(Capability::Pulling)
                .with(Capability::Passing),
            EndpointKind::StreamingSink | EndpointKind::StreamingSource => Capabilities::NONE
                .with(Capability::Pushing)
                .with(Capability::Streaming),
        }
    }
}

impl From<EndpointKind> for Capabilities {
    fn from(kind: EndpointKind) -> Self {
        kind.capabilities()
    }
}

/// Which side of a stage an endpoint sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// Where packets enter.
    Input,
    /// Where packets leave. Stages with several outputs number them.
    Output(usize),
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Input => f.write_str("in"),
            Port::Output(i) => write!(f, "out[{i}]"),
        }
    }
}

/// One side of a connection: a named port and what it supports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Owning component.
    pub component: String,
    /// Port on the component.
    pub port: Port,
    /// What the port supports.
    pub capabilities: Capabilities,
}

impl Endpoint {
    /// Create an endpoint.
    pub fn new(component: impl Into<String>, port: Port, capabilities: impl Into<Capabilities>) -> Self {
        Self {
            component: component.into(),
            port,
            capabilities: capabilities.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.port)
    }
}

/// A pipeline stage that can describe its ports for negotiation.
pub trait PacketProcessor {
    /// Component name used in diagnostics.
    fn name(&self) -> &str;

    /// Capabilities of `port`, or `None` if the stage has no such port.
    fn capabilities(&self, port: Port) -> Option<Capabilities>;

    /// Endpoint descriptor of `port`.
    fn endpoint(&self, port: Port) -> Option<Endpoint> {
        self.capabilities(port)
            .map(|caps| Endpoint::new(self.name(), port, caps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_kinds() {
        let push = EndpointKind::PushSink.capabilities();
        assert!(push.pushing && push.passing);
        assert!(!push.pulling && !push.streaming && !push.sending);

        let pull = EndpointKind::PullSource.capabilities();
        assert!(pull.pulling && pull.passing && !pull.pushing);

        let stream = EndpointKind::StreamingSink.capabilities();
        assert!(stream.pushing && stream.streaming && !stream.passing);
    }

    #[test]
    fn test_union_and_supports() {
        let both = EndpointKind::PushSink
            .capabilities()
            .union(EndpointKind::PullSink.capabilities());
        assert!(both.supports(Capability::Pushing));
        assert!(both.supports(Capability::Pulling));
        assert!(!both.supports(Capability::Sending));
    }

    #[test]
    fn test_endpoint_display() {
        let ep = Endpoint::new("relay", Port::Output(2), EndpointKind::PullSource);
        assert_eq!(ep.to_string(), "relay.out[2]");
        assert_eq!(Capability::Streaming.to_string(), "streaming");
    }
}
