//! Wiring-time compatibility checks between adjacent stages.
//!
//! Two orthogonal checks apply to every connection with a managed endpoint on
//! both sides:
//!
//! - flow control: both push, or both pull
//! - granularity: both pass whole packets, or both stream
//!
//! A connection with only one managed endpoint faces an unmanaged link (a
//! channel) and needs raw sending on that endpoint instead.

use thiserror::Error;

use super::capability::{Capability, Endpoint};

/// Wiring-time incompatibility between two endpoints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// One side lacks a capability the other side requires.
    #[error("{endpoint} doesn't support packet {capability} (required by {peer})")]
    Unsupported {
        /// Endpoint missing the capability.
        endpoint: String,
        /// Endpoint requiring it.
        peer: String,
        /// The missing capability.
        capability: Capability,
    },

    /// Neither side offers any flow control.
    #[error("neither {start} nor {end} supports packet pushing or packet pulling")]
    NoFlowControl {
        /// Upstream endpoint.
        start: String,
        /// Downstream endpoint.
        end: String,
    },

    /// Neither side offers any payload granularity.
    #[error("neither {start} nor {end} supports packet passing or packet streaming")]
    NoGranularity {
        /// Upstream endpoint.
        start: String,
        /// Downstream endpoint.
        end: String,
    },

    /// Endpoint facing an unmanaged link cannot send.
    #[error("{endpoint} doesn't support packet sending")]
    SendingUnsupported {
        /// Offending endpoint.
        endpoint: String,
    },

    /// Connection with no managed endpoint on either side.
    #[error("cannot check a connection with no endpoints")]
    Unconnected,
}

/// Validate one directed connection from `start` (upstream) to `end`
/// (downstream). `None` stands for an unmanaged link.
pub fn validate(start: Option<&Endpoint>, end: Option<&Endpoint>) -> Result<(), CapabilityError> {
    match (start, end) {
        (Some(start), Some(end)) => {
            check_pair(start, end, Capability::Pushing, Capability::Pulling).map_err(|missing| {
                missing.unwrap_or_else(|| CapabilityError::NoFlowControl {
                    start: start.to_string(),
                    end: end.to_string(),
                })
            })?;
            check_pair(start, end, Capability::Passing, Capability::Streaming).map_err(|missing| {
                missing.unwrap_or_else(|| CapabilityError::NoGranularity {
                    start: start.to_string(),
                    end: end.to_string(),
                })
            })
        }
        (Some(single), None) | (None, Some(single)) => {
            if single.capabilities.sending {
                Ok(())
            } else {
                Err(CapabilityError::SendingUnsupported {
                    endpoint: single.to_string(),
                })
            }
        }
        (None, None) => Err(CapabilityError::Unconnected),
    }
}

/// Check one dimension with alternatives `a` and `b`.
///
/// `Err(Some(..))` names the side lacking what the other offers; `Err(None)`
/// means neither side offers either alternative.
fn check_pair(
    start: &Endpoint,
    end: &Endpoint,
    a: Capability,
    b: Capability,
) -> Result<(), Option<CapabilityError>> {
    let (s, e) = (&start.capabilities, &end.capabilities);
    if (s.supports(a) && e.supports(a)) || (s.supports(b) && e.supports(b)) {
        return Ok(());
    }
    for capability in [a, b] {
        if s.supports(capability) || e.supports(capability) {
            let (lacking, requiring) = if s.supports(capability) {
                (end, start)
            } else {
                (start, end)
            };
            return Err(Some(CapabilityError::Unsupported {
                endpoint: lacking.to_string(),
                peer: requiring.to_string(),
                capability,
            }));
        }
    }
    Err(None)
}

/// Connections collected during structural setup, validated once before any
/// traffic flows.
#[derive(Debug, Clone, Default)]
pub struct Wiring {
    connections: Vec<(Option<Endpoint>, Option<Endpoint>)>,
}

impl Wiring {
    /// Create an empty wiring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection from `start` to `end`.
    pub fn connect(mut self, start: Option<Endpoint>, end: Option<Endpoint>) -> Self {
        self.connections.push((start, end));
        self
    }

    /// Number of recorded connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if no connection was recorded.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Validate every connection in order, failing on the first mismatch.
    pub fn validate(&self) -> Result<(), CapabilityError> {
        for (start, end) in &self.connections {
            validate(start.as_ref(), end.as_ref())?;
        }
        tracing::debug!(connections = self.connections.len(), "wiring validated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Capabilities, EndpointKind, Port};

    fn ep(name: &str, caps: impl Into<Capabilities>) -> Endpoint {
        Endpoint::new(name, Port::Input, caps)
    }

    #[test]
    fn test_push_to_pull_fails() {
        let start = ep("src", EndpointKind::PushSource);
        let end = ep("dst", EndpointKind::PullSink);

        let err = validate(Some(&start), Some(&end)).unwrap_err();
        assert_eq!(
            err,
            CapabilityError::Unsupported {
                endpoint: "dst.in".into(),
                peer: "src.in".into(),
                capability: Capability::Pushing,
            }
        );
    }

    #[test]
    fn test_push_pull_both_matches_either() {
        let both = EndpointKind::PushSink
            .capabilities()
            .union(EndpointKind::PullSink.capabilities());
        let any = ep("any", both);

        assert!(validate(Some(&ep("push", EndpointKind::PushSource)), Some(&any)).is_ok());
        assert!(validate(Some(&ep("pull", EndpointKind::PullSource)), Some(&any)).is_ok());
        assert!(validate(Some(&any), Some(&ep("push", EndpointKind::PushSink))).is_ok());
    }

    #[test]
    fn test_lacking_side_is_named() {
        // Downstream offers pulling that upstream lacks.
        let start = ep("src", Capabilities::NONE.with(Capability::Passing));
        let end = ep("dst", EndpointKind::PullSink);

        let err = validate(Some(&start), Some(&end)).unwrap_err();
        assert!(matches!(
            err,
            CapabilityError::Unsupported { ref endpoint, capability: Capability::Pulling, .. }
                if endpoint == "src.in"
        ));
    }

    #[test]
    fn test_no_flow_control() {
        let caps = Capabilities::NONE.with(Capability::Passing);
        let err = validate(Some(&ep("a", caps)), Some(&ep("b", caps))).unwrap_err();
        assert!(matches!(err, CapabilityError::NoFlowControl { .. }));
    }

    #[test]
    fn test_flow_ok_granularity_fails() {
        let start = ep("src", EndpointKind::PushSource);
        let end = ep("dst", EndpointKind::StreamingSink);

        let err = validate(Some(&start), Some(&end)).unwrap_err();
        assert_eq!(
            err,
            CapabilityError::Unsupported {
                endpoint: "dst.in".into(),
                peer: "src.in".into(),
                capability: Capability::Passing,
            }
        );
    }

    #[test]
    fn test_no_granularity() {
        let caps = Capabilities::NONE.with(Capability::Pushing);
        let err = validate(Some(&ep("a", caps)), Some(&ep("b", caps))).unwrap_err();
        assert!(matches!(err, CapabilityError::NoGranularity { .. }));
    }

    #[test]
    fn test_one_sided_requires_sending() {
        let sender = ep("tx", Capabilities::SENDING);
        let pusher = ep("q", EndpointKind::PushSource);

        assert!(validate(Some(&sender), None).is_ok());
        assert!(validate(None, Some(&sender)).is_ok());
        assert_eq!(
            validate(Some(&pusher), None),
            Err(CapabilityError::SendingUnsupported {
                endpoint: "q.in".into()
            })
        );
        assert_eq!(validate(None, None), Err(CapabilityError::Unconnected));
    }

    #[test]
    fn test_wiring_reports_first_error() {
        let wiring = Wiring::new()
            .connect(
                Some(ep("a", EndpointKind::PushSource)),
                Some(ep("b", EndpointKind::PushSink)),
            )
            .connect(
                Some(ep("c", EndpointKind::PullSource)),
                Some(ep("d", EndpointKind::PushSink)),
            )
            .connect(None, None);

        assert_eq!(wiring.len(), 3);
        assert!(matches!(
            wiring.validate(),
            Err(CapabilityError::Unsupported { ref endpoint, .. }) if endpoint == "c.in"
        ));
    }
}
