//! Capability negotiation between pipeline stages.
//!
//! Each stage describes its ports with a [`Capabilities`] descriptor (usually
//! from the closed [`EndpointKind`] set). During structural setup every
//! connection is checked once with [`validate`] (or collected into a
//! [`Wiring`]), turning a whole class of runtime mismatches into a single
//! early diagnostic.

mod capability;
mod negotiation;

pub use capability::{Capabilities, Capability, Endpoint, EndpointKind, PacketProcessor, Port};
pub use negotiation::{validate, CapabilityError, Wiring};
