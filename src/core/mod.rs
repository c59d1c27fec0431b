//! Core types shared by every linkflow component.
//!
//! - [`SimTime`] / [`ClockTime`]: fixed-point time on the global and logical timelines
//! - [`Packet`] and [`Datarate`]: the unit of work and the rate it moves at
//! - collaborator traits: [`PacketProducer`], [`PacketSink`], [`StreamSink`],
//!   [`PassiveSource`], [`PacketCollector`]
//! - [`LinkEvent`] notifications and the per-component [`Notifications`] outbox
//! - configuration structs and error types

pub mod config;
pub mod constants;
mod error;
mod event;
mod packet;
mod time;
mod traits;
mod units;

pub use config::{
    ChannelConfig, ClockConfig, LinkConfig, QueueConfig, ReceiverConfig, TransmitterConfig,
};
pub use error::*;
pub use event::*;
pub use packet::*;
pub use time::*;
pub use traits::*;
pub use units::*;
