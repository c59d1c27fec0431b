//! linkflow demo
//!
//! Pushes a batch of packets through a simulated link and logs every
//! notification.
//!
//! Environment variables:
//! - LINKFLOW_CONFIG: path to a JSON link configuration (defaults otherwise)
//! - LINKFLOW_PACKETS: number of packets to send (default 3)
//! - LINKFLOW_PACKET_BYTES: payload size in bytes (default 1250)
//! - LINKFLOW_ABORT_AFTER_MS: abort whatever is on the wire after this many ms
//! - LINKFLOW_LOG_LEVEL: trace|debug|info|warn|error (default info)

use std::collections::VecDeque;
use std::env;
use std::fs;

use linkflow::prelude::*;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum DemoError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid {var}: {value}")]
    Env { var: &'static str, value: String },

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Hands out queued packets whenever the transmitter asks for one.
#[derive(Debug, Default)]
struct BatchProducer {
    pending: VecDeque<Packet>,
    invited: bool,
    completed: usize,
    aborted: usize,
}

impl PacketProducer for BatchProducer {
    fn handle_packet_processed(&mut self, packet: &Packet, success: bool) {
        if success {
            self.completed += 1;
        } else {
            self.aborted += 1;
        }
        info!(%packet, success, "packet processed");
    }

    fn handle_can_push_again(&mut self) {
        self.invited = true;
    }
}

fn env_number<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, DemoError> {
    match env::var(var) {
        Ok(value) => value.parse().map_err(|_| DemoError::Env { var, value }),
        Err(_) => Ok(default),
    }
}

fn load_config() -> Result<LinkConfig, DemoError> {
    let Ok(path) = env::var("LINKFLOW_CONFIG") else {
        return Ok(LinkConfig::default());
    };
    let json = fs::read_to_string(&path).map_err(|source| DemoError::Io {
        path: path.clone(),
        source,
    })?;
    LinkConfig::from_json(&json).map_err(|err| LinkError::from(err).into())
}

/// Push the next packet if the transmitter invited one.
fn feed(link: &mut Link<BatchProducer, PacketQueue>) -> Result<(), DemoError> {
    let producer = link.producer_mut();
    if !producer.invited {
        return Ok(());
    }
    let Some(packet) = producer.pending.pop_front() else {
        return Ok(());
    };
    producer.invited = false;
    link.push(packet)?;
    Ok(())
}

/// Run the link to completion, feeding the producer after every event.
///
/// With `abort_at`, whatever is on the wire at that time is aborted.
fn drive(
    link: &mut Link<BatchProducer, PacketQueue>,
    abort_at: Option<SimTime>,
) -> Result<(), DemoError> {
    feed(link)?;
    if let Some(abort_at) = abort_at {
        while link.next_event_time().is_some_and(|t| t <= abort_at) {
            link.step()?;
            feed(link)?;
        }
        link.run_until(abort_at)?;
        if link.transmitter().is_transmitting() {
            info!(transmitted = link.transmitted_length(), "aborting transmission");
            link.abort()?;
            feed(link)?;
        } else {
            info!(%abort_at, "nothing on the wire to abort");
        }
    }
    while link.step()?.is_some() {
        feed(link)?;
    }
    Ok(())
}

fn main() -> Result<(), DemoError> {
    let log_level = env::var("LINKFLOW_LOG_LEVEL").unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("linkflow={log_level},link_demo={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;
    let packets: usize = env_number("LINKFLOW_PACKETS", 3)?;
    let bytes: usize = env_number("LINKFLOW_PACKET_BYTES", 1250)?;
    let abort_after: Option<i64> = env::var("LINKFLOW_ABORT_AFTER_MS")
        .ok()
        .map(|value| {
            value.parse().map_err(|_| DemoError::Env {
                var: "LINKFLOW_ABORT_AFTER_MS",
                value,
            })
        })
        .transpose()?;

    let producer = BatchProducer {
        pending: (0..packets)
            .map(|i| Packet::new(format!("packet-{i}"), vec![i as u8; bytes]))
            .collect(),
        ..Default::default()
    };
    let mut link = Link::new(&config, producer, PacketQueue::unbounded("sink"))?;
    info!(
        datarate = %link.transmitter().datarate(),
        delay = %link.channel().delay(),
        packets,
        "link ready"
    );

    link.start()?;
    drive(&mut link, abort_after.map(SimTime::from_millis))?;

    for event in link.drain_events() {
        info!(?event, "notification");
    }
    let (producer, sink) = link.close()?;
    info!(
        delivered = sink.len(),
        completed = producer.completed,
        aborted = producer.aborted,
        "done"
    );
    Ok(())
}
