//! Scripted event traces
//!
//! A trace is a TOML list of connection and packet-in events standing in
//! for a live controller platform. Replaying one drives the real controller
//! loop and collects every instruction it emits.
//!
//! ```toml
//! [[event]]
//! kind = "connection_up"
//! connection = 1
//! dpid = 4
//!
//! [[event]]
//! kind = "packet_in"
//! connection = 1
//! in_port = 1
//! src = "00:00:00:00:00:01"
//! dst = "ff:ff:ff:ff:ff:ff"
//! ethertype = 0x0806
//! ```

use crate::config::Config;
use crate::controller::{
    ChannelConnection, ConnectionId, Controller, ControllerEvent, Outbound,
};
use crate::openflow::{DatapathId, PacketIn, PortNo};
use crate::protocol::ethernet::FrameBuilder;
use crate::protocol::{MacAddr, VlanTag};
use crate::telemetry::MetricsRegistry;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Payload length giving a minimum-size Ethernet frame
const DEFAULT_PAYLOAD_LEN: usize = 46;
const DEFAULT_ETHERTYPE: u16 = 0x0800;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Trace {
    #[serde(default, rename = "event")]
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    ConnectionUp {
        connection: u64,
        dpid: u64,
    },
    PacketIn {
        connection: u64,
        in_port: PortNo,
        #[serde(default)]
        src: Option<String>,
        #[serde(default)]
        dst: Option<String>,
        #[serde(default)]
        ethertype: Option<u16>,
        #[serde(default)]
        vlan: Option<u16>,
        #[serde(default)]
        buffer_id: Option<u32>,
        #[serde(default)]
        payload_len: Option<usize>,
        /// Literal frame bytes in hex; overrides the fields above
        #[serde(default)]
        raw: Option<String>,
    },
    ConnectionDown {
        connection: u64,
    },
}

/// Everything a replay produced
#[derive(Debug)]
pub struct ReplayReport {
    pub outbound: Vec<Outbound>,
    pub metrics: Vec<(String, u64)>,
}

impl Trace {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Parse(format!("trace: {}", e)))
    }
}

impl TraceEvent {
    fn into_controller_event(
        self,
        index: usize,
        out_tx: &mpsc::UnboundedSender<Outbound>,
    ) -> Result<ControllerEvent> {
        match self {
            TraceEvent::ConnectionUp { connection, dpid } => {
                Ok(ControllerEvent::ConnectionUp(Box::new(ChannelConnection::new(
                    ConnectionId(connection),
                    DatapathId(dpid),
                    out_tx.clone(),
                ))))
            }
            TraceEvent::ConnectionDown { connection } => {
                Ok(ControllerEvent::ConnectionDown(ConnectionId(connection)))
            }
            TraceEvent::PacketIn {
                connection,
                in_port,
                src,
                dst,
                ethertype,
                vlan,
                buffer_id,
                payload_len,
                raw,
            } => {
                let data = match raw {
                    Some(hex) => decode_hex(&hex)
                        .ok_or_else(|| Error::Parse(format!("event[{}]: bad raw hex", index)))?,
                    None => {
                        let src = parse_mac(index, "src", src)?;
                        let dst = parse_mac(index, "dst", dst)?;
                        let mut builder = FrameBuilder::new().dst_mac(dst).src_mac(src);
                        if let Some(vid) = vlan {
                            builder = builder.vlan_tag(VlanTag::new(vid));
                        }
                        builder
                            .ethertype(ethertype.unwrap_or(DEFAULT_ETHERTYPE))
                            .payload(&vec![0u8; payload_len.unwrap_or(DEFAULT_PAYLOAD_LEN)])
                            .build()
                    }
                };

                let packet = match buffer_id {
                    Some(id) => PacketIn::new(in_port, data).with_buffer(id),
                    None => PacketIn::new(in_port, data),
                };
                Ok(ControllerEvent::PacketIn {
                    connection: ConnectionId(connection),
                    packet,
                })
            }
        }
    }
}

fn parse_mac(index: usize, field: &str, value: Option<String>) -> Result<MacAddr> {
    let value =
        value.ok_or_else(|| Error::Parse(format!("event[{}]: missing '{}'", index, field)))?;
    value
        .parse()
        .map_err(|e| Error::Parse(format!("event[{}].{}: '{}': {}", index, field, value, e)))
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = hex
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(s, 16).ok()
        })
        .collect()
}

/// Replay `trace` through a controller configured by `config`
pub fn run(config: &Config, trace: Trace) -> Result<ReplayReport> {
    let policy = Arc::new(config.policy_list()?);
    let metrics = Arc::new(MetricsRegistry::new());

    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let events = trace
        .events
        .into_iter()
        .enumerate()
        .map(|(i, event)| event.into_controller_event(i, &out_tx))
        .collect::<Result<Vec<_>>>()?;
    drop(out_tx);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let controller = Controller::new(policy, config.rule_settings(), Arc::clone(&metrics));
    let event_count = events.len();

    runtime.block_on(async move {
        let (event_tx, event_rx) = mpsc::channel(64);
        let feed = async move {
            for event in events {
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
        };
        let (_, controller) = tokio::join!(feed, controller.run(event_rx));
        // Releases the outbound senders held by live connections
        drop(controller);
    });

    let mut outbound = Vec::new();
    while let Ok(out) = out_rx.try_recv() {
        outbound.push(out);
    }
    info!(
        "Replayed {} events, {} instructions emitted",
        event_count,
        outbound.len()
    );

    Ok(ReplayReport {
        outbound,
        metrics: metrics.export(),
    })
}
