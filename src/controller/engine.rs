//! Per-switch forwarding decisions
//!
//! One `L2Switch` exists per switch connection. For every packet-in it:
//! 1. learns the source address on the ingress port,
//! 2. drops untrusted -> protected traffic,
//! 3. floods multicast and unknown destinations,
//! 4. drops frames whose destination sits behind the ingress port,
//! 5. otherwise forwards to the learned port and installs a rule.

use super::mac_table::MacTable;
use super::policy::PolicyFilter;
use crate::openflow::{DatapathId, PacketIn, PortNo, PORT_MAX};
use crate::protocol::ethernet::Frame;
use crate::protocol::MacAddr;
use crate::{Error, Result};
use tracing::{debug, trace, warn};

/// Why a frame is discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Untrusted source addressing a protected destination
    Policy,
    /// Destination learned on the ingress port
    SamePort,
}

/// Result of a forwarding decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Out every port except the ingress port
    Flood,
    /// Explicitly discard the buffered frame
    Drop(DropReason),
    /// Out `port`; with `install_rule` the switch also gets a flow entry
    Forward { port: PortNo, install_rule: bool },
}

/// A parsed packet-in, valid for one decision
#[derive(Debug, Clone, Copy)]
pub struct PacketEvent<'a> {
    pub dpid: DatapathId,
    pub src: MacAddr,
    pub dst: MacAddr,
    pub in_port: PortNo,
    pub frame: Frame<'a>,
    pub packet_in: &'a PacketIn,
}

impl<'a> PacketEvent<'a> {
    /// Extract addresses and ingress port from a packet-in
    pub fn from_packet_in(dpid: DatapathId, packet_in: &'a PacketIn) -> Result<Self> {
        let in_port = packet_in.in_port;
        if in_port == 0 || in_port >= PORT_MAX {
            return Err(Error::MalformedPacket(format!(
                "ingress port 0x{:04x} is not a physical port",
                in_port
            )));
        }

        let frame = Frame::parse(&packet_in.data)
            .map_err(|e| Error::MalformedPacket(format!("{} on port {}", e, in_port)))?;

        Ok(Self {
            dpid,
            src: frame.src_mac(),
            dst: frame.dst_mac(),
            in_port,
            frame,
            packet_in,
        })
    }
}

/// Decision engine bound to one switch
#[derive(Debug)]
pub struct L2Switch {
    dpid: DatapathId,
    mac_table: MacTable,
    policy: PolicyFilter,
}

impl L2Switch {
    pub fn new(dpid: DatapathId, policy: PolicyFilter) -> Self {
        Self {
            dpid,
            mac_table: MacTable::new(),
            policy,
        }
    }

    pub fn dpid(&self) -> DatapathId {
        self.dpid
    }

    pub fn mac_table(&self) -> &MacTable {
        &self.mac_table
    }

    /// Decide what to do with one frame
    ///
    /// The source is learned before anything else, so even frames dropped
    /// by policy update the table.
    pub fn handle_packet(&mut self, event: &PacketEvent<'_>) -> Action {
        trace!(
            "pkt: src {} dst {} port {} on {}",
            event.src,
            event.dst,
            event.in_port,
            self.dpid
        );

        if let Some(previous) = self.mac_table.learn(event.src, event.in_port) {
            debug!(
                "{} moved from port {} to port {} on {}",
                event.src, previous, event.in_port, self.dpid
            );
        }

        if self.policy.is_blocked(&event.src, &event.dst) {
            warn!(
                "Dropping packet on {}: untrusted source {} trying to reach protected host {}",
                self.dpid, event.src, event.dst
            );
            return Action::Drop(DropReason::Policy);
        }

        if event.dst.is_multicast() {
            trace!("Destination {} is multicast, flooding", event.dst);
            return Action::Flood;
        }

        match self.mac_table.lookup(&event.dst) {
            None => {
                trace!("Port for {} unknown, flooding", event.dst);
                Action::Flood
            }
            Some(port) if port == event.in_port => {
                debug!(
                    "Dropping {} -> {} on {}.{}: destination is behind the ingress port",
                    event.src, event.dst, self.dpid, port
                );
                Action::Drop(DropReason::SamePort)
            }
            Some(port) => {
                debug!(
                    "Forwarding {}.{} to {}.{}",
                    event.src, event.in_port, event.dst, port
                );
                Action::Forward {
                    port,
                    install_rule: true,
                }
            }
        }
    }
}
