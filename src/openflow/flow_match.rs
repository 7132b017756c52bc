//! Exact-match flow rule built from a packet's headers
//!
//! Mirrors the OpenFlow 1.0 match: every field present in the frame is
//! matched exactly, fields the frame does not carry stay wildcarded.

use super::PortNo;
use crate::protocol::arp::ArpPacket;
use crate::protocol::ethernet::Frame;
use crate::protocol::ipv4::Ipv4Header;
use crate::protocol::{EtherType, MacAddr};
use std::fmt;
use std::net::Ipv4Addr;

/// `dl_vlan` value for untagged frames
pub const VLAN_NONE: u16 = 0xffff;

/// `None` means wildcarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowMatch {
    pub in_port: Option<PortNo>,
    pub dl_src: Option<MacAddr>,
    pub dl_dst: Option<MacAddr>,
    pub dl_vlan: Option<u16>,
    pub dl_vlan_pcp: Option<u8>,
    pub dl_type: Option<u16>,
    pub nw_tos: Option<u8>,
    pub nw_proto: Option<u8>,
    pub nw_src: Option<Ipv4Addr>,
    pub nw_dst: Option<Ipv4Addr>,
    pub tp_src: Option<u16>,
    pub tp_dst: Option<u16>,
}

impl FlowMatch {
    /// Exact match for `frame` as received on `in_port`
    ///
    /// Network and transport fields that cannot be parsed are left
    /// wildcarded; the L2 fields are always exact.
    pub fn from_frame(in_port: PortNo, frame: &Frame<'_>) -> Self {
        let mut flow_match = Self {
            in_port: Some(in_port),
            dl_src: Some(frame.src_mac()),
            dl_dst: Some(frame.dst_mac()),
            dl_vlan: Some(frame.vlan_tag().map_or(VLAN_NONE, |tag| tag.vid)),
            dl_vlan_pcp: Some(frame.vlan_tag().map_or(0, |tag| tag.pcp)),
            dl_type: Some(frame.ethertype()),
            ..Self::default()
        };

        match EtherType::from_u16(frame.ethertype()) {
            Some(EtherType::Ipv4) => flow_match.fill_ipv4(frame.payload()),
            Some(EtherType::Arp) => flow_match.fill_arp(frame.payload()),
            _ => {}
        }

        flow_match
    }

    fn fill_ipv4(&mut self, packet: &[u8]) {
        let Ok(header) = Ipv4Header::parse(packet) else {
            return;
        };
        self.nw_tos = Some(header.tos);
        self.nw_proto = Some(header.protocol);
        self.nw_src = Some(header.src);
        self.nw_dst = Some(header.dst);
        if let Some(ports) = header.transport_ports(packet) {
            self.tp_src = Some(ports.src);
            self.tp_dst = Some(ports.dst);
        }
    }

    fn fill_arp(&mut self, packet: &[u8]) {
        let Ok(arp) = ArpPacket::parse(packet) else {
            return;
        };
        // OpenFlow 1.0 carries the ARP opcode in the low byte of nw_proto
        self.nw_proto = Some((arp.operation & 0xff) as u8);
        self.nw_src = Some(arp.sender_ip);
        self.nw_dst = Some(arp.target_ip);
    }
}

impl fmt::Display for FlowMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if let Some(port) = self.in_port {
            fields.push(format!("in_port={}", port));
        }
        if let Some(mac) = self.dl_src {
            fields.push(format!("dl_src={}", mac));
        }
        if let Some(mac) = self.dl_dst {
            fields.push(format!("dl_dst={}", mac));
        }
        if let Some(vlan) = self.dl_vlan.filter(|&v| v != VLAN_NONE) {
            fields.push(format!("dl_vlan={}", vlan));
        }
        if let Some(ty) = self.dl_type {
            fields.push(format!("dl_type=0x{:04x}", ty));
        }
        if let Some(proto) = self.nw_proto {
            fields.push(format!("nw_proto={}", proto));
        }
        if let Some(ip) = self.nw_src {
            fields.push(format!("nw_src={}", ip));
        }
        if let Some(ip) = self.nw_dst {
            fields.push(format!("nw_dst={}", ip));
        }
        if let Some(port) = self.tp_src {
            fields.push(format!("tp_src={}", port));
        }
        if let Some(port) = self.tp_dst {
            fields.push(format!("tp_dst={}", port));
        }
        if fields.is_empty() {
            return f.write_str("*");
        }
        f.write_str(&fields.join(","))
    }
}
