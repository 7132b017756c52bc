//! ARP header view (Ethernet/IPv4 only)

use crate::{Error, Result};
use std::net::Ipv4Addr;

pub const ARP_PACKET_SIZE: usize = 28;

#[cfg(test)]
pub(crate) const OPERATION_REQUEST: u16 = 1;
#[cfg(test)]
pub(crate) const OPERATION_REPLY: u16 = 2;

/// Fields of an ARP packet that take part in a flow match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpPacket {
    pub operation: u16,
    pub sender_ip: Ipv4Addr,
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < ARP_PACKET_SIZE {
            return Err(Error::Parse("ARP packet too short".into()));
        }

        let hw_type = u16::from_be_bytes([data[0], data[1]]);
        let proto_type = u16::from_be_bytes([data[2], data[3]]);
        if hw_type != 1 || proto_type != 0x0800 || data[4] != 6 || data[5] != 4 {
            return Err(Error::Parse("unsupported ARP hardware/protocol".into()));
        }

        Ok(Self {
            operation: u16::from_be_bytes([data[6], data[7]]),
            sender_ip: Ipv4Addr::new(data[14], data[15], data[16], data[17]),
            target_ip: Ipv4Addr::new(data[24], data[25], data[26], data[27]),
        })
    }

    /// Serialize a request/reply with the given hardware addresses
    #[cfg(test)]
    pub(crate) fn to_bytes(&self, sender_mac: [u8; 6], target_mac: [u8; 6]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ARP_PACKET_SIZE);
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&0x0800u16.to_be_bytes());
        buf.push(6);
        buf.push(4);
        buf.extend_from_slice(&self.operation.to_be_bytes());
        buf.extend_from_slice(&sender_mac);
        buf.extend_from_slice(&self.sender_ip.octets());
        buf.extend_from_slice(&target_mac);
        buf.extend_from_slice(&self.target_ip.octets());
        buf
    }
}
