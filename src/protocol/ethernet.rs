//! Ethernet frame parsing and construction

use super::{EtherType, MacAddr, VlanTag};
use crate::{Error, Result};

/// Minimum untagged header length (no FCS)
pub const MIN_FRAME_SIZE: usize = 14;
/// Header length with one 802.1Q tag
pub const TAGGED_HEADER_SIZE: usize = 18;
/// Maximum frame size (no FCS, one tag)
pub const MAX_FRAME_SIZE: usize = 1522;

/// Parsed Ethernet frame borrowing the packet-in data
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    buffer: &'a [u8],
    dst: MacAddr,
    src: MacAddr,
    vlan_tag: Option<VlanTag>,
    ethertype: u16,
    payload_offset: usize,
}

impl<'a> Frame<'a> {
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < MIN_FRAME_SIZE {
            return Err(Error::Parse(format!(
                "frame too short ({} bytes)",
                buffer.len()
            )));
        }

        let dst = MacAddr::from_slice(&buffer[0..6])
            .ok_or_else(|| Error::Parse("missing destination address".into()))?;
        let src = MacAddr::from_slice(&buffer[6..12])
            .ok_or_else(|| Error::Parse("missing source address".into()))?;

        let outer = u16::from_be_bytes([buffer[12], buffer[13]]);
        let (vlan_tag, ethertype, payload_offset) = if outer == EtherType::Vlan as u16 {
            if buffer.len() < TAGGED_HEADER_SIZE {
                return Err(Error::Parse("VLAN frame too short".into()));
            }
            let tag = VlanTag::from_bytes([buffer[14], buffer[15]]);
            let inner = u16::from_be_bytes([buffer[16], buffer[17]]);
            (Some(tag), inner, TAGGED_HEADER_SIZE)
        } else {
            (None, outer, MIN_FRAME_SIZE)
        };

        Ok(Self {
            buffer,
            dst,
            src,
            vlan_tag,
            ethertype,
            payload_offset,
        })
    }

    pub fn dst_mac(&self) -> MacAddr {
        self.dst
    }

    pub fn src_mac(&self) -> MacAddr {
        self.src
    }

    /// EtherType after any VLAN tag
    pub fn ethertype(&self) -> u16 {
        self.ethertype
    }

    pub fn vlan_tag(&self) -> Option<VlanTag> {
        self.vlan_tag
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.buffer[self.payload_offset..]
    }
}

/// Builder for constructing Ethernet frames
pub struct FrameBuilder {
    buffer: Vec<u8>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_FRAME_SIZE),
        }
    }

    pub fn dst_mac(mut self, mac: MacAddr) -> Self {
        self.buffer.extend_from_slice(&mac.0);
        self
    }

    pub fn src_mac(mut self, mac: MacAddr) -> Self {
        self.buffer.extend_from_slice(&mac.0);
        self
    }

    pub fn vlan_tag(mut self, tag: VlanTag) -> Self {
        self.buffer
            .extend_from_slice(&(EtherType::Vlan as u16).to_be_bytes());
        self.buffer.extend_from_slice(&tag.to_bytes());
        self
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        self.buffer.extend_from_slice(&ethertype.to_be_bytes());
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.buffer.extend_from_slice(payload);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
