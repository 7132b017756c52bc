//! Packet-in, packet-out and flow-mod messages

use super::FlowMatch;
use std::fmt;

/// Switch-local port number
pub type PortNo = u16;

/// Switch buffer holding a packet-in frame
pub type BufferId = u32;

/// Highest physical port number (exclusive)
pub const PORT_MAX: PortNo = 0xff00;

/// OpenFlow 1.0 default flow priority
pub const DEFAULT_PRIORITY: u16 = 0x8000;

/// 64-bit datapath identifier of a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DatapathId(pub u64);

impl fmt::Display for DatapathId {
    /// Six dash-separated octets, the usual controller notation
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        let mut first = true;
        for b in &bytes[2..] {
            if !first {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", b)?;
            first = false;
        }
        let high = u16::from_be_bytes([bytes[0], bytes[1]]);
        if high != 0 {
            write!(f, "|{}", high)?;
        }
        Ok(())
    }
}

/// Output action target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPort {
    Physical(PortNo),
    /// Every port except the ingress port (and ports with flooding disabled)
    Flood,
}

/// Frame reported by a switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    /// None when the switch sent the whole frame unbuffered
    pub buffer_id: Option<BufferId>,
    pub in_port: PortNo,
    pub data: Vec<u8>,
}

impl PacketIn {
    pub fn new(in_port: PortNo, data: Vec<u8>) -> Self {
        Self {
            buffer_id: None,
            in_port,
            data,
        }
    }

    pub fn with_buffer(mut self, buffer_id: BufferId) -> Self {
        self.buffer_id = Some(buffer_id);
        self
    }

    /// Frame bytes to attach when releasing this packet: empty if buffered
    fn release_data(&self) -> Vec<u8> {
        match self.buffer_id {
            Some(_) => Vec::new(),
            None => self.data.clone(),
        }
    }
}

/// Send (or discard) one packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketOut {
    pub buffer_id: Option<BufferId>,
    pub in_port: PortNo,
    /// Empty list discards the packet
    pub actions: Vec<OutputPort>,
    pub data: Vec<u8>,
}

impl PacketOut {
    /// Release the packet-in's frame through `actions`
    pub fn release(packet_in: &PacketIn, actions: Vec<OutputPort>) -> Self {
        Self {
            buffer_id: packet_in.buffer_id,
            in_port: packet_in.in_port,
            actions,
            data: packet_in.release_data(),
        }
    }

    pub fn is_drop(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Install a match -> actions rule
///
/// `buffer_id` (or, for unbuffered packet-ins, `data` with `in_port`) makes
/// the switch run the triggering frame through the new rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMod {
    pub flow_match: FlowMatch,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub priority: u16,
    pub buffer_id: Option<BufferId>,
    pub in_port: PortNo,
    pub actions: Vec<OutputPort>,
    pub data: Vec<u8>,
}

impl FlowMod {
    /// Add-rule for `flow_match` that also releases the packet-in
    pub fn add_releasing(
        flow_match: FlowMatch,
        packet_in: &PacketIn,
        actions: Vec<OutputPort>,
    ) -> Self {
        Self {
            flow_match,
            idle_timeout: 0,
            hard_timeout: 0,
            priority: DEFAULT_PRIORITY,
            buffer_id: packet_in.buffer_id,
            in_port: packet_in.in_port,
            actions,
            data: packet_in.release_data(),
        }
    }

    pub fn timeouts(mut self, idle: u16, hard: u16) -> Self {
        self.idle_timeout = idle;
        self.hard_timeout = hard;
        self
    }

    pub fn priority(mut self, priority: u16) -> Self {
        self.priority = priority;
        self
    }
}

/// One instruction sent to a switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchMessage {
    PacketOut(PacketOut),
    FlowMod(FlowMod),
}

impl SwitchMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            SwitchMessage::PacketOut(out) if out.is_drop() => "packet_out(drop)",
            SwitchMessage::PacketOut(_) => "packet_out",
            SwitchMessage::FlowMod(_) => "flow_mod",
        }
    }
}
