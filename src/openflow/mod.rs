//! Controller-platform boundary types
//!
//! Typed OpenFlow 1.0 style messages exchanged with the platform. Wire
//! encoding belongs to the platform; this crate only builds the values.

mod flow_match;
mod message;

pub use flow_match::{FlowMatch, VLAN_NONE};
pub use message::{
    BufferId, DatapathId, FlowMod, OutputPort, PacketIn, PacketOut, PortNo, SwitchMessage,
    DEFAULT_PRIORITY, PORT_MAX,
};
