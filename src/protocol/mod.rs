//! Frame and header parsing
//!
//! Only what the controller needs to classify a packet-in and build an
//! exact-match flow rule: Ethernet (with 802.1Q), ARP and IPv4 with its
//! transport ports.

pub mod arp;
pub mod ethernet;
pub mod ipv4;
pub mod types;

pub use types::*;
