//! Per-switch MAC address table
//!
//! Maps a hardware address to the port it was last seen on. Entries never
//! age out; a newer sighting simply overwrites the older one.

use crate::openflow::PortNo;
use crate::protocol::MacAddr;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct MacTable {
    entries: HashMap<MacAddr, PortNo>,
}

impl MacTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `mac` as reachable through `port`
    ///
    /// Returns the previously learned port if the address moved.
    pub fn learn(&mut self, mac: MacAddr, port: PortNo) -> Option<PortNo> {
        self.entries
            .insert(mac, port)
            .filter(|&previous| previous != port)
    }

    pub fn lookup(&self, mac: &MacAddr) -> Option<PortNo> {
        self.entries.get(mac).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
