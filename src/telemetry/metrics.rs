//! Switch control counters
//!
//! Global decision counters plus per-switch statistics keyed by datapath
//! id. Counters are atomics so the registry can be shared behind an `Arc`.

use crate::openflow::DatapathId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Monotonic counter
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-switch statistics
#[derive(Debug, Default)]
pub struct SwitchStats {
    pub packets_in: Counter,
    pub flooded: Counter,
    pub forwarded: Counter,
    pub dropped: Counter,
    /// Gauge: learned addresses
    pub mac_table_size: AtomicU64,
}

impl SwitchStats {
    pub fn set_mac_table_size(&self, size: usize) {
        self.mac_table_size.store(size as u64, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    switches: RwLock<BTreeMap<DatapathId, SwitchStats>>,

    /// Packet-in events received
    pub packets_in: Counter,
    /// Packets sent out all ports but the ingress
    pub flooded: Counter,
    /// Packets forwarded to a learned port
    pub forwarded: Counter,
    /// Forwarding rules installed
    pub rules_installed: Counter,
    /// Untrusted -> protected packets dropped
    pub dropped_policy: Counter,
    /// Packets dropped because the destination is behind the ingress port
    pub dropped_loop: Counter,
    /// Packet-ins discarded as unparsable
    pub malformed: Counter,
    /// Instructions the platform refused
    pub send_errors: Counter,

    pub connections_up: Counter,
    pub connections_down: Counter,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a switch; existing statistics are kept on reconnect
    pub fn register_switch(&self, dpid: DatapathId) {
        let mut switches = self.switches.write().unwrap_or_else(PoisonError::into_inner);
        switches.entry(dpid).or_default();
    }

    /// Run `f` against a switch's statistics if it is registered
    pub fn with_switch(&self, dpid: DatapathId, f: impl FnOnce(&SwitchStats)) {
        let switches = self.switches.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(stats) = switches.get(&dpid) {
            f(stats);
        }
    }

    pub fn record_packet_in(&self, dpid: DatapathId) {
        self.packets_in.inc();
        self.with_switch(dpid, |s| s.packets_in.inc());
    }

    pub fn record_flood(&self, dpid: DatapathId) {
        self.flooded.inc();
        self.with_switch(dpid, |s| s.flooded.inc());
    }

    pub fn record_forward(&self, dpid: DatapathId, rule_installed: bool) {
        self.forwarded.inc();
        if rule_installed {
            self.rules_installed.inc();
        }
        self.with_switch(dpid, |s| s.forwarded.inc());
    }

    pub fn record_drop(&self, dpid: DatapathId, by_policy: bool) {
        if by_policy {
            self.dropped_policy.inc();
        } else {
            self.dropped_loop.inc();
        }
        self.with_switch(dpid, |s| s.dropped.inc());
    }

    pub fn set_mac_table_size(&self, dpid: DatapathId, size: usize) {
        self.with_switch(dpid, |s| s.set_mac_table_size(size));
    }

    /// All metrics as name/value pairs
    pub fn export(&self) -> Vec<(String, u64)> {
        let mut result = vec![
            ("packets_in".into(), self.packets_in.get()),
            ("flooded".into(), self.flooded.get()),
            ("forwarded".into(), self.forwarded.get()),
            ("rules_installed".into(), self.rules_installed.get()),
            ("dropped_policy".into(), self.dropped_policy.get()),
            ("dropped_loop".into(), self.dropped_loop.get()),
            ("malformed".into(), self.malformed.get()),
            ("send_errors".into(), self.send_errors.get()),
            ("connections_up".into(), self.connections_up.get()),
            ("connections_down".into(), self.connections_down.get()),
        ];

        let switches = self.switches.read().unwrap_or_else(PoisonError::into_inner);
        for (dpid, stats) in switches.iter() {
            let prefix = format!("dpid_{}", dpid.0);
            result.extend([
                (format!("{}_packets_in", prefix), stats.packets_in.get()),
                (format!("{}_flooded", prefix), stats.flooded.get()),
                (format!("{}_forwarded", prefix), stats.forwarded.get()),
                (format!("{}_dropped", prefix), stats.dropped.get()),
                (
                    format!("{}_mac_table_size", prefix),
                    stats.mac_table_size.load(Ordering::Relaxed),
                ),
            ]);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_basic() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);
        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_unregistered_switch_only_counts_globally() {
        let registry = MetricsRegistry::new();
        registry.record_packet_in(DatapathId(9));

        let metrics = registry.export();
        assert!(metrics.contains(&("packets_in".into(), 1)));
        assert!(!metrics.iter().any(|(name, _)| name.starts_with("dpid_9")));
    }

    #[test]
    fn test_per_switch_export() {
        let registry = MetricsRegistry::new();
        registry.register_switch(DatapathId(1));
        registry.register_switch(DatapathId(2));

        registry.record_packet_in(DatapathId(1));
        registry.record_flood(DatapathId(1));
        registry.record_forward(DatapathId(2), true);
        registry.record_drop(DatapathId(2), true);
        registry.record_drop(DatapathId(2), false);
        registry.set_mac_table_size(DatapathId(1), 4);

        let metrics = registry.export();
        assert!(metrics.contains(&("rules_installed".into(), 1)));
        assert!(metrics.contains(&("dropped_policy".into(), 1)));
        assert!(metrics.contains(&("dropped_loop".into(), 1)));
        assert!(metrics.contains(&("dpid_1_flooded".into(), 1)));
        assert!(metrics.contains(&("dpid_1_mac_table_size".into(), 4)));
        assert!(metrics.contains(&("dpid_2_dropped".into(), 2)));
    }

    #[test]
    fn test_register_twice_keeps_stats() {
        let registry = MetricsRegistry::new();
        registry.register_switch(DatapathId(1));
        registry.record_packet_in(DatapathId(1));
        registry.register_switch(DatapathId(1));

        assert!(registry
            .export()
            .contains(&("dpid_1_packets_in".into(), 1)));
    }
}
