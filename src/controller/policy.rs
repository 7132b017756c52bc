//! MAC-pair access policy
//!
//! Blocks traffic from an untrusted source to a protected destination.
//! Both sets are fixed at startup and shared read-only by every switch.

use crate::protocol::MacAddr;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Host the built-in policy treats as untrusted
pub const DEFAULT_UNTRUSTED: MacAddr = MacAddr([0xd0, 0x13, 0x1c, 0x1b, 0x76, 0xa0]);
/// Host the built-in policy protects
pub const DEFAULT_PROTECTED: MacAddr = MacAddr([0xb8, 0x94, 0x91, 0x62, 0xf1, 0x65]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyList {
    untrusted: BTreeSet<MacAddr>,
    protected: BTreeSet<MacAddr>,
}

impl PolicyList {
    pub fn new(
        untrusted: impl IntoIterator<Item = MacAddr>,
        protected: impl IntoIterator<Item = MacAddr>,
    ) -> Self {
        Self {
            untrusted: untrusted.into_iter().collect(),
            protected: protected.into_iter().collect(),
        }
    }

    /// Policy that never blocks
    pub fn permit_all() -> Self {
        Self {
            untrusted: BTreeSet::new(),
            protected: BTreeSet::new(),
        }
    }

    pub fn is_untrusted(&self, mac: &MacAddr) -> bool {
        self.untrusted.contains(mac)
    }

    pub fn is_protected(&self, mac: &MacAddr) -> bool {
        self.protected.contains(mac)
    }

    /// True if either set is empty, in which case nothing is ever blocked
    pub fn is_inert(&self) -> bool {
        self.untrusted.is_empty() || self.protected.is_empty()
    }
}

impl Default for PolicyList {
    fn default() -> Self {
        Self::new([DEFAULT_UNTRUSTED], [DEFAULT_PROTECTED])
    }
}

/// Read-only view of the shared policy held by each switch
#[derive(Debug, Clone)]
pub struct PolicyFilter {
    list: Arc<PolicyList>,
}

impl PolicyFilter {
    pub fn new(list: Arc<PolicyList>) -> Self {
        Self { list }
    }

    /// True iff `src` is untrusted and `dst` is protected
    pub fn is_blocked(&self, src: &MacAddr, dst: &MacAddr) -> bool {
        self.list.is_untrusted(src) && self.list.is_protected(dst)
    }

    pub fn list(&self) -> &PolicyList {
        &self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x0a]);
    const Y: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x0b]);
    const Z: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x0c]);

    fn filter(untrusted: &[MacAddr], protected: &[MacAddr]) -> PolicyFilter {
        PolicyFilter::new(Arc::new(PolicyList::new(
            untrusted.iter().copied(),
            protected.iter().copied(),
        )))
    }

    #[test]
    fn test_blocks_untrusted_to_protected() {
        let f = filter(&[X], &[Y]);
        assert!(f.is_blocked(&X, &Y));
    }

    #[test]
    fn test_direction_matters() {
        let f = filter(&[X], &[Y]);
        assert!(!f.is_blocked(&Y, &X));
        assert!(!f.is_blocked(&X, &Z));
        assert!(!f.is_blocked(&Z, &Y));
    }

    #[test]
    fn test_empty_sets_never_block() {
        let f = filter(&[], &[Y]);
        assert!(f.list().is_inert());
        assert!(!f.is_blocked(&X, &Y));

        let f = filter(&[X], &[]);
        assert!(!f.is_blocked(&X, &Y));
    }

    #[test]
    fn test_overlapping_sets() {
        // An address in both sets blocks traffic to itself only from itself
        let f = filter(&[X], &[X, Y]);
        assert!(f.is_blocked(&X, &X));
        assert!(f.is_blocked(&X, &Y));
        assert!(!f.is_blocked(&Y, &X));
    }

    #[test]
    fn test_default_policy() {
        let list = PolicyList::default();
        assert!(list.is_untrusted(&DEFAULT_UNTRUSTED));
        assert!(list.is_protected(&DEFAULT_PROTECTED));
        assert!(!list.is_inert());
        assert!(PolicyList::permit_all().is_inert());
    }
}
