//! One decision engine per switch connection
//!
//! The manager owns every connection handle together with the `L2Switch`
//! bound to it. Tables are never shared; only the policy is.

use super::connection::{ConnectionId, SwitchConnection};
use super::dispatch::ActionDispatcher;
use super::engine::{Action, DropReason, L2Switch, PacketEvent};
use super::policy::{PolicyFilter, PolicyList};
use crate::openflow::{DatapathId, PacketIn};
use crate::telemetry::MetricsRegistry;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

struct Session {
    connection: Box<dyn SwitchConnection>,
    switch: L2Switch,
}

pub struct ConnectionManager {
    sessions: HashMap<ConnectionId, Session>,
    policy: Arc<PolicyList>,
    dispatcher: ActionDispatcher,
    metrics: Arc<MetricsRegistry>,
}

impl ConnectionManager {
    pub fn new(
        policy: Arc<PolicyList>,
        dispatcher: ActionDispatcher,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            policy,
            dispatcher,
            metrics,
        }
    }

    /// Bind a fresh switch (empty table) to a new connection
    ///
    /// A second connection-up with the same id replaces the old session,
    /// which is counted as a disconnect.
    pub fn on_connection_up(&mut self, connection: Box<dyn SwitchConnection>) -> ConnectionId {
        let id = connection.id();
        let dpid = connection.dpid();
        let switch = L2Switch::new(dpid, PolicyFilter::new(Arc::clone(&self.policy)));

        if let Some(old) = self.sessions.insert(id, Session { connection, switch }) {
            self.metrics.connections_down.inc();
            warn!(
                "Connection {} re-announced, discarding {} learned addresses",
                id,
                old.switch.mac_table().len()
            );
        }

        self.metrics.connections_up.inc();
        self.metrics.register_switch(dpid);
        self.metrics.set_mac_table_size(dpid, 0);
        info!("Switch {} connected (connection {})", dpid, id);
        id
    }

    /// Drop the switch and its table. Returns false for unknown ids.
    pub fn on_connection_closed(&mut self, id: ConnectionId) -> bool {
        match self.sessions.remove(&id) {
            Some(session) => {
                self.metrics.connections_down.inc();
                info!(
                    "Switch {} disconnected (connection {}), forgetting {} addresses",
                    session.switch.dpid(),
                    id,
                    session.switch.mac_table().len()
                );
                true
            }
            None => false,
        }
    }

    /// Decide and dispatch for one packet-in on `id`
    ///
    /// Malformed packet-ins are rejected before learning and nothing is
    /// sent. A send failure is returned after the decision was recorded.
    pub fn on_packet_in(&mut self, id: ConnectionId, packet_in: &PacketIn) -> Result<Action> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(Error::UnknownConnection(id))?;
        let dpid = session.switch.dpid();
        self.metrics.record_packet_in(dpid);

        let event = match PacketEvent::from_packet_in(dpid, packet_in) {
            Ok(event) => event,
            Err(e) => {
                self.metrics.malformed.inc();
                return Err(e);
            }
        };

        let action = session.switch.handle_packet(&event);
        self.metrics
            .set_mac_table_size(dpid, session.switch.mac_table().len());
        record_action(&self.metrics, dpid, action);

        if let Err(e) = self
            .dispatcher
            .dispatch(session.connection.as_mut(), &event, action)
        {
            self.metrics.send_errors.inc();
            return Err(e);
        }

        Ok(action)
    }

    pub fn switch(&self, id: ConnectionId) -> Option<&L2Switch> {
        self.sessions.get(&id).map(|session| &session.switch)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn record_action(metrics: &MetricsRegistry, dpid: DatapathId, action: Action) {
    match action {
        Action::Flood => metrics.record_flood(dpid),
        Action::Forward { install_rule, .. } => metrics.record_forward(dpid, install_rule),
        Action::Drop(reason) => metrics.record_drop(dpid, reason == DropReason::Policy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openflow::SwitchMessage;
    use crate::protocol::ethernet::FrameBuilder;
    use crate::protocol::MacAddr;
    use std::sync::Mutex;

    const A: MacAddr = MacAddr([0, 0, 0, 0, 0, 0x0a]);
    const B: MacAddr = MacAddr([0, 0, 0, 0, 0, 0x0b]);

    type Sent = Arc<Mutex<Vec<SwitchMessage>>>;

    struct TestConnection {
        id: ConnectionId,
        dpid: DatapathId,
        sent: Sent,
        fail: bool,
    }

    impl SwitchConnection for TestConnection {
        fn id(&self) -> ConnectionId {
            self.id
        }

        fn dpid(&self) -> DatapathId {
            self.dpid
        }

        fn send(&mut self, message: SwitchMessage) -> Result<()> {
            if self.fail {
                return Err(Error::Send {
                    connection: self.id,
                    reason: "link down".into(),
                });
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn connection(id: u64, fail: bool) -> (Box<dyn SwitchConnection>, Sent) {
        let sent = Sent::default();
        let conn = TestConnection {
            id: ConnectionId(id),
            dpid: DatapathId(id),
            sent: Arc::clone(&sent),
            fail,
        };
        (Box::new(conn), sent)
    }

    fn packet_in(src: MacAddr, dst: MacAddr, port: u16) -> PacketIn {
        let data = FrameBuilder::new()
            .dst_mac(dst)
            .src_mac(src)
            .ethertype(0x0806)
            .payload(&[0u8; 46])
            .build();
        PacketIn::new(port, data)
    }

    fn manager() -> (ConnectionManager, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new());
        let manager = ConnectionManager::new(
            Arc::new(PolicyList::permit_all()),
            ActionDispatcher::default(),
            Arc::clone(&metrics),
        );
        (manager, metrics)
    }

    #[test]
    fn test_each_connection_gets_own_table() {
        let (mut mgr, _) = manager();
        let (c1, _) = connection(1, false);
        let (c2, _) = connection(2, false);
        let id1 = mgr.on_connection_up(c1);
        let id2 = mgr.on_connection_up(c2);

        mgr.on_packet_in(id1, &packet_in(A, B, 1)).unwrap();

        assert_eq!(mgr.switch(id1).unwrap().mac_table().lookup(&A), Some(1));
        assert_eq!(mgr.switch(id2).unwrap().mac_table().lookup(&A), None);
        assert_eq!(mgr.len(), 2);
    }

    #[test]
    fn test_every_decision_sends_one_message() {
        let (mut mgr, _) = manager();
        let (c1, sent) = connection(1, false);
        let id = mgr.on_connection_up(c1);

        mgr.on_packet_in(id, &packet_in(A, B, 1)).unwrap();
        mgr.on_packet_in(id, &packet_in(B, A, 2)).unwrap();
        mgr.on_packet_in(id, &packet_in(B, A, 1)).unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].kind(), "packet_out");
        assert_eq!(sent[1].kind(), "flow_mod");
        assert_eq!(sent[2].kind(), "packet_out(drop)");
    }

    #[test]
    fn test_malformed_packet_is_not_learned_or_sent() {
        let (mut mgr, metrics) = manager();
        let (c1, sent) = connection(1, false);
        let id = mgr.on_connection_up(c1);

        let result = mgr.on_packet_in(id, &PacketIn::new(1, vec![0xaa; 8]));
        assert!(matches!(result, Err(Error::MalformedPacket(_))));
        assert!(mgr.switch(id).unwrap().mac_table().is_empty());
        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(metrics.malformed.get(), 1);
    }

    #[test]
    fn test_send_failure_is_reported_not_retried() {
        let (mut mgr, metrics) = manager();
        let (c1, _) = connection(1, true);
        let id = mgr.on_connection_up(c1);

        let result = mgr.on_packet_in(id, &packet_in(A, B, 1));
        assert!(matches!(result, Err(Error::Send { .. })));
        // The decision still happened
        assert_eq!(mgr.switch(id).unwrap().mac_table().lookup(&A), Some(1));
        assert_eq!(metrics.send_errors.get(), 1);
        assert_eq!(metrics.flooded.get(), 1);
    }

    #[test]
    fn test_close_discards_table() {
        let (mut mgr, metrics) = manager();
        let (c1, _) = connection(1, false);
        let id = mgr.on_connection_up(c1);
        mgr.on_packet_in(id, &packet_in(A, B, 1)).unwrap();

        assert!(mgr.on_connection_closed(id));
        assert!(!mgr.on_connection_closed(id));
        assert!(mgr.is_empty());
        assert!(matches!(
            mgr.on_packet_in(id, &packet_in(A, B, 1)),
            Err(Error::UnknownConnection(_))
        ));

        // Reconnecting starts from an empty table
        let (again, _) = connection(1, false);
        mgr.on_connection_up(again);
        assert!(mgr.switch(id).unwrap().mac_table().is_empty());
        assert_eq!(metrics.connections_up.get(), 2);
        assert_eq!(metrics.connections_down.get(), 1);
    }

    #[test]
    fn test_reannounced_connection_keeps_counters_balanced() {
        let (mut mgr, metrics) = manager();
        let (first, _) = connection(1, false);
        let id = mgr.on_connection_up(first);
        mgr.on_packet_in(id, &packet_in(A, B, 1)).unwrap();

        let (second, sent) = connection(1, false);
        assert_eq!(mgr.on_connection_up(second), id);
        assert_eq!(mgr.len(), 1);
        assert_eq!(metrics.connections_up.get(), 2);
        assert_eq!(metrics.connections_down.get(), 1);

        // The replacement starts empty and owns the outbound channel
        assert!(mgr.switch(id).unwrap().mac_table().is_empty());
        mgr.on_packet_in(id, &packet_in(B, A, 2)).unwrap();
        assert_eq!(sent.lock().unwrap()[0].kind(), "packet_out");

        assert!(mgr.on_connection_closed(id));
        assert_eq!(metrics.connections_up.get(), metrics.connections_down.get());
    }
}
