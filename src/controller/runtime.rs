//! Event loop
//!
//! Events are handled strictly one at a time, in delivery order. Nothing
//! inside a handler awaits, so a packet-in always runs to completion
//! before the next event is looked at.

use super::connection::{ConnectionId, SwitchConnection};
use super::dispatch::{ActionDispatcher, RuleSettings};
use super::engine::Action;
use super::manager::ConnectionManager;
use super::policy::PolicyList;
use crate::openflow::PacketIn;
use crate::telemetry::MetricsRegistry;
use crate::Error;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Inbound events from the controller platform
pub enum ControllerEvent {
    ConnectionUp(Box<dyn SwitchConnection>),
    PacketIn {
        connection: ConnectionId,
        packet: PacketIn,
    },
    ConnectionDown(ConnectionId),
}

impl fmt::Debug for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerEvent::ConnectionUp(conn) => f
                .debug_struct("ConnectionUp")
                .field("connection", &conn.id())
                .field("dpid", &conn.dpid())
                .finish(),
            ControllerEvent::PacketIn { connection, packet } => f
                .debug_struct("PacketIn")
                .field("connection", connection)
                .field("in_port", &packet.in_port)
                .field("len", &packet.data.len())
                .finish(),
            ControllerEvent::ConnectionDown(id) => {
                f.debug_tuple("ConnectionDown").field(id).finish()
            }
        }
    }
}

pub struct Controller {
    manager: ConnectionManager,
    metrics: Arc<MetricsRegistry>,
}

impl Controller {
    pub fn new(policy: Arc<PolicyList>, rules: RuleSettings, metrics: Arc<MetricsRegistry>) -> Self {
        if policy.is_inert() {
            info!("Access policy is empty, no traffic will be blocked");
        }
        Self {
            manager: ConnectionManager::new(
                policy,
                ActionDispatcher::new(rules),
                Arc::clone(&metrics),
            ),
            metrics,
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Process one event to completion
    ///
    /// Returns the action taken for a successfully dispatched packet-in.
    /// Errors are logged here; none of them stop the controller.
    pub fn handle_event(&mut self, event: ControllerEvent) -> Option<Action> {
        match event {
            ControllerEvent::ConnectionUp(connection) => {
                self.manager.on_connection_up(connection);
                None
            }
            ControllerEvent::ConnectionDown(id) => {
                if !self.manager.on_connection_closed(id) {
                    debug!("Close for unknown connection {}", id);
                }
                None
            }
            ControllerEvent::PacketIn { connection, packet } => {
                match self.manager.on_packet_in(connection, &packet) {
                    Ok(action) => Some(action),
                    Err(Error::MalformedPacket(reason)) => {
                        warn!("Discarding packet-in on {}: {}", connection, reason);
                        None
                    }
                    Err(Error::UnknownConnection(id)) => {
                        warn!("Packet-in for unknown connection {}", id);
                        None
                    }
                    Err(e) => {
                        warn!("{}", e);
                        None
                    }
                }
            }
        }
    }

    /// Drain `events` until every sender is gone
    pub async fn run(mut self, mut events: mpsc::Receiver<ControllerEvent>) -> Self {
        info!("Controller running");
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        info!(
            "Event stream closed, {} switch(es) still connected",
            self.manager.len()
        );
        self
    }
}
