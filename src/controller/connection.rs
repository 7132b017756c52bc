//! Switch connection handles

use crate::openflow::{DatapathId, SwitchMessage};
use crate::{Error, Result};
use std::fmt;
use tokio::sync::mpsc;

/// Platform-assigned identity of one switch session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Live session with one switch, as exposed by the controller platform
///
/// Sending is fire-and-forget from the switch logic's point of view: a
/// failure is reported once and never retried here.
pub trait SwitchConnection: Send {
    fn id(&self) -> ConnectionId;

    fn dpid(&self) -> DatapathId;

    fn send(&mut self, message: SwitchMessage) -> Result<()>;
}

/// An instruction leaving the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub connection: ConnectionId,
    pub dpid: DatapathId,
    pub message: SwitchMessage,
}

/// Connection that hands instructions to the platform over a channel
#[derive(Debug)]
pub struct ChannelConnection {
    id: ConnectionId,
    dpid: DatapathId,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelConnection {
    pub fn new(id: ConnectionId, dpid: DatapathId, tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { id, dpid, tx }
    }
}

impl SwitchConnection for ChannelConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn dpid(&self) -> DatapathId {
        self.dpid
    }

    fn send(&mut self, message: SwitchMessage) -> Result<()> {
        self.tx
            .send(Outbound {
                connection: self.id,
                dpid: self.dpid,
                message,
            })
            .map_err(|_| Error::Send {
                connection: self.id,
                reason: "platform channel closed".into(),
            })
    }
}
