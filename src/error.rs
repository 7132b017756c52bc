use crate::controller::ConnectionId;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("malformed packet-in: {0}")]
    MalformedPacket(String),

    #[error("failed to send to connection {connection}: {reason}")]
    Send {
        connection: ConnectionId,
        reason: String,
    },

    #[error("connection {0} not found")]
    UnknownConnection(ConnectionId),
}

pub type Result<T> = std::result::Result<T, Error>;
