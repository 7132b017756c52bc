//! Learning switch control logic
//!
//! Connection-up and packet-in events flow in; packet-out and flow-mod
//! instructions flow back out over the same connection.

mod connection;
mod dispatch;
mod engine;
mod mac_table;
mod manager;
mod policy;
mod runtime;

pub use connection::{ChannelConnection, ConnectionId, Outbound, SwitchConnection};
pub use dispatch::{ActionDispatcher, RuleSettings};
pub use engine::{Action, DropReason, L2Switch, PacketEvent};
pub use mac_table::MacTable;
pub use manager::ConnectionManager;
pub use policy::{PolicyFilter, PolicyList, DEFAULT_PROTECTED, DEFAULT_UNTRUSTED};
pub use runtime::{Controller, ControllerEvent};
