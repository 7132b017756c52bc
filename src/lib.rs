//! learnswitch - L2 learning switch controller
//!
//! Per-switch control logic for an OpenFlow controller platform: MAC learning,
//! loop prevention, a MAC-pair access policy and flow rule installation.
//! The platform delivers connection and packet-in events; this crate decides
//! what each switch should do and hands the instructions back.

pub mod config;
pub mod controller;
pub mod error;
pub mod openflow;
pub mod protocol;
pub mod replay;
pub mod telemetry;

pub use error::{Error, Result};
