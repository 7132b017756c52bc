//! Configuration types

use crate::controller::{PolicyList, RuleSettings, DEFAULT_PROTECTED, DEFAULT_UNTRUSTED};
use crate::openflow::DEFAULT_PRIORITY;
use crate::protocol::MacAddr;
use crate::telemetry::LogConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LogConfig,
    pub policy: PolicyConfig,
    pub flow: FlowConfig,
}

/// `[policy]`: hardware addresses as strings, parsed by `policy_list()`
///
/// Without a `[policy]` section the built-in pair applies; empty lists turn
/// the filter off.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub untrusted: Vec<String>,
    pub protected: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            untrusted: vec![DEFAULT_UNTRUSTED.to_string()],
            protected: vec![DEFAULT_PROTECTED.to_string()],
        }
    }
}

/// `[flow]`: parameters of installed forwarding rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlowConfig {
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub priority: u16,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            idle_timeout: 0,
            hard_timeout: 0,
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl From<FlowConfig> for RuleSettings {
    fn from(flow: FlowConfig) -> Self {
        RuleSettings {
            idle_timeout: flow.idle_timeout,
            hard_timeout: flow.hard_timeout,
            priority: flow.priority,
        }
    }
}

impl Config {
    /// Parse the policy addresses
    pub fn policy_list(&self) -> Result<PolicyList> {
        let untrusted = parse_macs("policy.untrusted", &self.policy.untrusted)?;
        let protected = parse_macs("policy.protected", &self.policy.protected)?;
        Ok(PolicyList::new(untrusted, protected))
    }

    pub fn rule_settings(&self) -> RuleSettings {
        self.flow.into()
    }
}

fn parse_macs(section: &str, values: &[String]) -> Result<Vec<MacAddr>> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value
                .parse::<MacAddr>()
                .map_err(|e| Error::Config(format!("{}[{}]: '{}': {}", section, i, value, e)))
        })
        .collect()
}
