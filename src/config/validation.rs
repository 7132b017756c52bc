//! Configuration validation
//!
//! Unparsable values are errors. Policy shapes that are legal but probably
//! unintended (empty sets, overlaps, multicast sources) are warnings.

use super::Config;
use crate::protocol::MacAddr;
use crate::telemetry::is_known_level;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn print_diagnostics(&self) {
        for warning in &self.warnings {
            println!("[WARN] {}", warning);
        }
        for error in &self.errors {
            println!("[ERROR] {}", error);
        }
    }
}

pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_logging(config, &mut result);
    validate_policy(config, &mut result);
    validate_flow(config, &mut result);

    result
}

fn validate_logging(config: &Config, result: &mut ValidationResult) {
    if !is_known_level(&config.logging.level) {
        result.warn(format!(
            "logging.level: unknown level '{}', using info",
            config.logging.level
        ));
    }
}

fn check_list(name: &str, values: &[String], result: &mut ValidationResult) -> BTreeSet<MacAddr> {
    let mut seen = BTreeSet::new();
    for (i, value) in values.iter().enumerate() {
        match value.parse::<MacAddr>() {
            Ok(mac) => {
                if !seen.insert(mac) {
                    result.warn(format!("{}[{}]: duplicate address {}", name, i, mac));
                }
            }
            Err(e) => result.error(format!("{}[{}]: '{}': {}", name, i, value, e)),
        }
    }
    seen
}

fn validate_policy(config: &Config, result: &mut ValidationResult) {
    let untrusted = check_list("policy.untrusted", &config.policy.untrusted, result);
    let protected = check_list("policy.protected", &config.policy.protected, result);

    if config.policy.untrusted.is_empty() {
        result.warn("policy.untrusted: empty, no traffic will be blocked");
    }
    if config.policy.protected.is_empty() {
        result.warn("policy.protected: empty, no traffic will be blocked");
    }

    for mac in untrusted.intersection(&protected) {
        result.warn(format!(
            "policy: {} is both untrusted and protected",
            mac
        ));
    }

    for mac in untrusted.iter().filter(|mac| mac.is_multicast()) {
        result.warn(format!(
            "policy.untrusted: {} is a multicast address and never appears as a source",
            mac
        ));
    }
}

fn validate_flow(config: &Config, result: &mut ValidationResult) {
    let flow = &config.flow;
    if flow.hard_timeout != 0 && flow.idle_timeout > flow.hard_timeout {
        result.warn(format!(
            "flow: idle_timeout ({}) exceeds hard_timeout ({}) and never fires",
            flow.idle_timeout, flow.hard_timeout
        ));
    }
}
