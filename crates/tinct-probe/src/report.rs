//! Human and machine readable description of the runtime environment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tinct_core::NumericSettings;
use tinct_core::verbose::message_box;

use crate::capabilities::Capabilities;
use crate::capability::Capability;

/// Platform the library was built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub os: String,
    pub arch: String,
    pub family: String,
}

impl TargetInfo {
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            family: std::env::consts::FAMILY.to_string(),
        }
    }
}

/// Snapshot of the library version, numeric settings, and capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReport {
    pub version: String,
    pub target: TargetInfo,
    pub settings: NumericSettings,
    /// Availability keyed by capability label.
    pub capabilities: BTreeMap<String, bool>,
}

impl EnvironmentReport {
    /// The report framed in a message box.
    pub fn render(&self) -> String {
        let mut text = format!("tinct {}\n\nTarget:\n", self.version);
        text.push_str(&format!("  os: {}\n", self.target.os));
        text.push_str(&format!("  arch: {}\n", self.target.arch));
        text.push_str(&format!("  family: {}\n", self.target.family));

        text.push_str("\nNumeric settings:\n");
        text.push_str(&format!("  domain-range scale: {}\n", self.settings.domain_range_scale));
        text.push_str(&format!("  float precision: {}\n", self.settings.float_precision));
        text.push_str(&format!("  int precision: {}\n", self.settings.int_precision));
        text.push_str(&format!("  caching enabled: {}\n", self.settings.caching_enabled));

        text.push_str("\nCapabilities:");
        for capability in Capability::all() {
            let found = self.capabilities.get(capability.label()).copied().unwrap_or(false);
            let state = if found { "available" } else { "missing" };
            text.push_str(&format!("\n  {capability}: {state}"));
        }
        message_box(&text, 79, 3)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Describe this process using the globally resolved capabilities.
pub fn describe_environment() -> EnvironmentReport {
    describe_environment_with(Capabilities::global())
}

pub fn describe_environment_with(capabilities: &Capabilities) -> EnvironmentReport {
    EnvironmentReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: TargetInfo::current(),
        settings: NumericSettings::current(),
        capabilities: Capability::all()
            .iter()
            .map(|capability| (capability.label().to_string(), capabilities.is_available(*capability)))
            .collect(),
    }
}
