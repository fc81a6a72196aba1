//! Deployment options - the configuration choices that decide conditional steps.

use crate::step::StepName;
use serde::{Deserialize, Serialize};

/// User configuration choices that affect which steps are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentOptions {
    /// Whether reserved tokens were configured (drives `setReservedTokens`)
    pub reserved_tokens: bool,

    /// Whether whitelisting is enabled (drives `whitelist`)
    pub whitelist: bool,
}

impl Default for DeploymentOptions {
    fn default() -> Self {
        Self {
            reserved_tokens: true,
            whitelist: true,
        }
    }
}

impl DeploymentOptions {
    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether `step` is required under these options.
    pub fn requires(&self, step: StepName) -> bool {
        match step {
            StepName::SetReservedTokens => self.reserved_tokens,
            StepName::Whitelist => self.whitelist,
            _ => true,
        }
    }
}
