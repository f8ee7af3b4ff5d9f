//! Runtime configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

const DEFAULT_CONTAINER_COMMENT: &str = "container";
const DEFAULT_ELEMENT_CONTAINER_COMMENT: &str = "ng-container";

/// Runtime configuration
///
/// Every field is optional so a partial JSON document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Enable dev-mode assertions. Defaults to on for debug builds.
    pub dev_mode: Option<bool>,
    /// Text of the comment node anchoring view containers
    pub container_comment: Option<String>,
    /// Text of the comment node emitted for `<ng-container>`
    pub element_container_comment: Option<String>,
}

impl RuntimeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| RuntimeError::Config(err.to_string()))
    }

    /// Configuration with dev-mode assertions compiled in or out explicitly.
    pub fn with_dev_mode(dev_mode: bool) -> Self {
        RuntimeConfig {
            dev_mode: Some(dev_mode),
            ..Default::default()
        }
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode.unwrap_or(cfg!(debug_assertions))
    }

    pub fn container_comment(&self) -> &str {
        self.container_comment
            .as_deref()
            .unwrap_or(DEFAULT_CONTAINER_COMMENT)
    }

    pub fn element_container_comment(&self) -> &str {
        self.element_container_comment
            .as_deref()
            .unwrap_or(DEFAULT_ELEMENT_CONTAINER_COMMENT)
    }
}
