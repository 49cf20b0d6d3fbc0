//! Engine configuration
//!
//! Every field has a default, so an empty YAML document is a valid config.
//!
//! ```yaml
//! max_passes: 10
//! show_class: show
//! hide_class: hide
//! display_field: title
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DISPLAY_FIELD, HIDE_CLASS, MAX_SUBSTITUTION_PASSES, SHOW_CLASS};
use crate::error::{ReactiveError, Result};

/// Tunables for rendering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum substitution passes per template render
    pub max_passes: usize,

    /// Class toggled on when an `rs-if` holds
    pub show_class: String,

    /// Class toggled on when an `rs-if` fails
    pub hide_class: String,

    /// Object field used for a bare `{item}` inside `rs-for`
    pub display_field: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: MAX_SUBSTITUTION_PASSES,
            show_class: SHOW_CLASS.to_string(),
            hide_class: HIDE_CLASS.to_string(),
            display_field: DISPLAY_FIELD.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ReactiveError::Config {
            reason: format!("Failed to read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(ReactiveError::Config {
                reason: "max_passes must be at least 1".into(),
            });
        }
        if self.show_class.is_empty() || self.hide_class.is_empty() {
            return Err(ReactiveError::Config {
                reason: "show_class and hide_class cannot be empty".into(),
            });
        }
        if self.show_class == self.hide_class {
            return Err(ReactiveError::Config {
                reason: "show_class and hide_class must differ".into(),
            });
        }
        Ok(())
    }
}
