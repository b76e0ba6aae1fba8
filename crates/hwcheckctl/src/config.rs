//! Tool configuration.
//!
//! Configuration lives in /etc/hwcheck/config.toml. A missing file means
//! defaults; a malformed one is a configuration error the user asked us to
//! honor, so it is reported instead of ignored.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// System configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/hwcheck";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CtlConfig {
    /// Rule file to use instead of the built-in set.
    #[serde(default)]
    pub rules_file: Option<PathBuf>,

    /// Colored output (overridable per invocation with --no-color).
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_color() -> bool {
    true
}

impl Default for CtlConfig {
    fn default() -> Self {
        CtlConfig {
            rules_file: None,
            color: true,
        }
    }
}

impl CtlConfig {
    /// Load from an explicit path, or from the system location when none is
    /// given. Only the explicit path is required to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => {
                let system = Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE);
                if system.exists() {
                    Self::load_file(&system)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("malformed config file {}", path.display()))
    }
}
