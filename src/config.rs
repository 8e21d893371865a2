//! Configuration loading and management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::hotkey::{parse_key_name, KeyMap};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "BETTER_PASTE_CONFIG";

const CONFIG_FILE_NAME: &str = "agent.json";
const HELPER_FILE_NAME: &str = "BetterAdvancedPasteCLI.exe";

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Letter completing the Win+Shift chord
    pub target_key: String,

    /// Helper executable, defaults to the one beside the agent
    pub helper_path: Option<PathBuf>,

    /// Upper bound for one folder lookup
    pub resolve_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_key: "V".to_string(),
            helper_path: None,
            resolve_timeout_ms: 2000,
        }
    }
}

impl Config {
    /// Load configuration from the config file, or defaults if there is none
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => exe_dir()?.join(CONFIG_FILE_NAME),
        };
        Self::load_from(&path)
    }

    /// Load from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        Self::from_json(&text).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.resolve_timeout_ms == 0 {
            bail!("resolve_timeout_ms must be greater than zero");
        }
        self.key_map()?;
        Ok(())
    }

    /// Key map for the configured target key
    pub fn key_map(&self) -> Result<KeyMap> {
        let target = parse_key_name(&self.target_key).context("invalid target_key")?;
        Ok(KeyMap::new(target))
    }

    /// Configured helper, or the default one next to the agent executable
    pub fn helper_path(&self) -> Result<PathBuf> {
        match &self.helper_path {
            Some(path) => Ok(path.clone()),
            None => Ok(exe_dir()?.join(HELPER_FILE_NAME)),
        }
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }
}

fn exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to locate agent executable")?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}
