//! Swarm configuration stored under `.swarm/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::executor::{IDLE_MESSAGE, MAX_TASK_ACTIONS, TaskExecutor};
use crate::core::lifecycle::DEFAULT_MAX_ACTIVE_POLICIES;

/// Swarm configuration (TOML).
///
/// Missing fields default to the values the executor and registry use when
/// no config file exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SwarmConfig {
    /// Task iterations each agent may spend per tick.
    pub max_task_actions: usize,

    /// What an agent says when its task list runs dry.
    pub idle_message: String,

    /// Maximum number of policies the registry activates.
    pub max_active_policies: usize,

    /// Log every pending task of every agent before its tick.
    pub show_tasks: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            max_task_actions: MAX_TASK_ACTIONS,
            idle_message: IDLE_MESSAGE.to_string(),
            max_active_policies: DEFAULT_MAX_ACTIVE_POLICIES,
            show_tasks: false,
        }
    }
}

impl SwarmConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_task_actions == 0 {
            return Err(anyhow!("max_task_actions must be > 0"));
        }
        if self.max_active_policies == 0 {
            return Err(anyhow!("max_active_policies must be > 0"));
        }
        if self.idle_message.trim().is_empty() {
            return Err(anyhow!("idle_message must not be empty"));
        }
        Ok(())
    }

    pub fn executor(&self) -> TaskExecutor {
        TaskExecutor::new(self.max_task_actions, self.idle_message.clone())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SwarmConfig::default()`.
pub fn load_config(path: &Path) -> Result<SwarmConfig> {
    if !path.exists() {
        let cfg = SwarmConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SwarmConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SwarmConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    super::write_atomic(path, &buf)
}
