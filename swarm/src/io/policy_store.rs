//! Policy registry snapshot storage (`.swarm/policies.json`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::lifecycle::PolicySnapshot;

/// Load the registry snapshot.
///
/// If the file is missing, returns an empty snapshot.
pub fn load_policies(path: &Path) -> Result<PolicySnapshot> {
    if !path.exists() {
        debug!(path = %path.display(), "no policy snapshot; starting empty");
        return Ok(PolicySnapshot::default());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read policies {}", path.display()))?;
    let snapshot: PolicySnapshot = serde_json::from_str(&contents)
        .with_context(|| format!("parse policies {}", path.display()))?;
    debug!(
        policies = snapshot.policies.len(),
        next_policy_id = snapshot.next_policy_id,
        "policies loaded"
    );
    Ok(snapshot)
}

/// Atomically write the registry snapshot.
pub fn write_policies(path: &Path, snapshot: &PolicySnapshot) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(snapshot).context("serialize policies")?;
    buf.push('\n');
    super::write_atomic(path, &buf)
}
