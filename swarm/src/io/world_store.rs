//! World snapshot storage (`.swarm/world.json`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::sim::world::World;

/// Load the world snapshot from disk.
pub fn load_world(path: &Path) -> Result<World> {
    debug!(path = %path.display(), "loading world");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read world {}", path.display()))?;
    let world: World = serde_json::from_str(&contents)
        .with_context(|| format!("parse world {}", path.display()))?;
    debug!(tick = world.tick, creeps = world.creeps.len(), "world loaded");
    Ok(world)
}

/// Atomically write the world snapshot to disk.
pub fn write_world(path: &Path, world: &World) -> Result<()> {
    debug!(path = %path.display(), tick = world.tick, "writing world");
    let mut buf = serde_json::to_string_pretty(world).context("serialize world")?;
    buf.push('\n');
    super::write_atomic(path, &buf)
}
