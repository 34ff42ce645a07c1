//! Initialization helpers for `.swarm/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{SwarmConfig, write_config};
use super::policy_store::write_policies;
use super::world_store::write_world;
use crate::core::lifecycle::PolicySnapshot;
use crate::sim::world::World;

/// All canonical paths within `.swarm/` for a project root.
#[derive(Debug, Clone)]
pub struct SwarmPaths {
    pub root: PathBuf,
    pub swarm_dir: PathBuf,
    pub config_path: PathBuf,
    pub world_path: PathBuf,
    pub policies_path: PathBuf,
}

impl SwarmPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let swarm_dir = root.join(".swarm");
        Self {
            root,
            config_path: swarm_dir.join("config.toml"),
            world_path: swarm_dir.join("world.json"),
            policies_path: swarm_dir.join("policies.json"),
            swarm_dir,
        }
    }
}

/// Options for `init_swarm`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing swarm-owned files.
    pub force: bool,
}

/// Create `.swarm/` in `root` with default config, the demo world and an
/// empty policy registry.
///
/// Fails if `.swarm/` already exists unless `options.force` is set.
pub fn init_swarm(root: &Path, options: &InitOptions) -> Result<SwarmPaths> {
    let paths = SwarmPaths::new(root);
    if paths.swarm_dir.exists() && !options.force {
        return Err(anyhow!(
            "swarm init: .swarm already exists (use --force to overwrite)"
        ));
    }
    if paths.swarm_dir.exists() && !paths.swarm_dir.is_dir() {
        return Err(anyhow!("swarm init: .swarm exists but is not a directory"));
    }

    fs::create_dir_all(&paths.swarm_dir)
        .with_context(|| format!("create directory {}", paths.swarm_dir.display()))?;
    write_config(&paths.config_path, &SwarmConfig::default())?;
    write_world(&paths.world_path, &World::demo())?;
    write_policies(&paths.policies_path, &PolicySnapshot::default())?;

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::load_config;
    use crate::io::policy_store::load_policies;
    use crate::io::world_store::load_world;

    #[test]
    fn init_creates_expected_layout() {
        let temp = tempfile::tempdir().expect("tempdir");

        let paths = init_swarm(temp.path(), &InitOptions { force: false }).expect("init");

        assert!(paths.swarm_dir.is_dir());
        assert_eq!(load_config(&paths.config_path).expect("config"), SwarmConfig::default());
        assert_eq!(load_world(&paths.world_path).expect("world"), World::demo());
        assert!(load_policies(&paths.policies_path).expect("policies").policies.is_empty());
    }

    #[test]
    fn init_without_force_refuses_existing_dir() {
        let temp = tempfile::tempdir().expect("tempdir");

        init_swarm(temp.path(), &InitOptions { force: false }).expect("init");
        let err = init_swarm(temp.path(), &InitOptions { force: false }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn init_with_force_restores_demo_world() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_swarm(temp.path(), &InitOptions { force: false }).expect("init");
        fs::write(&paths.world_path, "{}").expect("clobber");

        init_swarm(temp.path(), &InitOptions { force: true }).expect("re-init");

        assert_eq!(load_world(&paths.world_path).expect("world"), World::demo());
    }
}
