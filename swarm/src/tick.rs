//! Tick orchestration for `swarm tick`.
//!
//! One tick runs the executor once for every creep in the world (in name
//! order), then retires policies whose modules report them complete. State
//! is loaded from `.swarm/` before the first tick and written back after the
//! last one.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::executor::{TaskExecutor, TickReport};
use crate::core::lifecycle::PolicyLifecycle;
use crate::core::policy::PolicyId;
use crate::error::SwarmError;
use crate::io::config::load_config;
use crate::io::init::SwarmPaths;
use crate::io::world_store::{load_world, write_world};
use crate::registry::{open_lifecycle, save_lifecycle};
use crate::sim::creep::SimCreep;
use crate::sim::handlers;
use crate::sim::world::World;

/// Result of one creep's turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreepTick {
    pub name: String,
    pub report: TickReport,
}

/// Result of one world tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: u64,
    pub creeps: Vec<CreepTick>,
    pub retired: Vec<PolicyId>,
}

impl TickSummary {
    pub fn idle_creeps(&self) -> impl Iterator<Item = &str> {
        self.creeps
            .iter()
            .filter(|creep| creep.report.idle)
            .map(|creep| creep.name.as_str())
    }

    pub fn all_idle(&self) -> bool {
        self.creeps.iter().all(|creep| creep.report.idle)
    }
}

/// Advance `world` by one tick, running every creep's task list.
pub fn run_world_tick(
    world: &mut World,
    executor: &TaskExecutor,
    show_tasks: bool,
) -> Result<Vec<CreepTick>, SwarmError> {
    world.tick += 1;
    let mut creeps = Vec::with_capacity(world.creeps.len());
    for (name, state) in &mut world.creeps {
        state.saying = None;
        let mut creep = SimCreep::new(name, state, &mut world.env);
        // Built per creep: the registry is tied to the creep's borrow.
        let registry = handlers::registry()?;
        if show_tasks {
            executor.show_tasks(&creep);
        }
        let report = executor.run(&mut creep, &registry);
        debug!(
            tick = world.tick,
            creep = %name,
            actions = report.actions,
            last = ?report.last_result,
            "creep tick done"
        );
        creeps.push(CreepTick {
            name: name.clone(),
            report,
        });
    }
    Ok(creeps)
}

/// One world tick followed by policy retirement.
pub fn tick_once(
    world: &mut World,
    lifecycle: &mut PolicyLifecycle,
    executor: &TaskExecutor,
    show_tasks: bool,
) -> Result<TickSummary, SwarmError> {
    let creeps = run_world_tick(world, executor, show_tasks)?;
    let retired = lifecycle.retire_completed();
    Ok(TickSummary {
        tick: world.tick,
        creeps,
        retired,
    })
}

/// Load `.swarm/` state under `root`, run `count` ticks and persist the
/// result.
pub fn run_ticks(root: &Path, count: u32) -> Result<Vec<TickSummary>> {
    let paths = SwarmPaths::new(root);
    let config = load_config(&paths.config_path)
        .with_context(|| format!("load {}", paths.config_path.display()))?;
    let mut world = load_world(&paths.world_path)?;
    let mut lifecycle = open_lifecycle(&paths, &config)?;
    let executor = config.executor();

    let mut summaries = Vec::new();
    for _ in 0..count {
        let summary = tick_once(&mut world, &mut lifecycle, &executor, config.show_tasks)?;
        info!(
            tick = summary.tick,
            creeps = summary.creeps.len(),
            idle = summary.idle_creeps().count(),
            retired = summary.retired.len(),
            "tick complete"
        );
        summaries.push(summary);
    }

    write_world(&paths.world_path, &world)?;
    save_lifecycle(&paths, &lifecycle)?;
    Ok(summaries)
}
