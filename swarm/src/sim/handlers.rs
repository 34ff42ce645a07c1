//! Task handlers for the grid world, one per task kind.

use tracing::debug;

use crate::core::handler::{Creep, HandlerRegistry, TaskHandler};
use crate::core::task::{DoneActions, FindTarget, Task, TaskKind, TaskResult, TaskType};
use crate::error::SwarmError;
use crate::sim::creep::SimCreep;
use crate::sim::world::{Environment, Position};

/// Registry covering every task kind with the grid-world handlers.
pub fn registry<'a>() -> Result<HandlerRegistry<SimCreep<'a>>, SwarmError> {
    HandlerRegistry::new(TaskType::ALL.map(|task_type| {
        let handler: Box<dyn TaskHandler<SimCreep<'a>>> = match task_type {
            TaskType::Harvest => Box::new(HarvestHandler),
            TaskType::MoveFind => Box::new(MoveFindHandler),
            TaskType::Offload => Box::new(OffloadHandler),
            TaskType::MovePos => Box::new(MovePosHandler),
        };
        (task_type, handler)
    }))
}

/// Harvest from an adjacent source until full.
///
/// Out of reach inside a loop rolls back to the previous step (normally the
/// move that should have brought the creep here); otherwise it fails.
pub struct HarvestHandler;

impl<'a> TaskHandler<SimCreep<'a>> for HarvestHandler {
    fn step(&self, creep: &mut SimCreep<'a>, task: &mut Task, _done: &DoneActions) -> TaskResult {
        if creep.is_full() {
            return TaskResult::Finished;
        }
        let TaskKind::Harvest { source_id } = &task.kind else {
            return TaskResult::Failed;
        };
        let pos = creep.pos();
        let Some(id) = source_id
            .clone()
            .or_else(|| creep.memory().target_id().map(str::to_string))
            .filter(|id| creep.env().sources.contains_key(id))
            .or_else(|| closest_source(creep.env(), pos))
        else {
            return TaskResult::Failed;
        };

        match creep.harvest(&id) {
            None if task.is_loop => TaskResult::Rollback,
            None => TaskResult::Failed,
            Some(_) if creep.is_full() => TaskResult::Finished,
            // Source exhausted or still filling: wait for the next tick.
            Some(_) => TaskResult::Unfinished,
        }
    }
}

/// Walk toward a target (explicit or the closest of a kind) and record it as
/// the creep's current target once in range.
pub struct MoveFindHandler;

impl<'a> TaskHandler<SimCreep<'a>> for MoveFindHandler {
    fn step(&self, creep: &mut SimCreep<'a>, task: &mut Task, _done: &DoneActions) -> TaskResult {
        let TaskKind::MoveFind {
            target_id,
            find,
            range,
        } = &mut task.kind
        else {
            return TaskResult::Failed;
        };
        let pos = creep.pos();
        let known = target_id
            .as_deref()
            .and_then(|id| creep.env().position_of(id).map(|p| (id.to_string(), p)));
        let Some((id, target)) = known.or_else(|| find_closest(creep.env(), *find, pos)) else {
            debug!(creep = creep.name(), find = ?find, "nothing to move to");
            return TaskResult::Failed;
        };

        let mut distance = pos.range_to(target);
        if distance > *range {
            distance = creep.move_toward(target);
        }
        if distance > *range {
            return TaskResult::Unfinished;
        }
        creep.memory_mut().set_target_id(Some(id.clone()));
        *target_id = Some(id);
        TaskResult::Finished
    }
}

/// Transfer everything carried into an adjacent store.
pub struct OffloadHandler;

impl<'a> TaskHandler<SimCreep<'a>> for OffloadHandler {
    fn step(&self, creep: &mut SimCreep<'a>, task: &mut Task, _done: &DoneActions) -> TaskResult {
        if creep.carry() == 0 {
            return TaskResult::Finished;
        }
        let TaskKind::Offload { target_id } = &task.kind else {
            return TaskResult::Failed;
        };
        let pos = creep.pos();
        let Some(id) = target_id
            .clone()
            .or_else(|| creep.memory().target_id().map(str::to_string))
            .filter(|id| creep.env().stores.contains_key(id))
            .or_else(|| closest_store(creep.env(), pos))
        else {
            return TaskResult::Failed;
        };

        match creep.transfer(&id) {
            None => TaskResult::Failed,
            Some(_) if creep.carry() == 0 => TaskResult::Finished,
            // Store full: keep holding until it drains.
            Some(_) => TaskResult::Unfinished,
        }
    }
}

/// Walk to within `range` of a fixed position.
pub struct MovePosHandler;

impl<'a> TaskHandler<SimCreep<'a>> for MovePosHandler {
    fn step(&self, creep: &mut SimCreep<'a>, task: &mut Task, _done: &DoneActions) -> TaskResult {
        let TaskKind::MovePos { x, y, range } = task.kind else {
            return TaskResult::Failed;
        };
        let target = Position::new(x, y);
        if creep.pos().range_to(target) <= range {
            return TaskResult::Finished;
        }
        if creep.move_toward(target) <= range {
            TaskResult::Finished
        } else {
            TaskResult::Unfinished
        }
    }
}

fn closest_source(env: &Environment, from: Position) -> Option<String> {
    Environment::closest(
        from,
        env.sources
            .iter()
            .filter(|(_, s)| s.energy > 0)
            .map(|(id, s)| (id, s.pos)),
    )
}

fn closest_store(env: &Environment, from: Position) -> Option<String> {
    Environment::closest(
        from,
        env.stores
            .iter()
            .filter(|(_, s)| s.free_capacity() > 0)
            .map(|(id, s)| (id, s.pos)),
    )
}

fn find_closest(env: &Environment, find: FindTarget, from: Position) -> Option<(String, Position)> {
    let id = match find {
        FindTarget::Source => closest_source(env, from),
        FindTarget::Store => closest_store(env, from),
        FindTarget::Dropped => {
            Environment::closest(from, env.dropped.iter().map(|d| (&d.id, d.pos)))
        }
    }?;
    let pos = env.position_of(&id)?;
    Some((id, pos))
}
