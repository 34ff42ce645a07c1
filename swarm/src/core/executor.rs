//! Per-agent task execution for a single tick.
//!
//! The executor drains an agent's task list head-first, bounded by an action
//! budget. Waiting is expressed as [`TaskResult::Unfinished`]: the tick stops
//! and the same head task is attempted again next tick. Nothing here is fatal;
//! the worst outcome is an idle agent, which is surfaced through
//! [`Creep::say`] and the log.

use tracing::{debug, info, warn};

use crate::core::handler::{Creep, HandlerRegistry};
use crate::core::task::{Action, DoneActions, TaskResult, TaskType};

/// Default number of task iterations an agent gets per tick.
pub const MAX_TASK_ACTIONS: usize = 5;

/// Default message an agent says when its task list runs dry.
pub const IDLE_MESSAGE: &str = "What to do?";

/// What happened during one agent's tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Loop iterations consumed from the action budget.
    pub actions: usize,
    /// Task types actually handed to a handler, in order.
    pub dispatched: Vec<TaskType>,
    /// Result of the last iteration (`Finished` if the list started empty).
    pub last_result: TaskResult,
    /// True if the idle notice fired.
    pub idle: bool,
    /// Action tags committed this tick.
    pub done_actions: DoneActions,
}

#[derive(Debug, Clone)]
pub struct TaskExecutor {
    max_task_actions: usize,
    idle_message: String,
}

impl Default for TaskExecutor {
    fn default() -> Self {
        Self::new(MAX_TASK_ACTIONS, IDLE_MESSAGE)
    }
}

impl TaskExecutor {
    pub fn new(max_task_actions: usize, idle_message: impl Into<String>) -> Self {
        Self {
            max_task_actions,
            idle_message: idle_message.into(),
        }
    }

    /// Run one tick of `creep`'s task list.
    pub fn run<C: Creep>(&self, creep: &mut C, handlers: &HandlerRegistry<C>) -> TickReport {
        let mut done = DoneActions::default();
        let mut result = TaskResult::Finished;
        let mut actions = 0;
        let mut dispatched = Vec::new();

        while result.continues_tick()
            && !creep.memory().tasklist.is_empty()
            && actions < self.max_task_actions
        {
            actions += 1;
            // The head stays in the list while its handler runs on a copy.
            let Some(mut task) = creep.memory_mut().begin_step() else {
                break;
            };
            let task_type = task.task_type();

            if task.pickup {
                creep.pickup_loose_resource();
                done.record(Action::Pickup);
            }

            debug!(
                creep = creep.name(),
                task = %task_type,
                remaining = creep.memory().tasklist.len(),
                "about to do task"
            );

            result = if done.conflicts_with(&task.conflicts) {
                debug!(creep = creep.name(), task = %task_type, conflicts = ?task.conflicts, "conflict found");
                TaskResult::Unfinished
            } else {
                let step_result = match handlers.get(task_type) {
                    Some(handler) => handler.step(creep, &mut task, &done),
                    None => {
                        warn!(creep = creep.name(), task = %task_type, "no handler registered");
                        TaskResult::Failed
                    }
                };
                dispatched.push(task_type);
                if step_result == TaskResult::Finished {
                    done.record_all(&task.conflicts);
                }
                step_result
            };

            let slot = creep.memory_mut().end_step();
            let tasklist = &mut creep.memory_mut().tasklist;
            let slot = match slot {
                Some(slot) if result != TaskResult::Reset && slot < tasklist.len() => slot,
                _ => {
                    // The list in memory is adopted as it stands.
                    debug!(length = tasklist.len(), result = ?result, "task list replaced by handler");
                    continue;
                }
            };
            tasklist[slot] = task;

            match result {
                TaskResult::Rollback if tasklist[slot].is_loop => {
                    let trigger = tasklist[slot].back_reference();
                    if let Some(running) = tasklist.remove(slot) {
                        tasklist.push_front(running);
                    }
                    if tasklist.len() >= 2 {
                        if let Some(mut previous) = tasklist.pop_back() {
                            previous.last_task = Some(trigger);
                            tasklist.push_front(previous);
                        }
                    } else {
                        debug!("rollback requested on a task list shorter than two");
                    }
                }
                outcome if outcome.advances_list() => {
                    let finished = tasklist.remove(slot);
                    if let Some(looping) = finished.filter(|task| task.is_loop) {
                        tasklist.push_back(looping);
                    }
                }
                _ => {}
            }
        }

        let idle = result != TaskResult::Unfinished && creep.memory().tasklist.is_empty();
        if idle {
            self.empty_task_list(creep);
        }

        TickReport {
            actions,
            dispatched,
            last_result: result,
            idle,
            done_actions: done,
        }
    }

    /// Log every pending task of `creep` as JSON.
    pub fn show_tasks<C: Creep>(&self, creep: &C) {
        for (index, task) in creep.memory().tasklist.iter().enumerate() {
            match serde_json::to_string(task) {
                Ok(json) => debug!(creep = creep.name(), index, task = %json, "pending task"),
                Err(err) => warn!(creep = creep.name(), index, error = %err, "unserializable task"),
            }
        }
    }

    fn empty_task_list<C: Creep>(&self, creep: &mut C) {
        info!(creep = creep.name(), "empty task list");
        creep.say(&self.idle_message);
    }
}
