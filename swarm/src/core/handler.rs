//! Handler contract and the per-kind dispatch table.
//!
//! The [`Creep`] trait is the narrow slice of the agent capability surface the
//! executor needs itself. Everything else a handler does (movement, harvest,
//! transfer) goes through methods of the concrete creep type `C`, which is
//! why handlers are generic over it.

use std::collections::BTreeMap;

use crate::core::memory::TaskMemory;
use crate::core::task::{DoneActions, Task, TaskResult, TaskType};
use crate::error::SwarmError;

/// Capabilities the executor uses directly.
pub trait Creep {
    fn name(&self) -> &str;

    fn memory(&self) -> &TaskMemory;

    fn memory_mut(&mut self) -> &mut TaskMemory;

    /// Pick up the closest loose resource if one is in reach. Returns true if
    /// a pickup happened.
    fn pickup_loose_resource(&mut self) -> bool;

    /// Show a short visible message above the agent.
    fn say(&mut self, message: &str);
}

/// Step logic for one task kind.
///
/// Called at most once per tick for a given task occurrence. During the call
/// the task is still at the head of the agent's list and `task` is a working
/// copy that is written back afterwards. Tasks added with
/// [`TaskMemory::unshift_task`](crate::core::memory::TaskMemory::unshift_task)
/// land ahead of it. A handler that replaces the list must return
/// [`TaskResult::Reset`].
pub trait TaskHandler<C> {
    fn step(&self, creep: &mut C, task: &mut Task, done: &DoneActions) -> TaskResult;
}

/// Adapter turning a closure into a [`TaskHandler`].
pub struct FnHandler<F>(pub F);

impl<C, F> TaskHandler<C> for FnHandler<F>
where
    F: Fn(&mut C, &mut Task, &DoneActions) -> TaskResult,
{
    fn step(&self, creep: &mut C, task: &mut Task, done: &DoneActions) -> TaskResult {
        (self.0)(creep, task, done)
    }
}

/// Wrap a closure as a boxed handler.
pub fn handler_fn<C, F>(f: F) -> Box<dyn TaskHandler<C>>
where
    F: Fn(&mut C, &mut Task, &DoneActions) -> TaskResult + 'static,
{
    Box::new(FnHandler(f))
}

/// Dispatch table covering every [`TaskType`].
pub struct HandlerRegistry<C> {
    handlers: BTreeMap<TaskType, Box<dyn TaskHandler<C>>>,
}

impl<C> HandlerRegistry<C> {
    /// Build a registry; fails unless every task type has a handler.
    pub fn new(
        handlers: impl IntoIterator<Item = (TaskType, Box<dyn TaskHandler<C>>)>,
    ) -> Result<Self, SwarmError> {
        let handlers: BTreeMap<_, _> = handlers.into_iter().collect();
        if let Some(missing) = TaskType::ALL
            .iter()
            .find(|task_type| !handlers.contains_key(task_type))
        {
            return Err(SwarmError::MissingHandler(*missing));
        }
        Ok(Self { handlers })
    }

    pub fn get(&self, task_type: TaskType) -> Option<&dyn TaskHandler<C>> {
        self.handlers.get(&task_type).map(|handler| handler.as_ref())
    }
}
