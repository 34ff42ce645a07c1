//! Persisted per-agent task state.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::task::Task;

/// Ordered pending tasks; the front is the next task to attempt.
pub type TaskList = VecDeque<Task>;

/// The `tasks` record of an agent's persisted memory.
///
/// Owned exclusively by one agent. It must exist (possibly with an empty
/// list) before the executor runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMemory {
    #[serde(default)]
    pub tasklist: TaskList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    /// Slot of the task whose handler is running, while a step is in flight.
    #[serde(skip)]
    running: Option<usize>,
}

impl TaskMemory {
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            tasklist: tasks.into_iter().collect(),
            target_id: None,
            running: None,
        }
    }

    /// Put `task` at the head so it runs next, ahead of a task whose step is
    /// in progress.
    pub fn unshift_task(&mut self, task: Task) {
        if let Some(slot) = &mut self.running {
            *slot += 1;
        }
        self.tasklist.push_front(task);
    }

    /// Replace the whole list. A handler doing this mid-step must report
    /// [`TaskResult::Reset`](crate::core::task::TaskResult::Reset); the
    /// running task is not carried over.
    pub fn replace_tasklist(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.running = None;
        self.tasklist = tasks.into_iter().collect();
    }

    /// Mark the head as running and hand out a working copy of it. The head
    /// stays in the list until [`TaskMemory::end_step`].
    pub(crate) fn begin_step(&mut self) -> Option<Task> {
        let task = self.tasklist.front().cloned()?;
        self.running = Some(0);
        Some(task)
    }

    /// Where the running task sits now, or `None` if the list was replaced.
    pub(crate) fn end_step(&mut self) -> Option<usize> {
        self.running.take()
    }

    pub fn target_id(&self) -> Option<&str> {
        self.target_id.as_deref()
    }

    pub fn set_target_id(&mut self, target_id: Option<String>) {
        self.target_id = target_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::TaskType;

    #[test]
    fn unshift_puts_task_at_head() {
        let mut memory = TaskMemory::new([Task::harvest(None)]);
        memory.unshift_task(Task::move_pos(1, 2, 0));
        let types: Vec<TaskType> = memory.tasklist.iter().map(Task::task_type).collect();
        assert_eq!(types, vec![TaskType::MovePos, TaskType::Harvest]);
    }

    #[test]
    fn unshift_during_step_tracks_running_slot() {
        let mut memory = TaskMemory::new([Task::harvest(None), Task::offload(None)]);
        let running = memory.begin_step().expect("head");
        assert_eq!(running.task_type(), TaskType::Harvest);

        memory.unshift_task(Task::move_pos(1, 2, 0));
        memory.unshift_task(Task::move_pos(3, 4, 0));

        assert_eq!(memory.end_step(), Some(2));
        assert_eq!(memory.tasklist[2].task_type(), TaskType::Harvest);
        assert_eq!(memory.end_step(), None);
    }

    #[test]
    fn replacing_the_list_forgets_the_running_slot() {
        let mut memory = TaskMemory::new([Task::harvest(None)]);
        memory.begin_step();
        memory.replace_tasklist([Task::offload(None)]);
        assert_eq!(memory.end_step(), None);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let memory: TaskMemory = serde_json::from_str("{}").expect("parse");
        assert!(memory.tasklist.is_empty());
        assert_eq!(memory.target_id(), None);
    }
}
