//! Task catalog: task kinds, action tags and the closed result vocabulary.
//!
//! These types are the contract between the executor, the handlers and the
//! external assignment logic that fills task lists. Adding a task kind means
//! adding a [`TaskKind`] variant and registering a handler for it; the
//! executor does not change.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminant of a [`TaskKind`], used to key handler dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Harvest,
    MoveFind,
    Offload,
    MovePos,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Harvest,
        TaskType::MoveFind,
        TaskType::Offload,
        TaskType::MovePos,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Harvest => "harvest",
            TaskType::MoveFind => "move_find",
            TaskType::Offload => "offload",
            TaskType::MovePos => "move_pos",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one handler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskResult {
    /// Goal achieved this tick.
    Finished,
    /// Not yet; try the same task again next tick.
    Unfinished,
    /// Attempt did not achieve its goal. Advances the list like `Finished`.
    Failed,
    /// Retry the previously displaced task before continuing.
    Rollback,
    /// The agent's task list was replaced during the step.
    Reset,
}

impl TaskResult {
    /// True if the executor may attempt another task this tick.
    pub fn continues_tick(self) -> bool {
        matches!(
            self,
            TaskResult::Finished | TaskResult::Failed | TaskResult::Rollback
        )
    }

    /// True if the task that produced this result leaves the head of the list.
    pub fn advances_list(self) -> bool {
        matches!(
            self,
            TaskResult::Finished | TaskResult::Failed | TaskResult::Reset
        )
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskResult::Finished => "finished",
            TaskResult::Unfinished => "unfinished",
            TaskResult::Failed => "failed",
            TaskResult::Rollback => "rollback",
            TaskResult::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Action tags a task claims when it runs. Two tasks sharing a tag cannot
/// both complete in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Pickup,
    Move,
    Harvest,
    Transfer,
    Withdraw,
    Build,
    Repair,
    Upgrade,
    Attack,
    Heal,
}

/// What a move-find task searches for when it has no explicit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindTarget {
    Source,
    Store,
    Dropped,
}

/// Task kind together with its kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "taskType",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum TaskKind {
    Harvest {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_id: Option<String>,
    },
    MoveFind {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_id: Option<String>,
        find: FindTarget,
        #[serde(default = "default_range")]
        range: u32,
    },
    Offload {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_id: Option<String>,
    },
    MovePos {
        x: i32,
        y: i32,
        #[serde(default)]
        range: u32,
    },
}

fn default_range() -> u32 {
    1
}

impl TaskKind {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskKind::Harvest { .. } => TaskType::Harvest,
            TaskKind::MoveFind { .. } => TaskType::MoveFind,
            TaskKind::Offload { .. } => TaskType::Offload,
            TaskKind::MovePos { .. } => TaskType::MovePos,
        }
    }
}

/// A single unit of pending work attached to one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(flatten)]
    pub kind: TaskKind,
    #[serde(default)]
    pub conflicts: BTreeSet<Action>,
    /// Re-append at the tail on completion instead of discarding.
    #[serde(default, rename = "loop")]
    pub is_loop: bool,
    /// Collect an adjacent loose resource before running.
    #[serde(default)]
    pub pickup: bool,
    /// Copy of the task that triggered a rollback onto this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_task: Option<Box<Task>>,
}

impl Task {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            conflicts: BTreeSet::new(),
            is_loop: false,
            pickup: false,
            last_task: None,
        }
    }

    pub fn harvest(source_id: Option<&str>) -> Self {
        Self::new(TaskKind::Harvest {
            source_id: source_id.map(str::to_string),
        })
        .with_conflicts([Action::Harvest])
    }

    pub fn move_find(find: FindTarget, range: u32) -> Self {
        Self::new(TaskKind::MoveFind {
            target_id: None,
            find,
            range,
        })
        .with_conflicts([Action::Move])
    }

    pub fn offload(target_id: Option<&str>) -> Self {
        Self::new(TaskKind::Offload {
            target_id: target_id.map(str::to_string),
        })
        .with_conflicts([Action::Transfer])
    }

    pub fn move_pos(x: i32, y: i32, range: u32) -> Self {
        Self::new(TaskKind::MovePos { x, y, range }).with_conflicts([Action::Move])
    }

    pub fn task_type(&self) -> TaskType {
        self.kind.task_type()
    }

    pub fn with_conflicts(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.conflicts.extend(actions);
        self
    }

    pub fn looping(mut self) -> Self {
        self.is_loop = true;
        self
    }

    pub fn with_pickup(mut self) -> Self {
        self.pickup = true;
        self
    }

    /// Copy suitable for a rollback back-reference. The copy's own
    /// back-reference is dropped so chains never nest.
    pub fn back_reference(&self) -> Box<Task> {
        Box::new(Task {
            last_task: None,
            ..self.clone()
        })
    }
}

/// Per-tick set of action tags already committed by one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoneActions {
    actions: BTreeSet<Action>,
}

impl DoneActions {
    pub fn record(&mut self, action: Action) {
        self.actions.insert(action);
    }

    pub fn record_all<'a>(&mut self, actions: impl IntoIterator<Item = &'a Action>) {
        self.actions.extend(actions.into_iter().copied());
    }

    pub fn contains(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    /// True if any of `claims` was already committed this tick.
    pub fn conflicts_with(&self, claims: &BTreeSet<Action>) -> bool {
        !self.actions.is_disjoint(claims)
    }
}
