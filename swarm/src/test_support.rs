//! Test-only doubles for the executor and the policy factory.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use crate::core::handler::{Creep, HandlerRegistry, TaskHandler, handler_fn};
use crate::core::lifecycle::PolicyScheduler;
use crate::core::memory::{TaskList, TaskMemory};
use crate::core::modules::PolicyModule;
use crate::core::policy::{Policy, PolicyId, PolicyType};
use crate::core::task::{DoneActions, Task, TaskResult, TaskType};

/// In-memory creep that records pickups and messages.
#[derive(Debug, Clone, Default)]
pub struct TestCreep {
    pub name: String,
    pub memory: TaskMemory,
    pub pickups: usize,
    pub said: Vec<String>,
}

impl TestCreep {
    pub fn new(name: &str, tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            name: name.to_string(),
            memory: TaskMemory::new(tasks),
            ..Self::default()
        }
    }
}

impl Creep for TestCreep {
    fn name(&self) -> &str {
        &self.name
    }

    fn memory(&self) -> &TaskMemory {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut TaskMemory {
        &mut self.memory
    }

    fn pickup_loose_resource(&mut self) -> bool {
        self.pickups += 1;
        true
    }

    fn say(&mut self, message: &str) {
        self.said.push(message.to_string());
    }
}

#[derive(Debug)]
struct Script {
    default: TaskResult,
    queued: BTreeMap<TaskType, VecDeque<TaskResult>>,
    replacements: BTreeMap<TaskType, Vec<Task>>,
    unshifts: BTreeMap<TaskType, Task>,
    seen: Vec<Vec<TaskType>>,
    calls: usize,
}

/// Handlers that answer from a per-type queue of results.
///
/// Once a type's queue is empty it answers with the default result.
#[derive(Debug, Clone)]
pub struct ScriptedHandlers {
    script: Rc<RefCell<Script>>,
}

impl ScriptedHandlers {
    pub fn always(default: TaskResult) -> Self {
        Self {
            script: Rc::new(RefCell::new(Script {
                default,
                queued: BTreeMap::new(),
                replacements: BTreeMap::new(),
                unshifts: BTreeMap::new(),
                seen: Vec::new(),
                calls: 0,
            })),
        }
    }

    /// Queue results for the next dispatches of `task_type`.
    pub fn script(&self, task_type: TaskType, results: impl IntoIterator<Item = TaskResult>) {
        self.script
            .borrow_mut()
            .queued
            .entry(task_type)
            .or_default()
            .extend(results);
    }

    /// On the next dispatch of `task_type`, replace the creep's task list
    /// with `tasks` and answer `Reset`.
    pub fn replace_on(&self, task_type: TaskType, tasks: Vec<Task>) {
        self.script
            .borrow_mut()
            .replacements
            .insert(task_type, tasks);
    }

    /// On the next dispatch of `task_type`, put `task` at the head of the
    /// creep's list before answering.
    pub fn unshift_on(&self, task_type: TaskType, task: Task) {
        self.script.borrow_mut().unshifts.insert(task_type, task);
    }

    /// The creep's task list as each handler invocation found it.
    pub fn seen(&self) -> Vec<Vec<TaskType>> {
        self.script.borrow().seen.clone()
    }

    /// Number of handler invocations so far.
    pub fn calls(&self) -> usize {
        self.script.borrow().calls
    }

    pub fn registry(&self) -> HandlerRegistry<TestCreep> {
        let handlers = TaskType::ALL.map(|task_type| {
            let script = Rc::clone(&self.script);
            let handler: Box<dyn TaskHandler<TestCreep>> = handler_fn(
                move |creep: &mut TestCreep, _: &mut Task, _: &DoneActions| {
                    let mut script = script.borrow_mut();
                    script.calls += 1;
                    script.seen.push(task_types(&creep.memory.tasklist));
                    if let Some(task) = script.unshifts.remove(&task_type) {
                        creep.memory.unshift_task(task);
                    }
                    if let Some(tasks) = script.replacements.remove(&task_type) {
                        creep.memory.replace_tasklist(tasks);
                        return TaskResult::Reset;
                    }
                    let default = script.default;
                    script
                        .queued
                        .get_mut(&task_type)
                        .and_then(VecDeque::pop_front)
                        .unwrap_or(default)
                },
            );
            (task_type, handler)
        });
        HandlerRegistry::new(handlers).expect("scripted registry covers every task type")
    }
}

/// Task types of a list, head first.
pub fn task_types(list: &TaskList) -> Vec<TaskType> {
    list.iter().map(Task::task_type).collect()
}

/// A call seen by [`RecordingScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    Initialise(PolicyId),
    Activate(PolicyId),
}

/// Scheduler double that logs initialise and activate calls in order.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    events: RefCell<Vec<SchedulerEvent>>,
    last_id: PolicyId,
    pool_reserved: bool,
}

impl RecordingScheduler {
    pub fn events(&self) -> Vec<SchedulerEvent> {
        self.events.borrow().clone()
    }
}

impl PolicyModule for RecordingScheduler {
    fn initialise_policy(&self, policy: &mut Policy) {
        self.events
            .borrow_mut()
            .push(SchedulerEvent::Initialise(policy.id));
    }

    fn is_complete(&self, _policy: &Policy) -> bool {
        false
    }
}

impl PolicyScheduler for RecordingScheduler {
    fn next_policy_id(&mut self) -> PolicyId {
        self.last_id += 1;
        self.last_id
    }

    fn pool_reserved(&self) -> bool {
        self.pool_reserved
    }

    fn reserve_pool(&mut self) -> bool {
        !std::mem::replace(&mut self.pool_reserved, true)
    }

    fn module_for(&self, _kind: PolicyType) -> &dyn PolicyModule {
        self
    }

    fn activate_policy(&mut self, policy: &Policy) -> i64 {
        let mut events = self.events.borrow_mut();
        events.push(SchedulerEvent::Activate(policy.id));
        events.len() as i64
    }
}
