//! Typed errors for the swarm core.
//!
//! The task layer itself never fails a tick: conflicts, unfinished work and
//! failed attempts are ordinary [`TaskResult`](crate::core::task::TaskResult)
//! values. These errors cover setup and registry lookups only.

use thiserror::Error;

use crate::core::policy::{PolicyId, PolicyType};
use crate::core::task::TaskType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwarmError {
    #[error("no task handler registered for task type '{0}'")]
    MissingHandler(TaskType),

    #[error("no policy module registered for policy type '{0}'")]
    MissingModule(PolicyType),

    #[error("the pool policy has already been created")]
    PoolAlreadyCreated,

    #[error("unknown policy id {0}")]
    UnknownPolicy(PolicyId),

    #[error("policy {id} ({kind}) has no shutdown flag")]
    NoShutdownFlag { id: PolicyId, kind: PolicyType },

    #[error("policy {0} is not the pool")]
    NotThePool(PolicyId),

    #[error("policy registry is full ({max_active} active); policy {id} was not activated")]
    RegistryFull { id: PolicyId, max_active: usize },
}
