//! Policy lifecycle: id allocation, module dispatch, activation and
//! retirement.
//!
//! Every policy kind goes through the same two steps before it consumes
//! agents or resources: its module initialises the record, then the
//! scheduler activates it. [`PolicyLifecycle`] is the production scheduler;
//! the factory only sees the [`PolicyScheduler`] trait.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::modules::{PolicyModule, PolicyModules};
use crate::core::policy::{POOL_POLICY_ID, Policy, PolicyBody, PolicyId, PolicyType};
use crate::core::pool::PoolPolicy;
use crate::error::SwarmError;

/// Default number of policies the registry accepts.
pub const DEFAULT_MAX_ACTIVE_POLICIES: usize = 100;

/// Process-scoped source of policy ids.
///
/// Ids start at 1; 0 belongs to the pool, which may be reserved once.
#[derive(Debug)]
pub struct PolicyIdAllocator {
    next: AtomicU64,
    pool_reserved: AtomicBool,
}

impl Default for PolicyIdAllocator {
    fn default() -> Self {
        Self::new(POOL_POLICY_ID + 1, false)
    }
}

impl PolicyIdAllocator {
    pub fn new(next: PolicyId, pool_reserved: bool) -> Self {
        Self {
            next: AtomicU64::new(next.max(POOL_POLICY_ID + 1)),
            pool_reserved: AtomicBool::new(pool_reserved),
        }
    }

    pub fn next_id(&self) -> PolicyId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> PolicyId {
        self.next.load(Ordering::Relaxed)
    }

    /// Claim the pool id. True only for the first caller.
    pub fn reserve_pool(&self) -> bool {
        !self.pool_reserved.swap(true, Ordering::Relaxed)
    }

    pub fn pool_reserved(&self) -> bool {
        self.pool_reserved.load(Ordering::Relaxed)
    }
}

/// Scheduling/registration interface consumed by the policy factory.
pub trait PolicyScheduler {
    fn next_policy_id(&mut self) -> PolicyId;

    /// True once the singleton pool id has been claimed.
    fn pool_reserved(&self) -> bool;

    /// Claim the singleton pool id. False if it was already claimed.
    fn reserve_pool(&mut self) -> bool;

    fn module_for(&self, kind: PolicyType) -> &dyn PolicyModule;

    /// Register `policy` as active. Non-positive means activation failed.
    fn activate_policy(&mut self, policy: &Policy) -> i64;
}

/// Persisted form of the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySnapshot {
    pub next_policy_id: PolicyId,
    #[serde(default)]
    pub pool_created: bool,
    #[serde(default)]
    pub policies: BTreeMap<PolicyId, Policy>,
}

pub struct PolicyLifecycle {
    ids: PolicyIdAllocator,
    modules: PolicyModules,
    registry: BTreeMap<PolicyId, Policy>,
    max_active: usize,
}

impl Default for PolicyLifecycle {
    fn default() -> Self {
        Self::new(PolicyModules::standard(), DEFAULT_MAX_ACTIVE_POLICIES)
    }
}

impl PolicyLifecycle {
    pub fn new(modules: PolicyModules, max_active: usize) -> Self {
        Self {
            ids: PolicyIdAllocator::default(),
            modules,
            registry: BTreeMap::new(),
            max_active,
        }
    }

    pub fn restore(snapshot: PolicySnapshot, modules: PolicyModules, max_active: usize) -> Self {
        let pool_created = snapshot.pool_created || snapshot.policies.contains_key(&POOL_POLICY_ID);
        // Never hand out an id at or below one already in the registry.
        let floor = snapshot
            .policies
            .keys()
            .next_back()
            .map_or(0, |highest| highest + 1);
        Self {
            ids: PolicyIdAllocator::new(snapshot.next_policy_id.max(floor), pool_created),
            modules,
            registry: snapshot.policies,
            max_active,
        }
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            next_policy_id: self.ids.peek(),
            pool_created: self.ids.pool_reserved(),
            policies: self.registry.clone(),
        }
    }

    pub fn ids(&self) -> &PolicyIdAllocator {
        &self.ids
    }

    pub fn policy(&self, id: PolicyId) -> Option<&Policy> {
        self.registry.get(&id)
    }

    pub fn policies(&self) -> impl Iterator<Item = &Policy> {
        self.registry.values()
    }

    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Initialise `policy` through its module and activate it.
    pub fn initialise_and_activate(&mut self, policy: &mut Policy) -> i64 {
        self.modules
            .module_for(policy.policy_type())
            .initialise_policy(policy);
        self.activate_policy(policy)
    }

    /// Start a record created earlier without `start`.
    ///
    /// The id must have been issued by this registry; id 0 must carry the pool
    /// and claims the pool id once activated.
    pub fn activate_record(&mut self, mut policy: Policy) -> Result<Policy, SwarmError> {
        let id = policy.id;
        if id == POOL_POLICY_ID {
            if !matches!(policy.body, PolicyBody::ThePool(_)) {
                return Err(SwarmError::NotThePool(id));
            }
            if self.ids.pool_reserved() {
                return Err(SwarmError::PoolAlreadyCreated);
            }
        } else if id >= self.ids.peek() {
            return Err(SwarmError::UnknownPolicy(id));
        }
        if self.initialise_and_activate(&mut policy) <= 0 {
            return Err(SwarmError::RegistryFull {
                id,
                max_active: self.max_active,
            });
        }
        if id == POOL_POLICY_ID {
            self.ids.reserve_pool();
        }
        info!(policy = id, kind = %policy.policy_type(), "policy record activated");
        Ok(policy)
    }

    /// Set the cooperative shutdown flag on an active policy.
    pub fn request_shutdown(&mut self, id: PolicyId) -> Result<(), SwarmError> {
        let policy = self
            .registry
            .get_mut(&id)
            .ok_or(SwarmError::UnknownPolicy(id))?;
        let kind = policy.policy_type();
        let contract = policy
            .contract_mut()
            .ok_or(SwarmError::NoShutdownFlag { id, kind })?;
        contract.shutting_down = true;
        info!(policy = id, kind = %kind, "policy shutting down");
        Ok(())
    }

    /// Remove a policy from the registry.
    pub fn retire_policy(&mut self, id: PolicyId) -> Option<Policy> {
        let retired = self.registry.remove(&id);
        if let Some(policy) = &retired {
            info!(policy = id, kind = %policy.policy_type(), "policy retired");
        }
        retired
    }

    /// Retire every policy whose module reports it complete.
    pub fn retire_completed(&mut self) -> Vec<PolicyId> {
        let complete: Vec<PolicyId> = self
            .registry
            .values()
            .filter(|policy| {
                self.modules
                    .module_for(policy.policy_type())
                    .is_complete(policy)
            })
            .map(|policy| policy.id)
            .collect();
        for id in &complete {
            self.retire_policy(*id);
        }
        complete
    }

    /// Mutable access to the active pool.
    pub fn pool_mut(&mut self) -> Result<&mut PoolPolicy, SwarmError> {
        let policy = self
            .registry
            .get_mut(&POOL_POLICY_ID)
            .ok_or(SwarmError::UnknownPolicy(POOL_POLICY_ID))?;
        match &mut policy.body {
            PolicyBody::ThePool(pool) => Ok(pool),
            _ => Err(SwarmError::NotThePool(POOL_POLICY_ID)),
        }
    }
}

impl PolicyScheduler for PolicyLifecycle {
    fn next_policy_id(&mut self) -> PolicyId {
        self.ids.next_id()
    }

    fn pool_reserved(&self) -> bool {
        self.ids.pool_reserved()
    }

    fn reserve_pool(&mut self) -> bool {
        self.ids.reserve_pool()
    }

    fn module_for(&self, kind: PolicyType) -> &dyn PolicyModule {
        self.modules.module_for(kind)
    }

    fn activate_policy(&mut self, policy: &Policy) -> i64 {
        if !self.registry.contains_key(&policy.id) && self.registry.len() >= self.max_active {
            warn!(
                policy = policy.id,
                kind = %policy.policy_type(),
                max_active = self.max_active,
                "policy registry full; activation refused"
            );
            return 0;
        }
        self.registry.insert(policy.id, policy.clone());
        debug!(policy = policy.id, kind = %policy.policy_type(), active = self.registry.len(), "policy activated");
        i64::try_from(self.registry.len()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::{ClaimPolicy, RoomPolicy, WorkerContract};

    fn room(id: PolicyId, kind: fn(RoomPolicy) -> PolicyBody) -> Policy {
        Policy::new(
            id,
            kind(RoomPolicy {
                room: "W1N1".to_string(),
            }),
        )
    }

    #[test]
    fn ids_strictly_increase() {
        let mut lifecycle = PolicyLifecycle::default();
        let ids: Vec<PolicyId> = (0..20).map(|_| lifecycle.next_policy_id()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(ids.iter().all(|id| *id != POOL_POLICY_ID));
    }

    #[test]
    fn pool_can_be_reserved_once() {
        let allocator = PolicyIdAllocator::default();
        assert!(allocator.reserve_pool());
        assert!(!allocator.reserve_pool());
    }

    #[test]
    fn activation_refused_when_full() {
        let mut lifecycle = PolicyLifecycle::new(PolicyModules::standard(), 1);
        assert_eq!(lifecycle.activate_policy(&room(1, PolicyBody::Peace)), 1);
        assert_eq!(lifecycle.activate_policy(&room(2, PolicyBody::Defend)), 0);
        // Re-activating an existing record replaces it.
        assert_eq!(lifecycle.activate_policy(&room(1, PolicyBody::Peace)), 1);
        assert_eq!(lifecycle.active_count(), 1);
    }

    #[test]
    fn shutdown_then_retire_completed() {
        let mut lifecycle = PolicyLifecycle::default();
        let mut claim = Policy::new(
            lifecycle.next_policy_id(),
            PolicyBody::Claim(ClaimPolicy {
                start_room: "W1N1".to_string(),
                controller_id: "abc".to_string(),
                end_room: "W2N1".to_string(),
                contract: WorkerContract::default(),
            }),
        );
        assert!(lifecycle.initialise_and_activate(&mut claim) > 0);
        let peace_id = lifecycle.next_policy_id();
        lifecycle.activate_policy(&room(peace_id, PolicyBody::Peace));

        assert!(lifecycle.retire_completed().is_empty());
        lifecycle.request_shutdown(claim.id).expect("shutdown");
        assert_eq!(lifecycle.retire_completed(), vec![claim.id]);
        assert!(lifecycle.policy(claim.id).is_none());
        assert!(lifecycle.policy(peace_id).is_some());
    }

    #[test]
    fn shutdown_rejects_room_policies() {
        let mut lifecycle = PolicyLifecycle::default();
        lifecycle.activate_policy(&room(5, PolicyBody::Rescue));
        assert_eq!(
            lifecycle.request_shutdown(5),
            Err(SwarmError::NoShutdownFlag {
                id: 5,
                kind: PolicyType::Rescue
            })
        );
        assert_eq!(
            lifecycle.request_shutdown(6),
            Err(SwarmError::UnknownPolicy(6))
        );
    }

    #[test]
    fn inert_record_activates_through_its_module() {
        let mut lifecycle = PolicyLifecycle::default();
        let claim = Policy::new(
            lifecycle.next_policy_id(),
            PolicyBody::Claim(ClaimPolicy {
                start_room: "W1N1".to_string(),
                controller_id: "abc".to_string(),
                end_room: "W2N1".to_string(),
                contract: WorkerContract::default(),
            }),
        );

        let active = lifecycle.activate_record(claim).expect("activate");

        assert_eq!(active.contract().map(|c| c.workers_contracted_for), Some(1));
        assert_eq!(lifecycle.policy(active.id), Some(&active));
    }

    #[test]
    fn inert_pool_record_claims_the_pool_id_once() {
        let mut lifecycle = PolicyLifecycle::default();
        let pool = Policy::new(POOL_POLICY_ID, PolicyBody::ThePool(PoolPolicy::default()));

        lifecycle.activate_record(pool.clone()).expect("activate");

        assert!(lifecycle.ids().pool_reserved());
        assert!(lifecycle.pool_mut().is_ok());
        assert_eq!(
            lifecycle.activate_record(pool),
            Err(SwarmError::PoolAlreadyCreated)
        );
    }

    #[test]
    fn activate_record_rejects_unissued_ids_and_full_registry() {
        let mut lifecycle = PolicyLifecycle::new(PolicyModules::standard(), 0);
        assert_eq!(
            lifecycle.activate_record(room(9, PolicyBody::Peace)),
            Err(SwarmError::UnknownPolicy(9))
        );
        assert_eq!(
            lifecycle.activate_record(room(POOL_POLICY_ID, PolicyBody::Peace)),
            Err(SwarmError::NotThePool(POOL_POLICY_ID))
        );

        let id = lifecycle.next_policy_id();
        assert_eq!(
            lifecycle.activate_record(room(id, PolicyBody::Peace)),
            Err(SwarmError::RegistryFull { id, max_active: 0 })
        );
    }

    #[test]
    fn restore_never_reissues_registered_ids() {
        let mut lifecycle = PolicyLifecycle::default();
        lifecycle.activate_policy(&room(40, PolicyBody::Construction));
        let mut snapshot = lifecycle.snapshot();
        snapshot.next_policy_id = 3;

        let mut restored =
            PolicyLifecycle::restore(snapshot, PolicyModules::standard(), DEFAULT_MAX_ACTIVE_POLICIES);
        assert_eq!(restored.next_policy_id(), 41);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut lifecycle = PolicyLifecycle::default();
        let id = lifecycle.next_policy_id();
        lifecycle.activate_policy(&room(id, PolicyBody::NeutralRoom));
        let snapshot = lifecycle.snapshot();

        let json = serde_json::to_string(&snapshot).expect("serialize");
        let back: PolicySnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snapshot);
        assert_eq!(back.next_policy_id, id + 1);
    }
}
