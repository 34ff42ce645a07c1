//! Governing modules: one per policy kind.
//!
//! A module attaches derived state to a fresh policy record and later decides
//! whether the policy is complete and may be retired.

use std::collections::BTreeMap;

use crate::core::policy::{Policy, PolicyBody, PolicyType};
use crate::error::SwarmError;

pub trait PolicyModule {
    /// Attach derived/default state before activation.
    fn initialise_policy(&self, policy: &mut Policy);

    /// True once the policy has wound down and can leave the registry.
    fn is_complete(&self, policy: &Policy) -> bool;
}

/// Room-scoped policies and the pool: nothing to derive, never complete.
pub struct StandingModule;

impl PolicyModule for StandingModule {
    fn initialise_policy(&self, _policy: &mut Policy) {}

    fn is_complete(&self, _policy: &Policy) -> bool {
        false
    }
}

/// Cross-room policies governed by a [`WorkerContract`](crate::core::policy::WorkerContract).
///
/// `minimum_workers` is contracted on initialise when nothing is contracted
/// yet (a claim needs exactly one claimer).
pub struct ContractModule {
    pub minimum_workers: u32,
}

impl PolicyModule for ContractModule {
    fn initialise_policy(&self, policy: &mut Policy) {
        if let Some(contract) = policy
            .contract_mut()
            .filter(|contract| contract.workers_contracted_for == 0)
        {
            contract.workers_contracted_for = self.minimum_workers;
        }
    }

    fn is_complete(&self, policy: &Policy) -> bool {
        let Some(contract) = policy.contract() else {
            return false;
        };
        let drained = contract.workers_assigned == 0;
        drained && (contract.shutting_down || contract.workers_contracted_for == 0)
    }
}

pub struct GiftWorkersModule;

impl PolicyModule for GiftWorkersModule {
    fn initialise_policy(&self, _policy: &mut Policy) {}

    fn is_complete(&self, policy: &Policy) -> bool {
        match &policy.body {
            PolicyBody::GiftWorkers(gift) => gift.workers_delivered >= gift.workers_contracted_for,
            _ => false,
        }
    }
}

/// Many-to-one link networks.
pub struct LinkersModule;

impl PolicyModule for LinkersModule {
    fn initialise_policy(&self, policy: &mut Policy) {
        if let PolicyBody::Many2OneLinkers(linkers) = &mut policy.body {
            linkers.link_creeps.get_or_insert_with(Default::default);
        }
    }

    fn is_complete(&self, _policy: &Policy) -> bool {
        false
    }
}

/// Dispatch table from policy kind to governing module.
pub struct PolicyModules {
    /// One module per kind, indexed by [`PolicyType::index`].
    modules: Vec<Box<dyn PolicyModule>>,
}

impl PolicyModules {
    /// Build a table; fails unless every policy kind is covered.
    pub fn new(
        modules: impl IntoIterator<Item = (PolicyType, Box<dyn PolicyModule>)>,
    ) -> Result<Self, SwarmError> {
        let mut by_kind: BTreeMap<_, _> = modules.into_iter().collect();
        let modules = PolicyType::ALL
            .into_iter()
            .map(|kind| by_kind.remove(&kind).ok_or(SwarmError::MissingModule(kind)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { modules })
    }

    /// The module set used in production.
    pub fn standard() -> Self {
        let modules = PolicyType::ALL.map(|kind| -> Box<dyn PolicyModule> {
            match kind {
                PolicyType::ThePool
                | PolicyType::Peace
                | PolicyType::Construction
                | PolicyType::Defend
                | PolicyType::Rescue
                | PolicyType::NeutralRoom
                | PolicyType::BuildSpawn => Box::new(StandingModule),
                PolicyType::Claim => Box::new(ContractModule { minimum_workers: 1 }),
                PolicyType::ForeignHarvest | PolicyType::ForeignRoad => {
                    Box::new(ContractModule { minimum_workers: 0 })
                }
                PolicyType::GiftWorkers => Box::new(GiftWorkersModule),
                PolicyType::Many2OneLinkers => Box::new(LinkersModule),
            }
        });
        Self {
            modules: modules.into_iter().collect(),
        }
    }

    pub fn module_for(&self, kind: PolicyType) -> &dyn PolicyModule {
        // Both constructors fill every slot of `PolicyType::ALL`.
        self.modules[kind.index()].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::{ClaimPolicy, GiftWorkersPolicy, WorkerContract};

    fn claim(contract: WorkerContract) -> Policy {
        Policy::new(
            1,
            PolicyBody::Claim(ClaimPolicy {
                start_room: "W1N1".to_string(),
                controller_id: "c".to_string(),
                end_room: "W2N1".to_string(),
                contract,
            }),
        )
    }

    #[test]
    fn table_requires_every_kind() {
        let result = PolicyModules::new([(
            PolicyType::Peace,
            Box::new(StandingModule) as Box<dyn PolicyModule>,
        )]);
        assert!(matches!(result, Err(SwarmError::MissingModule(_))));
    }

    #[test]
    fn table_dispatches_each_kind_to_its_own_module() {
        let modules = PolicyModules::new(PolicyType::ALL.map(|kind| {
            let module: Box<dyn PolicyModule> = if kind == PolicyType::Peace {
                Box::new(ContractModule { minimum_workers: 0 })
            } else {
                Box::new(StandingModule)
            };
            (kind, module)
        }))
        .expect("complete table");
        let mut shut_down = claim(WorkerContract::default());
        if let Some(contract) = shut_down.contract_mut() {
            contract.shutting_down = true;
        }

        assert!(modules.module_for(PolicyType::Peace).is_complete(&shut_down));
        assert!(!modules.module_for(PolicyType::Claim).is_complete(&shut_down));
    }

    #[test]
    fn claim_initialise_contracts_one_claimer() {
        let modules = PolicyModules::standard();
        let mut policy = claim(WorkerContract::default());
        modules
            .module_for(PolicyType::Claim)
            .initialise_policy(&mut policy);
        assert_eq!(policy.contract().map(|c| c.workers_contracted_for), Some(1));
    }

    #[test]
    fn contract_completes_only_when_drained_and_shut_down() {
        let module = ContractModule { minimum_workers: 0 };
        let busy = claim(WorkerContract {
            workers_contracted_for: 2,
            workers_assigned: 1,
            shutting_down: true,
        });
        let drained = claim(WorkerContract {
            workers_contracted_for: 2,
            workers_assigned: 0,
            shutting_down: true,
        });
        let running = claim(WorkerContract::contracted(2));
        assert!(!module.is_complete(&busy));
        assert!(module.is_complete(&drained));
        assert!(!module.is_complete(&running));
    }

    #[test]
    fn gift_completes_on_delivery() {
        let mut policy = Policy::new(
            4,
            PolicyBody::GiftWorkers(GiftWorkersPolicy {
                start_room: "W1N1".to_string(),
                end_room: "W3N3".to_string(),
                workers_contracted_for: 2,
                workers_assigned: 2,
                workers_delivered: 1,
            }),
        );
        assert!(!GiftWorkersModule.is_complete(&policy));
        if let PolicyBody::GiftWorkers(gift) = &mut policy.body {
            gift.workers_delivered = 2;
        }
        assert!(GiftWorkersModule.is_complete(&policy));
    }
}
