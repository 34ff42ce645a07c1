//! Policy factory: one constructor per policy kind.
//!
//! Every constructor takes the kind's parameters and a trailing `start` flag.
//! With `start`, the record goes through the governing module's initialise
//! step and is then activated. The returned record is a copy either way.
//! Inputs are not validated; a malformed record fails later, when its module
//! consumes it.

use tracing::{debug, warn};

use crate::core::lifecycle::PolicyScheduler;
use crate::core::policy::{
    ClaimPolicy, DestinationLink, ForeignHarvestPolicy, GiftWorkersPolicy, LinkersPolicy,
    POOL_POLICY_ID, Policy, PolicyBody, RoadPolicy, RoomPolicy, SourceLink, WorkerContract,
};
use crate::core::pool::PoolPolicy;
use crate::error::SwarmError;

pub struct PolicyFactory<'a, S: PolicyScheduler> {
    scheduler: &'a mut S,
}

impl<'a, S: PolicyScheduler> PolicyFactory<'a, S> {
    pub fn new(scheduler: &'a mut S) -> Self {
        Self { scheduler }
    }

    /// Link network feeding several source links into one destination link.
    pub fn create_many2one_linkers_policy(
        &mut self,
        room: &str,
        from_links: Vec<SourceLink>,
        to_link: DestinationLink,
        start: bool,
    ) -> Policy {
        self.build(
            PolicyBody::Many2OneLinkers(LinkersPolicy {
                room: room.to_string(),
                from_links,
                to_link,
                link_creeps: None,
            }),
            start,
        )
    }

    /// Road building through a neutral room.
    pub fn create_neutral_builder_policy(
        &mut self,
        start_room: &str,
        work_room: &str,
        source_room: &str,
        end_room: &str,
        workers_contracted: u32,
        start: bool,
    ) -> Policy {
        self.build(
            PolicyBody::ForeignRoad(RoadPolicy {
                start_room: start_room.to_string(),
                work_room: work_room.to_string(),
                source_room: source_room.to_string(),
                end_room: end_room.to_string(),
                contract: WorkerContract::contracted(workers_contracted),
            }),
            start,
        )
    }

    pub fn create_claim_policy(
        &mut self,
        start_room: &str,
        controller_id: &str,
        end_room: &str,
        start: bool,
    ) -> Policy {
        self.build(
            PolicyBody::Claim(ClaimPolicy {
                start_room: start_room.to_string(),
                controller_id: controller_id.to_string(),
                end_room: end_room.to_string(),
                contract: WorkerContract::default(),
            }),
            start,
        )
    }

    pub fn create_gift_workers_policy(
        &mut self,
        start_room: &str,
        end_room: &str,
        number_gifted: u32,
        start: bool,
    ) -> Policy {
        self.build(
            PolicyBody::GiftWorkers(GiftWorkersPolicy {
                start_room: start_room.to_string(),
                end_room: end_room.to_string(),
                workers_contracted_for: number_gifted,
                workers_assigned: 0,
                workers_delivered: 0,
            }),
            start,
        )
    }

    pub fn create_foreign_harvest_policy(
        &mut self,
        start_room: &str,
        end_room: &str,
        workers_contracted: u32,
        start: bool,
    ) -> Policy {
        self.build(
            PolicyBody::ForeignHarvest(ForeignHarvestPolicy {
                start_room: start_room.to_string(),
                end_room: end_room.to_string(),
                contract: WorkerContract::contracted(workers_contracted),
            }),
            start,
        )
    }

    pub fn create_rescue_policy(&mut self, room: &str, start: bool) -> Policy {
        self.build(PolicyBody::Rescue(room_policy(room)), start)
    }

    pub fn create_neutral_room_policy(&mut self, room: &str, start: bool) -> Policy {
        self.build(PolicyBody::NeutralRoom(room_policy(room)), start)
    }

    pub fn create_build_spawn_policy(&mut self, room: &str, start: bool) -> Policy {
        self.build(PolicyBody::BuildSpawn(room_policy(room)), start)
    }

    pub fn create_peace_policy(&mut self, room: &str, start: bool) -> Policy {
        self.build(PolicyBody::Peace(room_policy(room)), start)
    }

    pub fn create_defend_policy(&mut self, room: &str, start: bool) -> Policy {
        self.build(PolicyBody::Defend(room_policy(room)), start)
    }

    pub fn create_construction_policy(&mut self, room: &str, start: bool) -> Policy {
        self.build(PolicyBody::Construction(room_policy(room)), start)
    }

    /// The singleton pool, always id 0. Fails once a pool is registered.
    ///
    /// The id is claimed only when the pool is started and activated, so an
    /// unstarted pool record can still be activated later.
    pub fn create_the_pool(&mut self, start: bool) -> Result<Policy, SwarmError> {
        if self.scheduler.pool_reserved() {
            return Err(SwarmError::PoolAlreadyCreated);
        }
        let mut policy = Policy::new(POOL_POLICY_ID, PolicyBody::ThePool(PoolPolicy::default()));
        if start && self.start(&mut policy) && !self.scheduler.reserve_pool() {
            return Err(SwarmError::PoolAlreadyCreated);
        }
        Ok(policy)
    }

    fn build(&mut self, body: PolicyBody, start: bool) -> Policy {
        let id = self.scheduler.next_policy_id();
        let mut policy = Policy::new(id, body);
        if start {
            self.start(&mut policy);
        }
        policy
    }

    /// Initialise then activate. True if the scheduler accepted the record.
    fn start(&mut self, policy: &mut Policy) -> bool {
        self.scheduler
            .module_for(policy.policy_type())
            .initialise_policy(policy);
        let status = self.scheduler.activate_policy(policy);
        if status > 0 {
            debug!(policy = policy.id, kind = %policy.policy_type(), status, "policy started");
        } else {
            warn!(policy = policy.id, kind = %policy.policy_type(), status, "policy activation failed");
        }
        status > 0
    }
}

fn room_policy(room: &str) -> RoomPolicy {
    RoomPolicy {
        room: room.to_string(),
    }
}
