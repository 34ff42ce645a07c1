//! Policy catalog: kinds and record shapes.
//!
//! A policy is a long-lived organizational contract (defend a room, build a
//! road, claim a controller, run a link network). Records are plain values;
//! the registry in [`PolicyLifecycle`](crate::core::lifecycle::PolicyLifecycle)
//! owns the live copies.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::pool::PoolPolicy;

pub type PolicyId = u64;

/// Fixed id of the singleton pool policy.
pub const POOL_POLICY_ID: PolicyId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PolicyType {
    #[serde(rename = "the.pool")]
    ThePool,
    #[serde(rename = "peace")]
    Peace,
    #[serde(rename = "construction")]
    Construction,
    #[serde(rename = "defence")]
    Defend,
    #[serde(rename = "rescue")]
    Rescue,
    #[serde(rename = "foreign.harvest")]
    ForeignHarvest,
    #[serde(rename = "neutral.road")]
    ForeignRoad,
    #[serde(rename = "neutral.room")]
    NeutralRoom,
    #[serde(rename = "claim")]
    Claim,
    #[serde(rename = "buildspawn")]
    BuildSpawn,
    #[serde(rename = "gift.workers")]
    GiftWorkers,
    #[serde(rename = "many2one.linkers")]
    Many2OneLinkers,
}

impl PolicyType {
    pub const ALL: [PolicyType; 12] = [
        PolicyType::ThePool,
        PolicyType::Peace,
        PolicyType::Construction,
        PolicyType::Defend,
        PolicyType::Rescue,
        PolicyType::ForeignHarvest,
        PolicyType::ForeignRoad,
        PolicyType::NeutralRoom,
        PolicyType::Claim,
        PolicyType::BuildSpawn,
        PolicyType::GiftWorkers,
        PolicyType::Many2OneLinkers,
    ];

    /// Position of this kind in [`PolicyType::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyType::ThePool => "the.pool",
            PolicyType::Peace => "peace",
            PolicyType::Construction => "construction",
            PolicyType::Defend => "defence",
            PolicyType::Rescue => "rescue",
            PolicyType::ForeignHarvest => "foreign.harvest",
            PolicyType::ForeignRoad => "neutral.road",
            PolicyType::NeutralRoom => "neutral.room",
            PolicyType::Claim => "claim",
            PolicyType::BuildSpawn => "buildspawn",
            PolicyType::GiftWorkers => "gift.workers",
            PolicyType::Many2OneLinkers => "many2one.linkers",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Worker contract shared by cross-room policies.
///
/// `workers_assigned <= workers_contracted_for` is maintained by the
/// assignment logic, not here. `shutting_down` is a cooperative cancellation
/// signal: consumers observe it and wind down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerContract {
    pub workers_contracted_for: u32,
    pub workers_assigned: u32,
    pub shutting_down: bool,
}

impl WorkerContract {
    pub fn contracted(workers: u32) -> Self {
        Self {
            workers_contracted_for: workers,
            ..Self::default()
        }
    }
}

/// Policy scoped to a single room with no further state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPolicy {
    pub room: String,
}

/// Road building in a neutral room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadPolicy {
    pub start_room: String,
    pub work_room: String,
    pub source_room: String,
    pub end_room: String,
    #[serde(flatten)]
    pub contract: WorkerContract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPolicy {
    pub start_room: String,
    pub controller_id: String,
    pub end_room: String,
    #[serde(flatten)]
    pub contract: WorkerContract,
}

/// Harvesting in a room other than the one the workers come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignHarvestPolicy {
    pub start_room: String,
    pub end_room: String,
    #[serde(flatten)]
    pub contract: WorkerContract,
}

/// Hands workers over to another room. Finishes by delivery rather than by a
/// shutdown flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftWorkersPolicy {
    pub start_room: String,
    pub end_room: String,
    pub workers_contracted_for: u32,
    pub workers_assigned: u32,
    pub workers_delivered: u32,
}

/// A link next to a supply object (source or mineral).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLink {
    pub supply_id: String,
    pub resource_kind: String,
    /// Where the transporter stands; must touch both supply and link.
    pub x: i32,
    pub y: i32,
    pub link_id: String,
}

/// The link every source link sends to, next to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationLink {
    pub link_id: String,
    pub x: i32,
    pub y: i32,
    pub storage_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mine_resource_kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkersPolicy {
    pub room: String,
    pub from_links: Vec<SourceLink>,
    pub to_link: DestinationLink,
    /// Dedicated transporters; unset until the module initialises the policy.
    #[serde(default)]
    pub link_creeps: Option<BTreeSet<String>>,
}

/// Kind-specific part of a policy record, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PolicyBody {
    #[serde(rename = "the.pool")]
    ThePool(PoolPolicy),
    #[serde(rename = "peace")]
    Peace(RoomPolicy),
    #[serde(rename = "construction")]
    Construction(RoomPolicy),
    #[serde(rename = "defence")]
    Defend(RoomPolicy),
    #[serde(rename = "rescue")]
    Rescue(RoomPolicy),
    #[serde(rename = "foreign.harvest")]
    ForeignHarvest(ForeignHarvestPolicy),
    #[serde(rename = "neutral.road")]
    ForeignRoad(RoadPolicy),
    #[serde(rename = "neutral.room")]
    NeutralRoom(RoomPolicy),
    #[serde(rename = "claim")]
    Claim(ClaimPolicy),
    #[serde(rename = "buildspawn")]
    BuildSpawn(RoomPolicy),
    #[serde(rename = "gift.workers")]
    GiftWorkers(GiftWorkersPolicy),
    #[serde(rename = "many2one.linkers")]
    Many2OneLinkers(LinkersPolicy),
}

impl PolicyBody {
    pub fn policy_type(&self) -> PolicyType {
        match self {
            PolicyBody::ThePool(_) => PolicyType::ThePool,
            PolicyBody::Peace(_) => PolicyType::Peace,
            PolicyBody::Construction(_) => PolicyType::Construction,
            PolicyBody::Defend(_) => PolicyType::Defend,
            PolicyBody::Rescue(_) => PolicyType::Rescue,
            PolicyBody::ForeignHarvest(_) => PolicyType::ForeignHarvest,
            PolicyBody::ForeignRoad(_) => PolicyType::ForeignRoad,
            PolicyBody::NeutralRoom(_) => PolicyType::NeutralRoom,
            PolicyBody::Claim(_) => PolicyType::Claim,
            PolicyBody::BuildSpawn(_) => PolicyType::BuildSpawn,
            PolicyBody::GiftWorkers(_) => PolicyType::GiftWorkers,
            PolicyBody::Many2OneLinkers(_) => PolicyType::Many2OneLinkers,
        }
    }
}

/// A policy record: id plus kind-specific body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    #[serde(flatten)]
    pub body: PolicyBody,
}

impl Policy {
    pub fn new(id: PolicyId, body: PolicyBody) -> Self {
        Self { id, body }
    }

    pub fn policy_type(&self) -> PolicyType {
        self.body.policy_type()
    }

    /// Worker contract, for kinds that carry a shutdown flag.
    pub fn contract(&self) -> Option<&WorkerContract> {
        match &self.body {
            PolicyBody::ForeignRoad(p) => Some(&p.contract),
            PolicyBody::Claim(p) => Some(&p.contract),
            PolicyBody::ForeignHarvest(p) => Some(&p.contract),
            _ => None,
        }
    }

    pub fn contract_mut(&mut self) -> Option<&mut WorkerContract> {
        match &mut self.body {
            PolicyBody::ForeignRoad(p) => Some(&mut p.contract),
            PolicyBody::Claim(p) => Some(&mut p.contract),
            PolicyBody::ForeignHarvest(p) => Some(&mut p.contract),
            _ => None,
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.contract().is_some_and(|c| c.shutting_down)
    }

    /// Room the policy is anchored to, for listings.
    pub fn home_room(&self) -> Option<&str> {
        match &self.body {
            PolicyBody::ThePool(_) => None,
            PolicyBody::Peace(p)
            | PolicyBody::Construction(p)
            | PolicyBody::Defend(p)
            | PolicyBody::Rescue(p)
            | PolicyBody::NeutralRoom(p)
            | PolicyBody::BuildSpawn(p) => Some(&p.room),
            PolicyBody::ForeignHarvest(p) => Some(&p.start_room),
            PolicyBody::ForeignRoad(p) => Some(&p.start_room),
            PolicyBody::Claim(p) => Some(&p.start_room),
            PolicyBody::GiftWorkers(p) => Some(&p.start_room),
            PolicyBody::Many2OneLinkers(p) => Some(&p.room),
        }
    }
}
