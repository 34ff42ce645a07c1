//! The pool: singleton policy holding requisitions and supply centres.
//!
//! Both maps are keyed by sub-ids handed out from the pool's own monotonic
//! counters. They are only mutated through [`PoolPolicy`] methods.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::policy::PolicyId;

/// Sub-id allocated by the pool.
///
/// Serialized as a string so it can key a JSON object; accepts integers on
/// input too. Pool records are nested under a flattened, tagged policy body,
/// where integer map keys would not survive buffering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubId(pub u64);

impl fmt::Display for SubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SubId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SubId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SubIdVisitor;

        impl Visitor<'_> for SubIdVisitor {
            type Value = SubId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or its decimal string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<SubId, E> {
                Ok(SubId(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<SubId, E> {
                u64::try_from(value)
                    .map(SubId)
                    .map_err(|_| E::custom(format!("negative sub-id {value}")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<SubId, E> {
                value
                    .parse()
                    .map(SubId)
                    .map_err(|_| E::custom(format!("invalid sub-id '{value}'")))
            }
        }

        deserializer.deserialize_any(SubIdVisitor)
    }
}

/// A request from a policy for workers to be produced somewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requisition {
    pub requester: PolicyId,
    pub room: String,
    pub workers: u32,
}

/// A room able to satisfy requisitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyCentre {
    pub room: String,
    pub energy_capacity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolPolicy {
    #[serde(default)]
    pub requisitions: BTreeMap<SubId, Requisition>,
    #[serde(default)]
    pub supply_centres: BTreeMap<SubId, SupplyCentre>,
    #[serde(default)]
    pub next_requisitions_id: u64,
    #[serde(default)]
    pub next_supply_centre_id: u64,
}

impl PoolPolicy {
    pub fn add_requisition(&mut self, requisition: Requisition) -> SubId {
        let id = SubId(self.next_requisitions_id);
        self.next_requisitions_id += 1;
        self.requisitions.insert(id, requisition);
        id
    }

    pub fn remove_requisition(&mut self, id: SubId) -> Option<Requisition> {
        self.requisitions.remove(&id)
    }

    pub fn add_supply_centre(&mut self, centre: SupplyCentre) -> SubId {
        let id = SubId(self.next_supply_centre_id);
        self.next_supply_centre_id += 1;
        self.supply_centres.insert(id, centre);
        id
    }

    pub fn remove_supply_centre(&mut self, id: SubId) -> Option<SupplyCentre> {
        self.supply_centres.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requisition(requester: PolicyId) -> Requisition {
        Requisition {
            requester,
            room: "W1N1".to_string(),
            workers: 2,
        }
    }

    #[test]
    fn sub_ids_never_reuse_after_removal() {
        let mut pool = PoolPolicy::default();
        let first = pool.add_requisition(requisition(3));
        assert!(pool.remove_requisition(first).is_some());
        let second = pool.add_requisition(requisition(3));
        assert_eq!(first, SubId(0));
        assert_eq!(second, SubId(1));
        assert_eq!(pool.next_requisitions_id, 2);
    }

    #[test]
    fn requisition_and_supply_counters_are_independent() {
        let mut pool = PoolPolicy::default();
        pool.add_requisition(requisition(1));
        let centre = pool.add_supply_centre(SupplyCentre {
            room: "W2N2".to_string(),
            energy_capacity: 800,
        });
        assert_eq!(centre, SubId(0));
        assert_eq!(pool.next_requisitions_id, 1);
        assert_eq!(pool.next_supply_centre_id, 1);
    }

    #[test]
    fn sub_id_accepts_string_and_integer() {
        let from_str: SubId = serde_json::from_str("\"12\"").expect("string");
        let from_int: SubId = serde_json::from_str("12").expect("integer");
        assert_eq!(from_str, from_int);
        assert_eq!(serde_json::to_string(&from_int).expect("serialize"), "\"12\"");
    }
}
