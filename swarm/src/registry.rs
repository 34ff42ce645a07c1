//! Policy registry commands: `swarm policy create|activate|list|shutdown|retire`.
//!
//! Each command restores the lifecycle from `.swarm/policies.json`, applies
//! one change and writes the snapshot back.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::core::factory::PolicyFactory;
use crate::core::lifecycle::{PolicyLifecycle, PolicyScheduler};
use crate::core::modules::PolicyModules;
use crate::core::policy::{DestinationLink, Policy, PolicyId, SourceLink};
use crate::io::config::{SwarmConfig, load_config};
use crate::io::init::SwarmPaths;
use crate::io::policy_store::{load_policies, write_policies};

/// A policy to create, with the parameters of its kind.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum PolicyRequest {
    /// The singleton pool (id 0).
    ThePool,
    Peace { room: String },
    Construction { room: String },
    Defend { room: String },
    Rescue { room: String },
    NeutralRoom { room: String },
    BuildSpawn { room: String },
    ForeignHarvest {
        start_room: String,
        end_room: String,
        /// Workers to contract for.
        #[arg(long)]
        workers: u32,
    },
    /// Road building through a neutral room.
    NeutralBuilder {
        start_room: String,
        work_room: String,
        source_room: String,
        end_room: String,
        /// Workers to contract for.
        #[arg(long)]
        workers: u32,
    },
    Claim {
        start_room: String,
        controller_id: String,
        end_room: String,
    },
    GiftWorkers {
        start_room: String,
        end_room: String,
        count: u32,
    },
    /// Links are given as JSON (`{"supplyId": .., "resourceKind": .., "x": .., "y": .., "linkId": ..}`).
    Many2oneLinkers {
        room: String,
        #[arg(long = "to")]
        to_link: String,
        #[arg(long = "from")]
        from_links: Vec<String>,
    },
}

impl PolicyRequest {
    /// Build the record through `factory`.
    pub fn create<S: PolicyScheduler>(
        &self,
        factory: &mut PolicyFactory<'_, S>,
        start: bool,
    ) -> Result<Policy> {
        let policy = match self {
            PolicyRequest::ThePool => factory.create_the_pool(start)?,
            PolicyRequest::Peace { room } => factory.create_peace_policy(room, start),
            PolicyRequest::Construction { room } => factory.create_construction_policy(room, start),
            PolicyRequest::Defend { room } => factory.create_defend_policy(room, start),
            PolicyRequest::Rescue { room } => factory.create_rescue_policy(room, start),
            PolicyRequest::NeutralRoom { room } => factory.create_neutral_room_policy(room, start),
            PolicyRequest::BuildSpawn { room } => factory.create_build_spawn_policy(room, start),
            PolicyRequest::ForeignHarvest {
                start_room,
                end_room,
                workers,
            } => factory.create_foreign_harvest_policy(start_room, end_room, *workers, start),
            PolicyRequest::NeutralBuilder {
                start_room,
                work_room,
                source_room,
                end_room,
                workers,
            } => factory.create_neutral_builder_policy(
                start_room,
                work_room,
                source_room,
                end_room,
                *workers,
                start,
            ),
            PolicyRequest::Claim {
                start_room,
                controller_id,
                end_room,
            } => factory.create_claim_policy(start_room, controller_id, end_room, start),
            PolicyRequest::GiftWorkers {
                start_room,
                end_room,
                count,
            } => factory.create_gift_workers_policy(start_room, end_room, *count, start),
            PolicyRequest::Many2oneLinkers {
                room,
                to_link,
                from_links,
            } => {
                let to_link: DestinationLink =
                    serde_json::from_str(to_link).context("parse destination link json")?;
                let from_links = from_links
                    .iter()
                    .map(|raw| serde_json::from_str::<SourceLink>(raw))
                    .collect::<Result<Vec<_>, _>>()
                    .context("parse source link json")?;
                factory.create_many2one_linkers_policy(room, from_links, to_link, start)
            }
        };
        Ok(policy)
    }
}

/// Restore the lifecycle persisted under `paths`.
pub fn open_lifecycle(paths: &SwarmPaths, config: &SwarmConfig) -> Result<PolicyLifecycle> {
    let snapshot = load_policies(&paths.policies_path)
        .with_context(|| format!("load {}", paths.policies_path.display()))?;
    Ok(PolicyLifecycle::restore(
        snapshot,
        PolicyModules::standard(),
        config.max_active_policies,
    ))
}

pub fn save_lifecycle(paths: &SwarmPaths, lifecycle: &PolicyLifecycle) -> Result<()> {
    write_policies(&paths.policies_path, &lifecycle.snapshot())
}

fn with_lifecycle<T>(root: &Path, f: impl FnOnce(&mut PolicyLifecycle) -> Result<T>) -> Result<T> {
    let paths = SwarmPaths::new(root);
    let config = load_config(&paths.config_path)
        .with_context(|| format!("load {}", paths.config_path.display()))?;
    let mut lifecycle = open_lifecycle(&paths, &config)?;
    let value = f(&mut lifecycle)?;
    save_lifecycle(&paths, &lifecycle)?;
    Ok(value)
}

/// Create a policy and persist the registry (and the id counter, even when
/// the record is not started).
pub fn create_policy(root: &Path, request: &PolicyRequest, start: bool) -> Result<Policy> {
    with_lifecycle(root, |lifecycle| {
        request.create(&mut PolicyFactory::new(lifecycle), start)
    })
}

/// Start a record printed by `policy create` without `--start`.
pub fn activate_policy(root: &Path, record: &Path) -> Result<Policy> {
    let raw = fs::read_to_string(record).with_context(|| format!("read {}", record.display()))?;
    let policy: Policy = serde_json::from_str(&raw)
        .with_context(|| format!("parse policy record {}", record.display()))?;
    with_lifecycle(root, |lifecycle| Ok(lifecycle.activate_record(policy)?))
}

/// Active policies in id order.
pub fn list_policies(root: &Path) -> Result<Vec<Policy>> {
    let paths = SwarmPaths::new(root);
    let config = load_config(&paths.config_path)
        .with_context(|| format!("load {}", paths.config_path.display()))?;
    let lifecycle = open_lifecycle(&paths, &config)?;
    Ok(lifecycle.policies().cloned().collect())
}

pub fn shutdown_policy(root: &Path, id: PolicyId) -> Result<()> {
    with_lifecycle(root, |lifecycle| Ok(lifecycle.request_shutdown(id)?))
}

/// Retire `id`, or every completed policy when `id` is `None`.
pub fn retire_policies(root: &Path, id: Option<PolicyId>) -> Result<Vec<PolicyId>> {
    with_lifecycle(root, |lifecycle| match id {
        Some(id) => Ok(lifecycle.retire_policy(id).map(|p| p.id).into_iter().collect()),
        None => Ok(lifecycle.retire_completed()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::{PolicyBody, PolicyType};
    use crate::io::init::{InitOptions, init_swarm};

    fn init() -> tempfile::TempDir {
        let temp = tempfile::tempdir().expect("tempdir");
        init_swarm(temp.path(), &InitOptions { force: false }).expect("init");
        temp
    }

    #[test]
    fn created_policies_persist_with_fresh_ids() {
        let temp = init();
        let request = PolicyRequest::Peace {
            room: "W1N1".to_string(),
        };

        let first = create_policy(temp.path(), &request, true).expect("create");
        let unstarted = create_policy(temp.path(), &request, false).expect("create");
        let second = create_policy(temp.path(), &request, true).expect("create");

        assert!(first.id < unstarted.id && unstarted.id < second.id);
        let ids: Vec<PolicyId> = list_policies(temp.path())
            .expect("list")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn pool_twice_is_an_error() {
        let temp = init();
        let pool = create_policy(temp.path(), &PolicyRequest::ThePool, true).expect("pool");
        assert_eq!(pool.id, 0);

        let err = create_policy(temp.path(), &PolicyRequest::ThePool, true).unwrap_err();
        assert!(err.to_string().contains("already been created"));
    }

    #[test]
    fn unstarted_pool_can_be_activated_later() {
        let temp = init();
        let inert = create_policy(temp.path(), &PolicyRequest::ThePool, false).expect("inert");
        assert!(list_policies(temp.path()).expect("list").is_empty());

        let record = temp.path().join("pool.json");
        fs::write(&record, serde_json::to_string(&inert).expect("serialize")).expect("write");
        let pool = activate_policy(temp.path(), &record).expect("activate");

        assert_eq!(pool.id, 0);
        let ids: Vec<PolicyId> = list_policies(temp.path())
            .expect("list")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![0]);
        let err = create_policy(temp.path(), &PolicyRequest::ThePool, true).unwrap_err();
        assert!(err.to_string().contains("already been created"));
    }

    #[test]
    fn unstarted_pool_does_not_block_a_started_one() {
        let temp = init();
        create_policy(temp.path(), &PolicyRequest::ThePool, false).expect("inert");

        let pool = create_policy(temp.path(), &PolicyRequest::ThePool, true).expect("pool");

        assert_eq!(pool.id, 0);
        assert_eq!(list_policies(temp.path()).expect("list").len(), 1);
    }

    #[test]
    fn activated_claim_is_initialised() {
        let temp = init();
        let request = PolicyRequest::Claim {
            start_room: "W1N1".to_string(),
            controller_id: "ctrl".to_string(),
            end_room: "W2N1".to_string(),
        };
        let inert = create_policy(temp.path(), &request, false).expect("inert");
        let record = temp.path().join("claim.json");
        fs::write(&record, serde_json::to_string_pretty(&inert).expect("serialize")).expect("write");

        let claim = activate_policy(temp.path(), &record).expect("activate");

        assert_eq!(claim.id, inert.id);
        assert_eq!(claim.contract().map(|c| c.workers_contracted_for), Some(1));
        assert_eq!(list_policies(temp.path()).expect("list"), vec![claim]);
    }

    #[test]
    fn shutdown_then_retire_completed_claim() {
        let temp = init();
        let claim = create_policy(
            temp.path(),
            &PolicyRequest::Claim {
                start_room: "W1N1".to_string(),
                controller_id: "ctrl".to_string(),
                end_room: "W2N1".to_string(),
            },
            true,
        )
        .expect("claim");
        assert_eq!(
            claim.contract().map(|c| c.workers_contracted_for),
            Some(1)
        );

        assert!(retire_policies(temp.path(), None).expect("retire").is_empty());
        shutdown_policy(temp.path(), claim.id).expect("shutdown");
        assert_eq!(retire_policies(temp.path(), None).expect("retire"), vec![claim.id]);
        assert!(list_policies(temp.path()).expect("list").is_empty());
    }

    #[test]
    fn linkers_parse_link_json() {
        let temp = init();
        let request = PolicyRequest::Many2oneLinkers {
            room: "W26S21".to_string(),
            to_link: r#"{"linkId":"l0","x":42,"y":28,"storageId":"st"}"#.to_string(),
            from_links: vec![
                r#"{"supplyId":"s","resourceKind":"energy","x":13,"y":16,"linkId":"l1"}"#
                    .to_string(),
            ],
        };

        let policy = create_policy(temp.path(), &request, true).expect("linkers");

        assert_eq!(policy.policy_type(), PolicyType::Many2OneLinkers);
        let PolicyBody::Many2OneLinkers(linkers) = &policy.body else {
            panic!("expected linkers policy");
        };
        assert_eq!(linkers.from_links.len(), 1);
        assert_eq!(linkers.to_link.storage_id, "st");
    }

    #[test]
    fn bad_link_json_is_reported() {
        let temp = init();
        let request = PolicyRequest::Many2oneLinkers {
            room: "W1N1".to_string(),
            to_link: "not json".to_string(),
            from_links: Vec::new(),
        };
        let err = create_policy(temp.path(), &request, true).unwrap_err();
        assert!(err.to_string().contains("destination link"));
    }
}
