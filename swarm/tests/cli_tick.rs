//! CLI tests for `swarm init`, `swarm tick`, `swarm tasks` and `swarm policy`.
//!
//! Spawns the swarm binary in a temp directory and checks exit codes and the
//! persisted state it leaves behind.

use std::process::{Command, Output};

use swarm::exit_codes;
use swarm::io::init::SwarmPaths;
use swarm::io::policy_store::load_policies;
use swarm::io::world_store::{load_world, write_world};

fn swarm(dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_swarm"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run swarm")
}

#[test]
fn init_then_tick_advances_world() {
    let temp = tempfile::tempdir().expect("tempdir");

    let init = swarm(temp.path(), &["init"]);
    assert_eq!(init.status.code(), Some(exit_codes::OK));

    let tick = swarm(temp.path(), &["tick", "--count", "3"]);
    assert_eq!(tick.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&tick.stdout);
    assert!(stdout.contains("tick 3:"));
    assert!(stdout.contains("idler"));

    let world = load_world(&SwarmPaths::new(temp.path()).world_path).expect("world");
    assert_eq!(world.tick, 3);
    assert_eq!(world.creeps["idler"].saying.as_deref(), Some("What to do?"));
}

#[test]
fn tick_without_init_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tick = swarm(temp.path(), &["tick"]);
    assert_eq!(tick.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn tick_reports_idle_when_every_creep_ran_dry() {
    let temp = tempfile::tempdir().expect("tempdir");
    assert_eq!(swarm(temp.path(), &["init"]).status.code(), Some(exit_codes::OK));
    let paths = SwarmPaths::new(temp.path());
    let mut world = load_world(&paths.world_path).expect("world");
    world.creeps.retain(|name, _| name == "idler");
    write_world(&paths.world_path, &world).expect("write");

    let tick = swarm(temp.path(), &["tick"]);
    assert_eq!(tick.status.code(), Some(exit_codes::IDLE));
}

#[test]
fn tasks_prints_pending_list() {
    let temp = tempfile::tempdir().expect("tempdir");
    swarm(temp.path(), &["init"]);

    let out = swarm(temp.path(), &["tasks", "harvester-1"]);
    assert_eq!(out.status.code(), Some(exit_codes::OK));
    let list: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(list.as_array().map(Vec::len), Some(4));
    assert_eq!(list[0]["taskType"], "move_find");

    let missing = swarm(temp.path(), &["tasks", "nobody"]);
    assert_eq!(missing.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn policy_create_list_shutdown_retire() {
    let temp = tempfile::tempdir().expect("tempdir");
    swarm(temp.path(), &["init"]);

    let created = swarm(
        temp.path(),
        &["policy", "create", "--start", "foreign-harvest", "W1N1", "W1N2", "--workers", "2"],
    );
    assert_eq!(created.status.code(), Some(exit_codes::OK));
    let policy: serde_json::Value = serde_json::from_slice(&created.stdout).expect("json");
    assert_eq!(policy["type"], "foreign.harvest");
    assert_eq!(policy["workersContractedFor"], 2);
    let id = policy["id"].as_u64().expect("id").to_string();

    let list = swarm(temp.path(), &["policy", "list"]);
    assert!(String::from_utf8_lossy(&list.stdout).contains("foreign.harvest"));

    // Still contracted for workers: not complete yet.
    let retired = swarm(temp.path(), &["policy", "retire"]);
    assert!(String::from_utf8_lossy(&retired.stdout).trim().is_empty());

    let shutdown = swarm(temp.path(), &["policy", "shutdown", &id]);
    assert_eq!(shutdown.status.code(), Some(exit_codes::OK));
    let retired = swarm(temp.path(), &["policy", "retire"]);
    assert_eq!(String::from_utf8_lossy(&retired.stdout).trim(), id);

    let snapshot = load_policies(&SwarmPaths::new(temp.path()).policies_path).expect("policies");
    assert!(snapshot.policies.is_empty());

    let again = swarm(temp.path(), &["policy", "shutdown", &id]);
    assert_eq!(again.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn foreign_harvest_without_workers_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    swarm(temp.path(), &["init"]);

    let created = swarm(
        temp.path(),
        &["policy", "create", "--start", "foreign-harvest", "W1N1", "W1N2"],
    );
    assert_ne!(created.status.code(), Some(exit_codes::OK));
    let snapshot = load_policies(&SwarmPaths::new(temp.path()).policies_path).expect("policies");
    assert!(snapshot.policies.is_empty());
}

#[test]
fn unstarted_record_is_activated_from_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    swarm(temp.path(), &["init"]);

    let created = swarm(temp.path(), &["policy", "create", "the-pool"]);
    assert_eq!(created.status.code(), Some(exit_codes::OK));
    let record = temp.path().join("pool.json");
    std::fs::write(&record, &created.stdout).expect("write record");

    let activated = swarm(temp.path(), &["policy", "activate", "pool.json"]);
    assert_eq!(activated.status.code(), Some(exit_codes::OK));
    let list = swarm(temp.path(), &["policy", "list"]);
    assert!(String::from_utf8_lossy(&list.stdout).contains("the.pool"));

    let twice = swarm(temp.path(), &["policy", "activate", "pool.json"]);
    assert_eq!(twice.status.code(), Some(exit_codes::INVALID));
}
