//! Agent swarm command line.
//!
//! Keeps a reference world (`.swarm/world.json`) and a policy registry
//! (`.swarm/policies.json`) on disk and advances them tick by tick.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;

use swarm::core::policy::PolicyId;
use swarm::exit_codes;
use swarm::io::init::{InitOptions, SwarmPaths, init_swarm};
use swarm::io::world_store::load_world;
use swarm::registry::{
    PolicyRequest, activate_policy, create_policy, list_policies, retire_policies, shutdown_policy,
};
use swarm::tick::run_ticks;

#[derive(Parser)]
#[command(
    name = "swarm",
    version,
    about = "Tick-based agent task interpreter and policy registry"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.swarm/` with default config, the demo world and an empty registry.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Advance the world; exits with the idle code if every creep ran dry.
    Tick {
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Print a creep's pending task list as JSON.
    Tasks { creep: String },
    /// Manage policies.
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },
}

#[derive(Subcommand)]
enum PolicyCommand {
    /// Create a policy record; with `--start` it is initialised and activated.
    Create {
        #[arg(long)]
        start: bool,
        #[command(subcommand)]
        request: PolicyRequest,
    },
    /// Start a record saved from `policy create` without `--start`.
    Activate { record: PathBuf },
    /// List active policies.
    List,
    /// Ask a policy to wind down.
    Shutdown { id: PolicyId },
    /// Retire one policy, or every completed one.
    Retire { id: Option<PolicyId> },
}

fn main() {
    swarm::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("resolve current directory")?;
    match cli.command {
        Command::Init { force } => {
            init_swarm(&root, &InitOptions { force })?;
            Ok(exit_codes::OK)
        }
        Command::Tick { count } => cmd_tick(&root, count),
        Command::Tasks { creep } => cmd_tasks(&root, &creep),
        Command::Policy { command } => cmd_policy(&root, command),
    }
}

fn cmd_tick(root: &Path, count: u32) -> Result<i32> {
    let summaries = run_ticks(root, count)?;
    let Some(last) = summaries.last() else {
        return Ok(exit_codes::OK);
    };
    for summary in &summaries {
        let idle: Vec<&str> = summary.idle_creeps().collect();
        println!(
            "tick {}: {} creeps, idle [{}], retired {:?}",
            summary.tick,
            summary.creeps.len(),
            idle.join(", "),
            summary.retired
        );
    }
    if last.all_idle() {
        return Ok(exit_codes::IDLE);
    }
    Ok(exit_codes::OK)
}

fn cmd_tasks(root: &Path, creep: &str) -> Result<i32> {
    let paths = SwarmPaths::new(root);
    let world = load_world(&paths.world_path)?;
    let state = world
        .creeps
        .get(creep)
        .ok_or_else(|| anyhow!("unknown creep '{creep}'"))?;
    print_json(&state.memory.tasks.tasklist)?;
    Ok(exit_codes::OK)
}

fn cmd_policy(root: &Path, command: PolicyCommand) -> Result<i32> {
    match command {
        PolicyCommand::Create { start, request } => {
            let policy = create_policy(root, &request, start)?;
            print_json(&policy)?;
        }
        PolicyCommand::Activate { record } => {
            let policy = activate_policy(root, &record)?;
            print_json(&policy)?;
        }
        PolicyCommand::List => {
            for policy in list_policies(root)? {
                let flag = if policy.is_shutting_down() { " (shutting down)" } else { "" };
                println!(
                    "{}\t{}\t{}{}",
                    policy.id,
                    policy.policy_type(),
                    policy.home_room().unwrap_or("-"),
                    flag
                );
            }
        }
        PolicyCommand::Shutdown { id } => shutdown_policy(root, id)?,
        PolicyCommand::Retire { id } => {
            for retired in retire_policies(root, id)? {
                println!("{retired}");
            }
        }
    }
    Ok(exit_codes::OK)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
