//! Tick-based task interpreter and policy registry for an agent swarm.
//!
//! Every tick each agent ("creep") works through a persisted list of pending
//! tasks, bounded by an action budget and guarded against doing two
//! conflicting things in one tick. Longer-lived policies decide which agents
//! exist at all. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (task execution, policy records,
//!   lifecycle). No I/O; the world is reached only through traits.
//! - **[`io`]**: Side-effecting operations (config and state snapshots).
//! - **[`sim`]**: A small grid world implementing the agent capabilities, so
//!   the core can be driven end to end.
//!
//! Orchestration modules ([`tick`], [`registry`]) coordinate core logic with
//! I/O to implement CLI commands.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod registry;
pub mod sim;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tick;
