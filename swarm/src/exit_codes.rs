//! Stable exit codes for swarm CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config/state, an unknown creep or policy,
/// or other errors.
pub const INVALID: i32 = 1;
/// `swarm tick` finished with every creep idle.
pub const IDLE: i32 = 2;
