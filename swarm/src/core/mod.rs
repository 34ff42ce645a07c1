//! Deterministic, pure logic for agent tasks and policies.
//!
//! Core modules must be free of I/O side effects. Everything the world does
//! (movement, harvesting, persistence) reaches the core through the
//! [`handler::Creep`] and [`handler::TaskHandler`] traits or the
//! [`lifecycle::PolicyScheduler`] trait.

pub mod executor;
pub mod factory;
pub mod handler;
pub mod lifecycle;
pub mod memory;
pub mod modules;
pub mod policy;
pub mod pool;
pub mod task;
