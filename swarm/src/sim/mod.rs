//! Reference grid world: the agent capability surface and one handler per
//! task kind.

pub mod creep;
pub mod handlers;
pub mod world;
