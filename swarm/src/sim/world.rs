//! Single-room grid world used to drive the executor end to end.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::memory::TaskMemory;
use crate::core::task::Task;

/// Energy a creep harvests from an adjacent source per tick.
pub const HARVEST_POWER: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance, the range metric of the grid.
    pub fn range_to(self, other: Position) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    /// One step (including diagonals) toward `target`.
    pub fn step_toward(self, target: Position) -> Position {
        Position {
            x: self.x + (target.x - self.x).signum(),
            y: self.y + (target.y - self.y).signum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub pos: Position,
    pub energy: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub pos: Position,
    pub energy: u32,
    pub capacity: u32,
}

impl Store {
    pub fn free_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.energy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedResource {
    pub id: String,
    pub pos: Position,
    pub amount: u32,
}

/// Persisted memory of one creep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreepMemory {
    #[serde(default)]
    pub tasks: TaskMemory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreepState {
    pub pos: Position,
    #[serde(default)]
    pub carry: u32,
    pub capacity: u32,
    /// Message shown this tick; cleared at the start of every tick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saying: Option<String>,
    #[serde(default)]
    pub memory: CreepMemory,
}

impl CreepState {
    pub fn new(pos: Position, capacity: u32, tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            pos,
            carry: 0,
            capacity,
            saying: None,
            memory: CreepMemory {
                tasks: TaskMemory::new(tasks),
            },
        }
    }

    pub fn free_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.carry)
    }
}

/// Everything in the room except the creeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub room: String,
    #[serde(default)]
    pub sources: BTreeMap<String, Source>,
    #[serde(default)]
    pub stores: BTreeMap<String, Store>,
    #[serde(default)]
    pub dropped: Vec<DroppedResource>,
}

impl Environment {
    /// Position of any object by id.
    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.sources
            .get(id)
            .map(|s| s.pos)
            .or_else(|| self.stores.get(id).map(|s| s.pos))
            .or_else(|| self.dropped.iter().find(|d| d.id == id).map(|d| d.pos))
    }

    /// Closest id (ties broken by id order) among `candidates`.
    pub fn closest<'a>(
        from: Position,
        candidates: impl Iterator<Item = (&'a String, Position)>,
    ) -> Option<String> {
        candidates
            .min_by_key(|(id, pos)| (from.range_to(*pos), (*id).clone()))
            .map(|(id, _)| id.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub tick: u64,
    pub env: Environment,
    #[serde(default)]
    pub creeps: BTreeMap<String, CreepState>,
}

impl World {
    /// Demo room: one source, one storage, two creeps running a harvest loop.
    pub fn demo() -> Self {
        use crate::core::task::FindTarget;

        let mut env = Environment {
            room: "W1N1".to_string(),
            ..Environment::default()
        };
        env.sources.insert(
            "source-1".to_string(),
            Source {
                pos: Position::new(10, 10),
                energy: 3000,
            },
        );
        env.stores.insert(
            "storage-1".to_string(),
            Store {
                pos: Position::new(20, 14),
                energy: 0,
                capacity: 1_000_000,
            },
        );
        env.dropped.push(DroppedResource {
            id: "drop-1".to_string(),
            pos: Position::new(15, 12),
            amount: 25,
        });

        let harvest_loop = || {
            vec![
                Task::move_find(FindTarget::Source, 1).looping(),
                Task::harvest(None).looping(),
                Task::move_find(FindTarget::Store, 1).looping().with_pickup(),
                Task::offload(None).looping(),
            ]
        };

        let mut creeps = BTreeMap::new();
        creeps.insert(
            "harvester-1".to_string(),
            CreepState::new(Position::new(14, 12), 50, harvest_loop()),
        );
        creeps.insert(
            "harvester-2".to_string(),
            CreepState::new(Position::new(25, 25), 50, harvest_loop()),
        );
        creeps.insert(
            "idler".to_string(),
            CreepState::new(Position::new(2, 2), 50, []),
        );

        Self {
            tick: 0,
            env,
            creeps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_chebyshev() {
        assert_eq!(Position::new(0, 0).range_to(Position::new(3, -5)), 5);
    }

    #[test]
    fn step_moves_diagonally() {
        let next = Position::new(0, 0).step_toward(Position::new(3, -5));
        assert_eq!(next, Position::new(1, -1));
    }

    #[test]
    fn closest_breaks_ties_by_id() {
        let a = "b".to_string();
        let b = "a".to_string();
        let found = Environment::closest(
            Position::new(0, 0),
            [(&a, Position::new(1, 0)), (&b, Position::new(0, 1))].into_iter(),
        );
        assert_eq!(found.as_deref(), Some("a"));
    }
}
