//! Agent capability surface of the grid world.

use tracing::trace;

use crate::core::handler::Creep;
use crate::core::memory::TaskMemory;
use crate::sim::world::{CreepState, Environment, HARVEST_POWER, Position};

/// A creep borrowed for one tick together with the shared environment.
pub struct SimCreep<'a> {
    name: &'a str,
    state: &'a mut CreepState,
    env: &'a mut Environment,
}

impl<'a> SimCreep<'a> {
    pub fn new(name: &'a str, state: &'a mut CreepState, env: &'a mut Environment) -> Self {
        Self { name, state, env }
    }

    pub fn pos(&self) -> Position {
        self.state.pos
    }

    pub fn carry(&self) -> u32 {
        self.state.carry
    }

    pub fn is_full(&self) -> bool {
        self.state.free_capacity() == 0
    }

    pub fn env(&self) -> &Environment {
        &*self.env
    }

    /// Move one step toward `target`. Returns the new range to it.
    pub fn move_toward(&mut self, target: Position) -> u32 {
        self.state.pos = self.state.pos.step_toward(target);
        trace!(creep = self.name, x = self.state.pos.x, y = self.state.pos.y, "moved");
        self.state.pos.range_to(target)
    }

    /// Harvest from an adjacent source. Returns the amount gained, or `None`
    /// if the source does not exist or is out of reach.
    pub fn harvest(&mut self, source_id: &str) -> Option<u32> {
        let source = self.env.sources.get_mut(source_id)?;
        if self.state.pos.range_to(source.pos) > 1 {
            return None;
        }
        let amount = HARVEST_POWER
            .min(source.energy)
            .min(self.state.free_capacity());
        source.energy -= amount;
        self.state.carry += amount;
        Some(amount)
    }

    /// Transfer carried energy into an adjacent store. Returns the amount
    /// moved, or `None` if the store does not exist or is out of reach.
    pub fn transfer(&mut self, store_id: &str) -> Option<u32> {
        let store = self.env.stores.get_mut(store_id)?;
        if self.state.pos.range_to(store.pos) > 1 {
            return None;
        }
        let amount = self.state.carry.min(store.free_capacity());
        store.energy += amount;
        self.state.carry -= amount;
        Some(amount)
    }
}

impl Creep for SimCreep<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn memory(&self) -> &TaskMemory {
        &self.state.memory.tasks
    }

    fn memory_mut(&mut self) -> &mut TaskMemory {
        &mut self.state.memory.tasks
    }

    fn pickup_loose_resource(&mut self) -> bool {
        let pos = self.state.pos;
        let closest = self
            .env
            .dropped
            .iter()
            .enumerate()
            .min_by_key(|(_, drop)| pos.range_to(drop.pos))
            .map(|(index, drop)| (index, pos.range_to(drop.pos)));
        let Some((index, range)) = closest else {
            return false;
        };
        if range > 1 || self.state.free_capacity() == 0 {
            return false;
        }
        let drop = &mut self.env.dropped[index];
        let amount = drop.amount.min(self.state.free_capacity());
        drop.amount -= amount;
        self.state.carry += amount;
        if drop.amount == 0 {
            self.env.dropped.remove(index);
        }
        trace!(creep = self.name, amount, "picked up loose energy");
        true
    }

    fn say(&mut self, message: &str) {
        self.state.saying = Some(message.to_string());
    }
}
