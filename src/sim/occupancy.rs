//! Which actors stand in which sector.
//!
//! * One slot per sector, indexed by `SectorId`.
//! * Each slot keeps a `SmallVec`; sectors rarely hold more than a handful
//!   of actors, so this stays allocation-free in the common case.
//!
//! The index is **write-through** from the movement system: whenever an
//! actor's sector changes it is relinked from the old slot to the new one.

use hecs::Entity;
use smallvec::SmallVec;

use crate::world::SectorId;

type Slot = SmallVec<[Entity; 4]>;

#[derive(Debug, Default)]
pub struct SectorOccupancy {
    slots: Vec<Slot>,
}

impl SectorOccupancy {
    pub fn new(num_sectors: usize) -> Self {
        Self {
            slots: vec![Slot::new(); num_sectors],
        }
    }

    pub fn insert(&mut self, sector: SectorId, e: Entity) {
        let i = sector as usize;
        if i >= self.slots.len() {
            self.slots.resize(i + 1, Slot::new());
        }
        self.slots[i].push(e);
    }

    pub fn remove(&mut self, sector: SectorId, e: Entity) {
        if let Some(slot) = self.slots.get_mut(sector as usize) {
            if let Some(i) = slot.iter().position(|&o| o == e) {
                slot.swap_remove(i);
            }
        }
    }

    #[inline]
    pub fn relink(&mut self, from: SectorId, to: SectorId, e: Entity) {
        if from != to {
            self.remove(from, e);
            self.insert(to, e);
        }
    }

    pub fn occupants(&self, sector: SectorId) -> &[Entity] {
        self.slots
            .get(sector as usize)
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(Slot::clear);
    }
}
