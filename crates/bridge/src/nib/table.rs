use std::collections::BTreeMap;

use crate::dis::EntityId;
use crate::player::PlayerHandle;

use super::Nib;

/// NIBs of one direction, keyed by entity id.
#[derive(Debug, Clone, Default)]
pub struct NibTable {
    nibs: BTreeMap<EntityId, Nib>,
}

impl NibTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `nib` unless its id is taken; returns whether it was added.
    pub fn insert(&mut self, nib: Nib) -> bool {
        let id = nib.entity_id();
        if self.nibs.contains_key(&id) {
            log::warn!("nib {id} already registered");
            return false;
        }
        log::debug!("added {:?} nib {id}", nib.direction());
        self.nibs.insert(id, nib);
        true
    }

    pub fn get(&self, id: &EntityId) -> Option<&Nib> {
        self.nibs.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Nib> {
        self.nibs.get_mut(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.nibs.contains_key(id)
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<Nib> {
        let nib = self.nibs.remove(id)?;
        log::debug!("removed {:?} nib {id}", nib.direction());
        Some(nib)
    }

    pub fn find_by_player(&self, player: PlayerHandle) -> Option<&Nib> {
        self.nibs.values().find(|nib| nib.player() == Some(player))
    }

    pub fn find_by_player_mut(&mut self, player: PlayerHandle) -> Option<&mut Nib> {
        self.nibs.values_mut().find(|nib| nib.player() == Some(player))
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.nibs.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Nib> {
        self.nibs.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Nib> {
        self.nibs.values_mut()
    }

    pub fn len(&self) -> usize {
        self.nibs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nibs.is_empty()
    }

    /// Removes and returns every NIB matching `predicate`.
    pub fn drain_where(&mut self, mut predicate: impl FnMut(&Nib) -> bool) -> Vec<Nib> {
        let ids: Vec<EntityId> = self
            .nibs
            .values()
            .filter(|nib| predicate(nib))
            .map(Nib::entity_id)
            .collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_nib_per_id() {
        let mut table = NibTable::new();
        let id = EntityId::new(1, 1, 1);
        assert!(table.insert(Nib::new_input(id, "fed", 0.0)));
        assert!(!table.insert(Nib::new_input(id, "fed", 0.0)));
        assert_eq!(table.len(), 1);
        assert!(table.remove(&id).is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn test_drain_where() {
        let mut table = NibTable::new();
        for entity in 1..=4 {
            table.insert(Nib::new_input(EntityId::new(1, 1, entity), "fed", 0.0));
        }
        let drained = table.drain_where(|nib| nib.entity_id().entity % 2 == 0);
        assert_eq!(drained.len(), 2);
        assert_eq!(table.ids(), vec![EntityId::new(1, 1, 1), EntityId::new(1, 1, 3)]);
    }
}
