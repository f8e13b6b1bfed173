use super::state::Player;

/// Non-owning reference to a player slot. A handle goes stale when its
/// player is removed, even if the slot is reused later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerHandle {
    index: u32,
    generation: u32,
}

impl PlayerHandle {
    pub fn index(self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    player: Option<Player>,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl PlayerArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player: Player) -> PlayerHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.player = Some(player);
            return PlayerHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            player: Some(player),
        });
        PlayerHandle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: PlayerHandle) -> Option<&Player> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.player.as_ref())
    }

    pub fn get_mut(&mut self, handle: PlayerHandle) -> Option<&mut Player> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.player.as_mut())
    }

    pub fn contains(&self, handle: PlayerHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn remove(&mut self, handle: PlayerHandle) -> Option<Player> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let player = slot.player.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(player)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerHandle, &Player)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.player.as_ref().map(|player| {
                (
                    PlayerHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    player,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerHandle, &mut Player)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.player.as_mut().map(|player| {
                (
                    PlayerHandle {
                        index: index as u32,
                        generation,
                    },
                    player,
                )
            })
        })
    }

    pub fn handles(&self) -> Vec<PlayerHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}
