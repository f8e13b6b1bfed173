use std::time::{SystemTime, UNIX_EPOCH};

use crate::dis::EntityId;
use crate::geo::GamingArea;

use super::arena::{PlayerArena, PlayerHandle};
use super::state::{Player, PlayerMode};

/// Clocks, gaming area and player arena shared by the NetIOs.
#[derive(Debug, Clone)]
pub struct Simulation {
    exec_time: f64,
    utc_time: f64,
    frozen: bool,
    gaming_area: GamingArea,
    pub players: PlayerArena,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(GamingArea::default())
    }
}

impl Simulation {
    pub fn new(gaming_area: GamingArea) -> Self {
        Self {
            exec_time: 0.0,
            utc_time: current_utc_seconds(),
            frozen: false,
            gaming_area,
            players: PlayerArena::new(),
        }
    }

    /// Seconds since the simulation started running.
    pub fn exec_time(&self) -> f64 {
        self.exec_time
    }

    /// Seconds since the Unix epoch.
    pub fn utc_time(&self) -> f64 {
        self.utc_time
    }

    pub fn set_utc_time(&mut self, utc: f64) {
        self.utc_time = utc;
    }

    pub fn gaming_area(&self) -> &GamingArea {
        &self.gaming_area
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        if self.frozen != frozen {
            log::info!("simulation {}", if frozen { "frozen" } else { "resumed" });
            self.frozen = frozen;
        }
    }

    /// Advances the clocks and moves the local active players. Remote
    /// players are positioned by their NIBs. While frozen only UTC runs.
    pub fn step(&mut self, dt: f64) {
        self.utc_time += dt;
        if self.frozen {
            return;
        }
        self.exec_time += dt;
        for (_, player) in self.players.iter_mut() {
            if player.is_local()
                && matches!(player.mode, PlayerMode::Active | PlayerMode::Launched)
            {
                player.advance(dt);
            }
        }
    }

    pub fn add_player(&mut self, player: Player) -> PlayerHandle {
        log::debug!("adding player {} ({})", player.id, player.name);
        self.players.insert(player)
    }

    pub fn player(&self, handle: PlayerHandle) -> Option<&Player> {
        self.players.get(handle)
    }

    pub fn player_mut(&mut self, handle: PlayerHandle) -> Option<&mut Player> {
        self.players.get_mut(handle)
    }

    pub fn remove_player(&mut self, handle: PlayerHandle) -> Option<Player> {
        let player = self.players.remove(handle)?;
        log::debug!("removed player {} ({})", player.id, player.name);
        Some(player)
    }

    pub fn find_by_name(&self, name: &str) -> Option<PlayerHandle> {
        self.players
            .iter()
            .find(|(_, p)| p.name == name)
            .map(|(handle, _)| handle)
    }

    /// Local player by its player id.
    pub fn find_local(&self, id: u16) -> Option<PlayerHandle> {
        self.players
            .iter()
            .find(|(_, p)| p.is_local() && p.id == id)
            .map(|(handle, _)| handle)
    }

    /// Remote player mirroring the network entity `id`.
    pub fn find_remote(&self, id: EntityId) -> Option<PlayerHandle> {
        self.players
            .iter()
            .find(|(_, p)| p.remote_id == Some(id))
            .map(|(handle, _)| handle)
    }

    /// Smallest local player id not in use.
    pub fn next_local_id(&self) -> u16 {
        let mut used: Vec<u16> = self
            .players
            .iter()
            .filter(|(_, p)| p.is_local())
            .map(|(_, p)| p.id)
            .collect();
        used.sort_unstable();
        let mut candidate = 1;
        for id in used {
            if id == candidate {
                candidate += 1;
            } else if id > candidate {
                break;
            }
        }
        candidate
    }
}

fn current_utc_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;

    #[test]
    fn test_step_moves_local_active_players_only() {
        let mut sim = Simulation::default();
        let mut local = Player::new(1, "local", "f16");
        local.mode = PlayerMode::Active;
        local.velocity = DVec3::new(10.0, 0.0, 0.0);
        let mut remote = local.clone();
        remote.remote_id = Some(EntityId::new(2, 2, 7));
        let local = sim.add_player(local);
        let remote = sim.add_player(remote);

        sim.step(1.0);
        assert_eq!(sim.exec_time(), 1.0);
        assert_eq!(sim.player(local).map(|p| p.position.x), Some(10.0));
        assert_eq!(sim.player(remote).map(|p| p.position.x), Some(0.0));
    }

    #[test]
    fn test_frozen_holds_exec_time() {
        let mut sim = Simulation::default();
        let utc = sim.utc_time();
        sim.set_frozen(true);
        sim.step(0.5);
        assert_eq!(sim.exec_time(), 0.0);
        assert!((sim.utc_time() - utc - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_lookups() {
        let mut sim = Simulation::default();
        let a = sim.add_player(Player::new(1, "alpha", "f16"));
        let mut r = Player::new(1, "remote", "t72");
        r.remote_id = Some(EntityId::new(5, 5, 1));
        let r = sim.add_player(r);
        sim.add_player(Player::new(3, "charlie", "f16"));

        assert_eq!(sim.find_by_name("alpha"), Some(a));
        assert_eq!(sim.find_local(1), Some(a));
        assert_eq!(sim.find_remote(EntityId::new(5, 5, 1)), Some(r));
        assert_eq!(sim.next_local_id(), 2);
    }
}
