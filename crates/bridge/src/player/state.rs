use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::dis::EntityId;

use super::arena::PlayerHandle;
use super::systems::{Emitter, Radio, WeaponState, WeaponStation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerMode {
    #[default]
    Inactive,
    Active,
    Killed,
    Crashed,
    Detonated,
    PreRelease,
    Launched,
    DeleteRequest,
}

impl PlayerMode {
    /// Modes in which an output entity is put on the network.
    pub fn is_networked(self) -> bool {
        matches!(
            self,
            PlayerMode::Active
                | PlayerMode::Killed
                | PlayerMode::Crashed
                | PlayerMode::Launched
                | PlayerMode::Detonated
        )
    }

    pub fn is_destroyed(self) -> bool {
        matches!(self, PlayerMode::Killed | PlayerMode::Crashed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    Blue,
    Red,
    White,
    #[default]
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VehicleClass {
    Air,
    Ground,
    Ship,
    LifeForm,
    Weapon,
    #[default]
    Other,
}

/// Life-form posture as carried in the appearance word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Posture {
    #[default]
    NotApplicable,
    UprightStill,
    UprightWalking,
    UprightRunning,
    Kneeling,
    Prone,
    Crawling,
    Swimming,
    Parachuting,
    Jumping,
}

impl Posture {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Posture::UprightStill,
            2 => Posture::UprightWalking,
            3 => Posture::UprightRunning,
            4 => Posture::Kneeling,
            5 => Posture::Prone,
            6 => Posture::Crawling,
            7 => Posture::Swimming,
            8 => Posture::Parachuting,
            9 => Posture::Jumping,
            _ => Posture::NotApplicable,
        }
    }
}

/// Visible condition of a player. Levels run from 0.0 (none) to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Appearance {
    pub damage: f64,
    pub smoke: f64,
    pub flames: f64,
    pub frozen: bool,
    /// 0 is uncamouflaged; 1..=4 select a camouflage scheme.
    pub camouflage: u8,
    pub posture: Posture,
}

/// Moving parts that ride along with entity state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Articulation {
    /// Radians.
    pub wing_sweep: f64,
    /// 0.0 retracted, 1.0 down and locked.
    pub landing_gear: f64,
    pub left_bay_door: f64,
    pub right_bay_door: f64,
    /// Radians.
    pub launcher_elevation: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Player {
    pub id: u16,
    pub name: String,
    pub template: String,
    pub class: VehicleClass,
    pub side: Side,
    pub mode: PlayerMode,
    /// Local players only: whether an output entity is published.
    pub network_enabled: bool,
    /// Set on players that mirror a remote entity.
    pub remote_id: Option<EntityId>,

    /// North-east-down meters in the gaming area.
    pub position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    /// (roll, pitch, yaw) radians relative to NED.
    pub euler: DVec3,
    /// Body rates (p, q, r).
    pub angular_velocity: DVec3,

    pub appearance: Appearance,
    pub articulation: Articulation,
    pub stations: Vec<WeaponStation>,
    pub weapon: Option<WeaponState>,
    pub emitters: Vec<Emitter>,
    pub radio: Option<Radio>,
}

impl Player {
    pub fn new(id: u16, name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            template: template.into(),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: VehicleClass) -> Self {
        self.class = class;
        self
    }

    pub fn is_local(&self) -> bool {
        self.remote_id.is_none()
    }

    pub fn is_remote(&self) -> bool {
        self.remote_id.is_some()
    }

    pub fn is_weapon(&self) -> bool {
        self.class == VehicleClass::Weapon
    }

    pub fn altitude(&self) -> f64 {
        -self.position.z
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn set_mode(&mut self, mode: PlayerMode) {
        if self.mode != mode {
            log::debug!("player {} ({}) {:?} -> {:?}", self.id, self.name, self.mode, mode);
            self.mode = mode;
        }
    }

    pub fn launcher(&self) -> Option<PlayerHandle> {
        self.weapon.as_ref().and_then(|w| w.launcher)
    }

    /// Moves the player by its rates for `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.position += self.velocity * dt + 0.5 * self.acceleration * dt * dt;
        self.velocity += self.acceleration * dt;
        self.euler += self.angular_velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_networked_modes() {
        assert!(PlayerMode::Active.is_networked());
        assert!(PlayerMode::Launched.is_networked());
        assert!(PlayerMode::Killed.is_networked());
        assert!(!PlayerMode::PreRelease.is_networked());
        assert!(!PlayerMode::Inactive.is_networked());
        assert!(!PlayerMode::DeleteRequest.is_networked());
    }

    #[test]
    fn test_posture_codes() {
        for code in 0..=9 {
            assert_eq!(Posture::from_code(code).code(), code);
        }
        assert_eq!(Posture::from_code(14), Posture::NotApplicable);
    }

    #[test]
    fn test_advance_integrates_acceleration() {
        let mut player = Player::new(1, "a", "f16");
        player.velocity = DVec3::new(10.0, 0.0, 0.0);
        player.acceleration = DVec3::new(2.0, 0.0, 0.0);
        player.advance(2.0);
        assert_eq!(player.position, DVec3::new(24.0, 0.0, 0.0));
        assert_eq!(player.velocity, DVec3::new(14.0, 0.0, 0.0));
    }
}
