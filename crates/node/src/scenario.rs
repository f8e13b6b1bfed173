use std::f64::consts::FRAC_PI_2;

use glam::DVec3;

use simbridge::dis::DetonationResult;
use simbridge::player::{
    Emitter, Player, PlayerHandle, PlayerMode, Radio, Side, Simulation, TemplateRegistry,
    VehicleClass, WeaponState, WeaponStation,
};
use simbridge::units::{Frequency, Power};

use crate::config::ScenarioConfig;
use crate::events::NodeEvent;

const GRAVITY: f64 = 9.80665;
const AIRCRAFT_ID: u16 = 1;
const LAUNCHER_ID: u16 = 2;
const FIRST_MISSILE_ID: u16 = 100;
const STATIONS: [u32; 2] = [1, 2];
/// Seconds a detonated missile stays published before removal.
const WRECK_TIME: f64 = 2.0;
const HIT_RADIUS: f64 = 50.0;

/// Constructors for every template the node can mirror or create.
pub fn templates() -> TemplateRegistry {
    let mut templates = TemplateRegistry::new();
    for (name, class) in [
        ("f16", VehicleClass::Air),
        ("aircraft", VehicleClass::Air),
        ("sa6", VehicleClass::Ground),
        ("ground", VehicleClass::Ground),
        ("ship", VehicleClass::Ship),
        ("sam", VehicleClass::Weapon),
        ("munition", VehicleClass::Weapon),
    ] {
        templates.register(name, move || Player::default().with_class(class));
    }
    templates
}

struct Missile {
    handle: PlayerHandle,
    id: u16,
    detonate_at: f64,
    remove_at: Option<f64>,
}

/// Scripted local players: an aircraft orbiting the reference point with a
/// radar and a radio, and a two-station launcher that fires at it (or at
/// the first remote aircraft heard on the network).
pub struct Scenario {
    config: ScenarioConfig,
    aircraft: PlayerHandle,
    launcher: PlayerHandle,
    missiles: Vec<Missile>,
    next_fire: f64,
    next_id: u16,
}

impl Scenario {
    pub fn setup(sim: &mut Simulation, config: ScenarioConfig) -> Self {
        let mut aircraft = Player::new(AIRCRAFT_ID, "viper11", "f16").with_class(VehicleClass::Air);
        aircraft.side = Side::Blue;
        aircraft.mode = PlayerMode::Active;
        aircraft.network_enabled = true;
        aircraft
            .emitters
            .push(Emitter::new(130, 1, Frequency::gigahertz(9.6), Power::kilowatts(5.0)));
        aircraft.radio = Some(Radio::new(1, Frequency::megahertz(251.0), Power::watts(10.0)));

        let mut launcher =
            Player::new(LAUNCHER_ID, "gainful1", "sa6").with_class(VehicleClass::Ground);
        launcher.side = Side::Red;
        launcher.mode = PlayerMode::Active;
        launcher.network_enabled = true;
        launcher.stations = STATIONS
            .iter()
            .map(|&station| WeaponStation::loaded(station, "sam"))
            .collect();

        let aircraft = sim.add_player(aircraft);
        let launcher = sim.add_player(launcher);
        let scenario = Self {
            next_fire: config.fire_interval,
            config,
            aircraft,
            launcher,
            missiles: Vec::new(),
            next_id: FIRST_MISSILE_ID,
        };
        scenario.fly_orbit(sim, 0.0);
        scenario
    }

    pub fn missiles_in_flight(&self) -> usize {
        self.missiles.len()
    }

    /// Runs the script up to the simulation's current exec time.
    pub fn update(&mut self, sim: &mut Simulation) -> Vec<NodeEvent> {
        let mut events = Vec::new();
        if sim.is_frozen() {
            return events;
        }
        let now = sim.exec_time();
        self.fly_orbit(sim, now);
        self.fly_missiles(sim, now, &mut events);
        if now >= self.next_fire {
            self.fire(sim, now, &mut events);
            self.next_fire = now + self.config.fire_interval;
        }
        events
    }

    fn fly_orbit(&self, sim: &mut Simulation, now: f64) {
        let Some(aircraft) = sim.player_mut(self.aircraft) else {
            return;
        };
        let radius = self.config.orbit_radius;
        let rate = self.config.orbit_speed / radius;
        let angle = rate * now;
        let (sin, cos) = angle.sin_cos();
        let bank = (self.config.orbit_speed * rate / GRAVITY).atan();

        aircraft.position = DVec3::new(radius * cos, radius * sin, -self.config.orbit_altitude);
        aircraft.velocity = DVec3::new(-sin, cos, 0.0) * self.config.orbit_speed;
        aircraft.acceleration = DVec3::new(-cos, -sin, 0.0) * radius * rate * rate;
        aircraft.euler = DVec3::new(bank, 0.0, angle + FRAC_PI_2);
        aircraft.angular_velocity = DVec3::new(0.0, rate * bank.sin(), rate * bank.cos());
    }

    fn target(&self, sim: &Simulation) -> Option<PlayerHandle> {
        sim.players
            .iter()
            .find(|(_, p)| {
                p.is_remote() && p.class == VehicleClass::Air && p.mode == PlayerMode::Active
            })
            .map(|(handle, _)| handle)
            .or(Some(self.aircraft))
    }

    fn fire(&mut self, sim: &mut Simulation, now: f64, events: &mut Vec<NodeEvent>) {
        let Some(launcher) = sim.player_mut(self.launcher) else {
            return;
        };
        if launcher.mode != PlayerMode::Active {
            return;
        }
        if !launcher.stations.iter().any(WeaponStation::is_ready) {
            log::info!("{} reloading", launcher.name);
            for station in &mut launcher.stations {
                if let Some(store) = station.store.as_mut() {
                    store.released = false;
                }
            }
        }
        let Some(station) = launcher.stations.iter_mut().find(|s| s.is_ready()) else {
            return;
        };
        let Some(store) = station.store.as_mut() else {
            return;
        };
        store.released = true;
        let station_number = station.station;
        let template = store.template.clone();
        let origin = launcher.position - DVec3::new(0.0, 0.0, 5.0);

        let target = self.target(sim);
        let aim = target
            .and_then(|h| sim.player(h))
            .map_or(DVec3::NEG_Z, |t| (t.position - origin).normalize_or(DVec3::NEG_Z));

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(FIRST_MISSILE_ID);
        let mut missile =
            Player::new(id, format!("sam{id}"), template).with_class(VehicleClass::Weapon);
        missile.side = Side::Red;
        missile.mode = PlayerMode::Launched;
        missile.network_enabled = true;
        missile.position = origin;
        missile.velocity = aim * self.config.missile_speed;
        missile.euler = heading_pitch(aim);
        missile.weapon = Some(WeaponState {
            launcher: Some(self.launcher),
            target,
            station: station_number,
            ..Default::default()
        });
        let handle = sim.add_player(missile);
        self.missiles.push(Missile {
            handle,
            id,
            detonate_at: now + self.config.flight_time,
            remove_at: None,
        });
        log::info!("missile {id} launched from station {station_number}");
        events.push(NodeEvent::Launched {
            missile: id,
            station: station_number,
        });
    }

    fn fly_missiles(&mut self, sim: &mut Simulation, now: f64, events: &mut Vec<NodeEvent>) {
        let speed = self.config.missile_speed;
        self.missiles.retain_mut(|missile| {
            if missile.remove_at.is_some_and(|t| now >= t) {
                sim.remove_player(missile.handle);
                return false;
            }
            let target_position = sim
                .player(missile.handle)
                .and_then(|m| m.weapon)
                .and_then(|w| w.target)
                .and_then(|h| sim.player(h))
                .map(|t| t.position);
            let Some(player) = sim.player_mut(missile.handle) else {
                return false;
            };
            if player.mode != PlayerMode::Launched {
                return true;
            }
            if now >= missile.detonate_at {
                let result = match target_position {
                    Some(target) if target.distance(player.position) < HIT_RADIUS => {
                        DetonationResult::EntityImpact
                    }
                    _ => DetonationResult::Detonation,
                };
                player.set_mode(PlayerMode::Detonated);
                player.velocity = DVec3::ZERO;
                if let Some(weapon) = player.weapon.as_mut() {
                    weapon.detonation_result = Some(result);
                }
                missile.remove_at = Some(now + WRECK_TIME);
                events.push(NodeEvent::Detonated { missile: missile.id });
            } else if let Some(target) = target_position {
                let aim = (target - player.position)
                    .normalize_or(player.velocity.normalize_or_zero());
                player.velocity = aim * speed;
                player.euler = heading_pitch(aim);
            }
            true
        });
    }
}

/// Euler angles pointing the body x axis along a NED direction.
fn heading_pitch(direction: DVec3) -> DVec3 {
    let horizontal = direction.x.hypot(direction.y);
    DVec3::new(0.0, (-direction.z).atan2(horizontal), direction.y.atan2(direction.x))
}

#[cfg(test)]
impl Scenario {
    fn aircraft(&self) -> PlayerHandle {
        self.aircraft
    }

    fn launcher(&self) -> PlayerHandle {
        self.launcher
    }
}
