use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::dis::{DetonationResult, transmit_state};
use crate::units::{Frequency, Power};

use super::arena::PlayerHandle;

/// One radiating sensor or jammer. Angles are radians in the body frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emitter {
    /// DIS emitter name code.
    pub name: u16,
    pub function: u8,
    pub id: u8,
    /// Antenna location in body coordinates.
    pub location: DVec3,
    pub frequency: Frequency,
    pub frequency_range: Frequency,
    pub power: Power,
    pub pulse_repetition_frequency: f64,
    /// Microseconds.
    pub pulse_width: f64,
    pub azimuth_center: f64,
    pub azimuth_sweep: f64,
    pub elevation_center: f64,
    pub elevation_sweep: f64,
    pub beam_function: u8,
    pub transmitting: bool,
}

impl Emitter {
    pub fn new(name: u16, id: u8, frequency: Frequency, power: Power) -> Self {
        Self {
            name,
            function: 2,
            id,
            location: DVec3::ZERO,
            frequency,
            frequency_range: Frequency::hertz(0.0),
            power,
            pulse_repetition_frequency: 0.0,
            pulse_width: 0.0,
            azimuth_center: 0.0,
            azimuth_sweep: std::f64::consts::PI,
            elevation_center: 0.0,
            elevation_sweep: 0.5,
            beam_function: 1,
            transmitting: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Radio {
    pub id: u16,
    pub frequency: Frequency,
    pub bandwidth: Frequency,
    pub power: Power,
    pub powered: bool,
    pub transmitting: bool,
}

impl Radio {
    pub fn new(id: u16, frequency: Frequency, power: Power) -> Self {
        Self {
            id,
            frequency,
            bandwidth: Frequency::hertz(25_000.0),
            power,
            powered: true,
            transmitting: false,
        }
    }

    pub fn transmit_state(&self) -> u8 {
        match (self.powered, self.transmitting) {
            (false, _) => transmit_state::OFF,
            (true, false) => transmit_state::ON_NOT_TRANSMITTING,
            (true, true) => transmit_state::ON_TRANSMITTING,
        }
    }

    pub fn set_transmit_state(&mut self, state: u8) {
        self.powered = state != transmit_state::OFF;
        self.transmitting = state == transmit_state::ON_TRANSMITTING;
    }
}

/// A store hung on a weapon station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub template: String,
    pub released: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponStation {
    pub station: u32,
    pub store: Option<Store>,
}

impl WeaponStation {
    pub fn loaded(station: u32, template: impl Into<String>) -> Self {
        Self {
            station,
            store: Some(Store {
                template: template.into(),
                released: false,
            }),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.store.as_ref().is_some_and(|s| !s.released)
    }
}

/// Extra state carried by weapon players.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeaponState {
    pub launcher: Option<PlayerHandle>,
    pub target: Option<PlayerHandle>,
    pub station: u32,
    /// Event number shared by the fire and detonation of this shot.
    pub event: u16,
    pub detonation_result: Option<DetonationResult>,
}
