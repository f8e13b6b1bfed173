use crate::dis::{ArticulationParameter, EntityType, part};
use crate::ntm::Ntm;
use crate::player::{Articulation, VehicleClass, WeaponStation};

/// Store reported on a station by an attached-part record. A null type
/// means the station is empty or its store has launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachedStore {
    pub station: u32,
    pub entity_type: EntityType,
}

/// Articulated and attached parts found in an incoming record list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedArticulation {
    pub wing_sweep: Option<f64>,
    pub landing_gear: Option<f64>,
    pub left_bay_door: Option<f64>,
    pub right_bay_door: Option<f64>,
    pub launcher_elevation: Option<f64>,
    pub stores: Vec<AttachedStore>,
}

impl StagedArticulation {
    pub fn from_parameters(parameters: impl IntoIterator<Item = ArticulationParameter>) -> Self {
        let mut staged = Self::default();
        for parameter in parameters {
            if let Some(value) = parameter.articulated_value() {
                let value = f64::from(value);
                match parameter.parameter_type {
                    t if t == part::WING_SWEEP + part::POSITION => staged.wing_sweep = Some(value),
                    t if t == part::LANDING_GEAR + part::POSITION => {
                        staged.landing_gear = Some(value)
                    }
                    t if t == part::LEFT_WEAPON_BAY_DOOR + part::POSITION => {
                        staged.left_bay_door = Some(value)
                    }
                    t if t == part::RIGHT_WEAPON_BAY_DOOR + part::POSITION => {
                        staged.right_bay_door = Some(value)
                    }
                    t if t == part::PRIMARY_LAUNCHER + part::ELEVATION => {
                        staged.launcher_elevation = Some(value)
                    }
                    other => log::trace!("ignoring articulated part {other}"),
                }
            } else if let Some(entity_type) = parameter.attached_type() {
                staged.stores.push(AttachedStore {
                    station: parameter.parameter_type,
                    entity_type,
                });
            }
        }
        staged
    }

    /// Writes the parts that were present; absent parts keep their value.
    pub fn apply_to(&self, articulation: &mut Articulation) {
        if let Some(v) = self.wing_sweep {
            articulation.wing_sweep = v;
        }
        if let Some(v) = self.landing_gear {
            articulation.landing_gear = v;
        }
        if let Some(v) = self.left_bay_door {
            articulation.left_bay_door = v;
        }
        if let Some(v) = self.right_bay_door {
            articulation.right_bay_door = v;
        }
        if let Some(v) = self.launcher_elevation {
            articulation.launcher_elevation = v;
        }
    }
}

/// Record list for a vehicle of `class`. Air vehicles carry their moving
/// surfaces only; ground vehicles carry the launcher and one attached part
/// per weapon station.
pub fn articulation_records(
    class: VehicleClass,
    articulation: &Articulation,
    stations: &[WeaponStation],
    ntm: &Ntm,
) -> Vec<ArticulationParameter> {
    match class {
        VehicleClass::Air => vec![
            ArticulationParameter::articulated(
                part::WING_SWEEP + part::POSITION,
                articulation.wing_sweep as f32,
            ),
            ArticulationParameter::articulated(
                part::LANDING_GEAR + part::POSITION,
                articulation.landing_gear as f32,
            ),
            ArticulationParameter::articulated(
                part::LEFT_WEAPON_BAY_DOOR + part::POSITION,
                articulation.left_bay_door as f32,
            ),
            ArticulationParameter::articulated(
                part::RIGHT_WEAPON_BAY_DOOR + part::POSITION,
                articulation.right_bay_door as f32,
            ),
        ],
        VehicleClass::Ground => {
            let mut records = vec![ArticulationParameter::articulated(
                part::PRIMARY_LAUNCHER + part::ELEVATION,
                articulation.launcher_elevation as f32,
            )];
            records.extend(stations.iter().map(|station| {
                let store_type = station
                    .store
                    .as_ref()
                    .filter(|store| !store.released)
                    .and_then(|store| ntm.find_entity_type(&store.template))
                    .unwrap_or(EntityType::NULL);
                ArticulationParameter::attached(station.station, store_type)
            }));
            records
        }
        _ => Vec::new(),
    }
}
