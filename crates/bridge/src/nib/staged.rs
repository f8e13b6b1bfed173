use glam::DVec3;

use crate::dis::EntityType;
use crate::dr::DrAlgorithm;
use crate::player::Appearance;

use super::articulation::StagedArticulation;

/// Protocol-neutral entity state decoded from the wire, ready to apply to
/// an input NIB. Kinematics are geocentric; orientation is (phi, theta,
/// psi) relative to ECEF.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedEntityState {
    pub entity_type: EntityType,
    pub force_id: u8,
    pub marking: String,
    pub appearance: Appearance,
    pub deactivated: bool,
    pub articulation: StagedArticulation,
    pub position: DVec3,
    pub velocity: DVec3,
    pub acceleration: DVec3,
    pub orientation: DVec3,
    pub angular_velocity: DVec3,
    pub dr_algorithm: DrAlgorithm,
    /// Age of the remote state in local seconds, used to carry the
    /// baseline forward. Zero on the execution timeline.
    pub diff_time: f64,
}
