use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::DeadReckoning;
use crate::geo::attitude_difference;

pub const DEFAULT_HEARTBEAT_SECS: f64 = 5.0;
pub const DEFAULT_POSITION_ERROR_M: f64 = 3.0;
pub const DEFAULT_ORIENTATION_ERROR_DEG: f64 = 3.0;
pub const DEFAULT_MAX_AGE_SECS: f64 = 12.0;

/// When an output entity must be refreshed, and how long an input entity
/// may go without one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrThresholds {
    pub heartbeat: f64,
    pub position_error: f64,
    pub orientation_error_deg: f64,
    pub max_age: f64,
}

impl Default for DrThresholds {
    fn default() -> Self {
        Self {
            heartbeat: DEFAULT_HEARTBEAT_SECS,
            position_error: DEFAULT_POSITION_ERROR_M,
            orientation_error_deg: DEFAULT_ORIENTATION_ERROR_DEG,
            max_age: DEFAULT_MAX_AGE_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateReason {
    NeverSent,
    Heartbeat,
    PositionError,
    OrientationError,
    ModeChange,
    AppearanceChange,
    ForceChange,
    TypeChange,
    ArticulationChange,
}

impl fmt::Display for UpdateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UpdateReason::NeverSent => "never sent",
            UpdateReason::Heartbeat => "heartbeat",
            UpdateReason::PositionError => "position error",
            UpdateReason::OrientationError => "orientation error",
            UpdateReason::ModeChange => "mode change",
            UpdateReason::AppearanceChange => "appearance change",
            UpdateReason::ForceChange => "force change",
            UpdateReason::TypeChange => "type change",
            UpdateReason::ArticulationChange => "articulation change",
        };
        f.write_str(text)
    }
}

/// Timer and divergence part of the send decision: compares the captured
/// state with what the last-sent baseline predicts `elapsed` seconds on.
pub fn kinematic_update_reason(
    thresholds: &DrThresholds,
    baseline: &DeadReckoning,
    elapsed: f64,
    position: DVec3,
    orientation: DVec3,
) -> Option<UpdateReason> {
    if elapsed >= thresholds.heartbeat {
        return Some(UpdateReason::Heartbeat);
    }
    let predicted = baseline.extrapolate(elapsed);
    if predicted.position.distance(position) > thresholds.position_error {
        return Some(UpdateReason::PositionError);
    }
    if attitude_difference(predicted.orientation, orientation)
        > thresholds.orientation_error_deg.to_radians()
    {
        return Some(UpdateReason::OrientationError);
    }
    None
}
