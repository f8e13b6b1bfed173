mod policy;
mod smoothing;

pub use policy::{DrThresholds, UpdateReason, kinematic_update_reason};
pub use smoothing::Smoother;

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::geo::{euler_to_matrix, matrix_to_euler};

const SMALL_RATE: f64 = 1e-6;

/// Dead-reckoning model, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DrAlgorithm {
    #[default]
    Static = 1,
    Fpw = 2,
    Rpw = 3,
    Rvw = 4,
    Fvw = 5,
    Fpb = 6,
    Rpb = 7,
    Rvb = 8,
    Fvb = 9,
}

impl DrAlgorithm {
    /// Wire code; "other" (0) and unknown codes decode as `Static`.
    pub fn from_u8(code: u8) -> Self {
        match code {
            2 => DrAlgorithm::Fpw,
            3 => DrAlgorithm::Rpw,
            4 => DrAlgorithm::Rvw,
            5 => DrAlgorithm::Fvw,
            6 => DrAlgorithm::Fpb,
            7 => DrAlgorithm::Rpb,
            8 => DrAlgorithm::Rvb,
            9 => DrAlgorithm::Fvb,
            _ => DrAlgorithm::Static,
        }
    }

    pub fn rotates(self) -> bool {
        matches!(
            self,
            DrAlgorithm::Rpw | DrAlgorithm::Rvw | DrAlgorithm::Rpb | DrAlgorithm::Rvb
        )
    }

    pub fn uses_acceleration(self) -> bool {
        matches!(
            self,
            DrAlgorithm::Rvw | DrAlgorithm::Fvw | DrAlgorithm::Rvb | DrAlgorithm::Fvb
        )
    }

    pub fn body_axis(self) -> bool {
        matches!(
            self,
            DrAlgorithm::Fpb | DrAlgorithm::Rpb | DrAlgorithm::Rvb | DrAlgorithm::Fvb
        )
    }
}

/// Extrapolated kinematics in the geocentric frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrState {
    pub position: DVec3,
    pub velocity: DVec3,
    /// (phi, theta, psi) relative to ECEF.
    pub orientation: DVec3,
    /// Body rates (p, q, r).
    pub angular_velocity: DVec3,
}

/// Baseline for one entity. Only `reset` changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadReckoning {
    algorithm: DrAlgorithm,
    position: DVec3,
    velocity: DVec3,
    acceleration: DVec3,
    orientation: DVec3,
    angular_velocity: DVec3,
    rotation: DMat3,
    body_velocity: DVec3,
    body_acceleration: DVec3,
}

impl Default for DeadReckoning {
    fn default() -> Self {
        Self {
            algorithm: DrAlgorithm::Static,
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            acceleration: DVec3::ZERO,
            orientation: DVec3::ZERO,
            angular_velocity: DVec3::ZERO,
            rotation: DMat3::IDENTITY,
            body_velocity: DVec3::ZERO,
            body_acceleration: DVec3::ZERO,
        }
    }
}

impl DeadReckoning {
    /// Stores a new baseline. A nonzero `diff_time` first moves the supplied
    /// state forward by that many seconds and stores the result.
    #[allow(clippy::too_many_arguments)]
    pub fn reset(
        &mut self,
        algorithm: DrAlgorithm,
        position: DVec3,
        velocity: DVec3,
        acceleration: DVec3,
        orientation: DVec3,
        angular_velocity: DVec3,
        diff_time: f64,
    ) {
        self.store(
            algorithm,
            position,
            velocity,
            acceleration,
            orientation,
            angular_velocity,
        );
        if diff_time != 0.0 {
            let state = self.extrapolate(diff_time);
            let acceleration = if algorithm.body_axis() {
                euler_to_matrix(state.orientation) * self.body_acceleration
            } else {
                acceleration
            };
            self.store(
                algorithm,
                state.position,
                state.velocity,
                acceleration,
                state.orientation,
                state.angular_velocity,
            );
        }
    }

    fn store(
        &mut self,
        algorithm: DrAlgorithm,
        position: DVec3,
        velocity: DVec3,
        acceleration: DVec3,
        orientation: DVec3,
        angular_velocity: DVec3,
    ) {
        let rotation = euler_to_matrix(orientation);
        let to_body = rotation.transpose();
        *self = Self {
            algorithm,
            position,
            velocity,
            acceleration,
            orientation,
            angular_velocity,
            rotation,
            body_velocity: to_body * velocity,
            body_acceleration: to_body * acceleration,
        };
    }

    pub fn algorithm(&self) -> DrAlgorithm {
        self.algorithm
    }

    pub fn baseline(&self) -> DrState {
        DrState {
            position: self.position,
            velocity: self.velocity,
            orientation: self.orientation,
            angular_velocity: self.angular_velocity,
        }
    }

    pub fn acceleration(&self) -> DVec3 {
        self.acceleration
    }

    /// State `dt` seconds after the baseline. Pure; `dt == 0` returns the
    /// baseline exactly.
    pub fn extrapolate(&self, dt: f64) -> DrState {
        if dt == 0.0 || self.algorithm == DrAlgorithm::Static {
            return self.baseline();
        }

        let omega = self.angular_velocity;
        let rate = omega.length();
        let rotating = self.algorithm.rotates() && rate > SMALL_RATE;
        let rotation = if rotating {
            self.rotation * DMat3::from_axis_angle(omega / rate, rate * dt)
        } else {
            self.rotation
        };
        let orientation = if rotating {
            matrix_to_euler(rotation)
        } else {
            self.orientation
        };

        let (position, velocity) = if self.algorithm.body_axis() {
            let accel = self.algorithm.uses_acceleration();
            let displacement = if self.algorithm.rotates() {
                let (r1, r2) = integration_matrices(omega, dt);
                let mut body = r1 * self.body_velocity;
                if accel {
                    body += r2 * self.body_acceleration;
                }
                body
            } else {
                let mut body = self.body_velocity * dt;
                if accel {
                    body += 0.5 * self.body_acceleration * dt * dt;
                }
                body
            };
            let body_velocity = if accel {
                self.body_velocity + self.body_acceleration * dt
            } else {
                self.body_velocity
            };
            (
                self.position + self.rotation * displacement,
                rotation * body_velocity,
            )
        } else if self.algorithm.uses_acceleration() {
            (
                self.position + self.velocity * dt + 0.5 * self.acceleration * dt * dt,
                self.velocity + self.acceleration * dt,
            )
        } else {
            (self.position + self.velocity * dt, self.velocity)
        };

        DrState {
            position,
            velocity,
            orientation,
            angular_velocity: self.angular_velocity,
        }
    }
}

/// IEEE 1278.1 body-axis integration matrices R1 and R2 for body rates
/// `omega` over `dt` seconds.
pub fn integration_matrices(omega: DVec3, dt: f64) -> (DMat3, DMat3) {
    let w = omega.length();
    if w < SMALL_RATE {
        return (
            DMat3::from_diagonal(DVec3::splat(dt)),
            DMat3::from_diagonal(DVec3::splat(0.5 * dt * dt)),
        );
    }
    let wt = w * dt;
    let (s, c) = wt.sin_cos();
    let outer = DMat3::from_cols(omega * omega.x, omega * omega.y, omega * omega.z);
    let skew = DMat3::from_cols(
        DVec3::new(0.0, omega.z, -omega.y),
        DVec3::new(-omega.z, 0.0, omega.x),
        DVec3::new(omega.y, -omega.x, 0.0),
    );
    let w2 = w * w;
    let w3 = w2 * w;
    let w4 = w2 * w2;

    let r1 = outer * ((wt - s) / w3) + DMat3::IDENTITY * (s / w) + skew * ((1.0 - c) / w2);
    let r2 = outer * ((0.5 * wt * wt - c - wt * s + 1.0) / w4)
        + DMat3::IDENTITY * ((c + wt * s - 1.0) / w2)
        + skew * ((s - wt * c) / w3);
    (r1, r2)
}
