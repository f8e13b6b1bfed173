use glam::{DQuat, DVec3};

use crate::geo::{euler_to_matrix, matrix_to_euler};

/// Blends out the jump between the displayed state and a fresh baseline.
/// The offset decays linearly to zero over `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    duration: f64,
    start: f64,
    position_offset: DVec3,
    orientation_offset: DQuat,
}

impl Smoother {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            start: 0.0,
            position_offset: DVec3::ZERO,
            orientation_offset: DQuat::IDENTITY,
        }
    }

    pub fn enabled(&self) -> bool {
        self.duration > 0.0
    }

    /// Records the jump from what was shown to the new baseline at `now`.
    pub fn begin(
        &mut self,
        now: f64,
        shown_position: DVec3,
        shown_orientation: DVec3,
        new_position: DVec3,
        new_orientation: DVec3,
    ) {
        if !self.enabled() {
            return;
        }
        let shown = DQuat::from_mat3(&euler_to_matrix(shown_orientation)).normalize();
        let fresh = DQuat::from_mat3(&euler_to_matrix(new_orientation)).normalize();
        self.start = now;
        self.position_offset = shown_position - new_position;
        self.orientation_offset = (shown * fresh.inverse()).normalize();
    }

    pub fn active(&self, now: f64) -> bool {
        self.enabled() && now - self.start < self.duration
    }

    pub fn apply(&self, now: f64, position: DVec3, orientation: DVec3) -> (DVec3, DVec3) {
        if !self.active(now) {
            return (position, orientation);
        }
        let remaining = 1.0 - ((now - self.start) / self.duration).clamp(0.0, 1.0);
        let offset = DQuat::IDENTITY.slerp(self.orientation_offset, remaining);
        let rotation = glam::DMat3::from_quat(offset) * euler_to_matrix(orientation);
        (
            position + self.position_offset * remaining,
            matrix_to_euler(rotation),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_passes_through() {
        let mut smoother = Smoother::new(0.0);
        smoother.begin(0.0, DVec3::X, DVec3::ZERO, DVec3::ZERO, DVec3::ZERO);
        let (position, _) = smoother.apply(0.1, DVec3::ZERO, DVec3::ZERO);
        assert_eq!(position, DVec3::ZERO);
    }

    #[test]
    fn test_offset_decays_linearly() {
        let mut smoother = Smoother::new(1.0);
        smoother.begin(10.0, DVec3::new(4.0, 0.0, 0.0), DVec3::ZERO, DVec3::ZERO, DVec3::ZERO);
        let (start, _) = smoother.apply(10.0, DVec3::ZERO, DVec3::ZERO);
        assert_eq!(start, DVec3::new(4.0, 0.0, 0.0));
        let (half, _) = smoother.apply(10.5, DVec3::ZERO, DVec3::ZERO);
        assert!((half.x - 2.0).abs() < 1e-12);
        let (done, _) = smoother.apply(11.0, DVec3::ZERO, DVec3::ZERO);
        assert_eq!(done, DVec3::ZERO);
        assert!(!smoother.active(11.0));
    }

    #[test]
    fn test_orientation_starts_at_shown_attitude() {
        let mut smoother = Smoother::new(2.0);
        let shown = DVec3::new(0.0, 0.0, 0.4);
        smoother.begin(0.0, DVec3::ZERO, shown, DVec3::ZERO, DVec3::ZERO);
        let (_, orientation) = smoother.apply(0.0, DVec3::ZERO, DVec3::ZERO);
        assert!(crate::geo::attitude_difference(orientation, shown) < 1e-9);
    }
}
