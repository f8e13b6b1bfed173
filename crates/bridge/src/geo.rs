use glam::{DMat3, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

pub const WGS84_A: f64 = 6_378_137.0;
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geodetic {
    /// Degrees.
    pub latitude: f64,
    /// Degrees.
    pub longitude: f64,
    /// Meters above the ellipsoid.
    pub altitude: f64,
}

pub fn geodetic_to_ecef(geo: Geodetic) -> DVec3 {
    let lat = geo.latitude.to_radians();
    let lon = geo.longitude.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    DVec3::new(
        (n + geo.altitude) * cos_lat * cos_lon,
        (n + geo.altitude) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + geo.altitude) * sin_lat,
    )
}

/// Bowring's method refined by a few fixed-point iterations.
pub fn ecef_to_geodetic(ecef: DVec3) -> Geodetic {
    let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();
    let longitude = ecef.y.atan2(ecef.x);
    if p < 1e-9 {
        let latitude = if ecef.z >= 0.0 { 90.0 } else { -90.0 };
        return Geodetic {
            latitude,
            longitude: 0.0,
            altitude: ecef.z.abs() - WGS84_B,
        };
    }

    let mut lat = ecef.z.atan2(p * (1.0 - WGS84_E2));
    let mut altitude = 0.0;
    for _ in 0..5 {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        altitude = p / lat.cos() - n;
        lat = ecef.z.atan2(p * (1.0 - WGS84_E2 * n / (n + altitude)));
    }
    Geodetic {
        latitude: lat.to_degrees(),
        longitude: longitude.to_degrees(),
        altitude,
    }
}

/// Rotation taking north-east-down vectors at (lat, lon) into ECEF.
pub fn ned_to_ecef_rotation(latitude_deg: f64, longitude_deg: f64) -> DMat3 {
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = longitude_deg.to_radians().sin_cos();
    DMat3::from_cols(
        DVec3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat),
        DVec3::new(-sin_lon, cos_lon, 0.0),
        DVec3::new(-cos_lat * cos_lon, -cos_lat * sin_lon, -sin_lat),
    )
}

/// Body-to-frame rotation for (phi, theta, psi) Euler angles.
pub fn euler_to_matrix(euler: DVec3) -> DMat3 {
    DMat3::from_euler(EulerRot::ZYX, euler.z, euler.y, euler.x)
}

/// Euler angles (phi, theta, psi) of a body-to-frame rotation.
pub fn matrix_to_euler(rotation: DMat3) -> DVec3 {
    let (psi, theta, phi) = DQuat::from_mat3(&rotation).normalize().to_euler(EulerRot::ZYX);
    DVec3::new(phi, theta, psi)
}

/// Local tangent plane anchored at the simulation reference point. Player
/// positions are NED meters in this plane; the map to ECEF is affine and
/// exactly invertible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GamingArea {
    reference: Geodetic,
    origin: DVec3,
    ned_to_ecef: DMat3,
    ecef_to_ned: DMat3,
}

impl Default for GamingArea {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl GamingArea {
    pub fn new(ref_latitude: f64, ref_longitude: f64) -> Self {
        let reference = Geodetic {
            latitude: ref_latitude,
            longitude: ref_longitude,
            altitude: 0.0,
        };
        let ned_to_ecef = ned_to_ecef_rotation(ref_latitude, ref_longitude);
        Self {
            reference,
            origin: geodetic_to_ecef(reference),
            ned_to_ecef,
            ecef_to_ned: ned_to_ecef.transpose(),
        }
    }

    pub fn reference(&self) -> Geodetic {
        self.reference
    }

    pub fn position_to_ecef(&self, ned: DVec3) -> DVec3 {
        self.origin + self.ned_to_ecef * ned
    }

    pub fn position_from_ecef(&self, ecef: DVec3) -> DVec3 {
        self.ecef_to_ned * (ecef - self.origin)
    }

    pub fn vector_to_ecef(&self, ned: DVec3) -> DVec3 {
        self.ned_to_ecef * ned
    }

    pub fn vector_from_ecef(&self, ecef: DVec3) -> DVec3 {
        self.ecef_to_ned * ecef
    }

    /// NED-relative (roll, pitch, yaw) to ECEF-relative (phi, theta, psi).
    pub fn euler_to_ecef(&self, euler: DVec3) -> DVec3 {
        matrix_to_euler(self.ned_to_ecef * euler_to_matrix(euler))
    }

    pub fn euler_from_ecef(&self, euler: DVec3) -> DVec3 {
        matrix_to_euler(self.ecef_to_ned * euler_to_matrix(euler))
    }

    pub fn geodetic(&self, ned: DVec3) -> Geodetic {
        ecef_to_geodetic(self.position_to_ecef(ned))
    }
}

/// Wraps an angle in radians into (-pi, pi].
pub fn wrap_pi(angle: f64) -> f64 {
    let wrapped = (angle + std::f64::consts::PI).rem_euclid(std::f64::consts::TAU)
        - std::f64::consts::PI;
    if wrapped <= -std::f64::consts::PI {
        wrapped + std::f64::consts::TAU
    } else {
        wrapped
    }
}

/// Smallest rotation angle between two attitudes given as Euler angles.
pub fn attitude_difference(a: DVec3, b: DVec3) -> f64 {
    let qa = DQuat::from_mat3(&euler_to_matrix(a)).normalize();
    let qb = DQuat::from_mat3(&euler_to_matrix(b)).normalize();
    let delta = qa.conjugate() * qb;
    2.0 * delta.xyz().length().atan2(delta.w.abs())
}
