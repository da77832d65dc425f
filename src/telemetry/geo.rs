//! Geographic to scene-space conversion.
//!
//! Scene space is y-up with the prime meridian on the +x axis, so a point at
//! (0°, 0°) lands on `(r, 0, 0)` and the poles on `(0, ±r, 0)`.

pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub type Point3 = [f64; 3];

/// Converts latitude/longitude in degrees to a point on a sphere of `radius`.
pub fn geo_to_cartesian(latitude_deg: f64, longitude_deg: f64, radius: f64) -> Point3 {
    let phi = (90.0 - latitude_deg).to_radians();
    let theta = (longitude_deg + 180.0).to_radians();

    let x = -radius * phi.sin() * theta.cos();
    let y = radius * phi.cos();
    let z = radius * phi.sin() * theta.sin();
    [x, y, z]
}

/// Radius of the orbit shell in scene units for an altitude above the surface.
pub fn orbit_radius(globe_radius: f64, altitude_km: f64) -> f64 {
    globe_radius * (1.0 + altitude_km / EARTH_RADIUS_KM)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub globe_radius: f64,
    /// Scale applied to the ground track so it sits just above the globe mesh.
    pub ground_lift: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            globe_radius: 1.0,
            ground_lift: 1.002,
        }
    }
}

impl Projection {
    pub fn orbit_point(&self, latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> Point3 {
        geo_to_cartesian(
            latitude_deg,
            longitude_deg,
            orbit_radius(self.globe_radius, altitude_km),
        )
    }

    pub fn ground_point(&self, latitude_deg: f64, longitude_deg: f64) -> Point3 {
        geo_to_cartesian(
            latitude_deg,
            longitude_deg,
            self.globe_radius * self.ground_lift,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(actual: Point3, expected: Point3) {
        for i in 0..3 {
            assert!(
                (actual[i] - expected[i]).abs() < EPS,
                "component {i}: {actual:?} != {expected:?}"
            );
        }
    }

    #[test]
    fn origin_maps_to_positive_x() {
        assert_close(geo_to_cartesian(0.0, 0.0, 1.0), [1.0, 0.0, 0.0]);
        assert_close(geo_to_cartesian(0.0, 0.0, 5.0), [5.0, 0.0, 0.0]);
    }

    #[test]
    fn poles_map_to_y_axis() {
        assert_close(geo_to_cartesian(90.0, 0.0, 2.0), [0.0, 2.0, 0.0]);
        assert_close(geo_to_cartesian(-90.0, 0.0, 2.0), [0.0, -2.0, 0.0]);
        // longitude is irrelevant at the poles
        assert_close(geo_to_cartesian(90.0, 123.0, 2.0), [0.0, 2.0, 0.0]);
    }

    #[test]
    fn quarter_turns_along_equator() {
        assert_close(geo_to_cartesian(0.0, 90.0, 1.0), [0.0, 0.0, -1.0]);
        assert_close(geo_to_cartesian(0.0, -90.0, 1.0), [0.0, 0.0, 1.0]);
        assert_close(geo_to_cartesian(0.0, 180.0, 1.0), [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn points_lie_on_the_sphere() {
        for (lat, lon) in [(51.6, -0.1), (-33.9, 151.2), (12.0, 77.0)] {
            let [x, y, z] = geo_to_cartesian(lat, lon, 3.0);
            assert!(((x * x + y * y + z * z).sqrt() - 3.0).abs() < EPS);
        }
    }

    #[test]
    fn orbit_shell_scales_with_altitude() {
        assert!((orbit_radius(1.0, 0.0) - 1.0).abs() < EPS);
        assert!((orbit_radius(2.0, EARTH_RADIUS_KM) - 4.0).abs() < EPS);

        let projection = Projection::default();
        let [x, _, _] = projection.orbit_point(0.0, 0.0, 420.0);
        assert!(x > projection.globe_radius * projection.ground_lift);
    }
}
