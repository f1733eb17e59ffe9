//! Great-circle geometry: distance, bearing, and position advance.
//!
//! All bearings use the navigation convention (0° = North, clockwise,
//! [0, 360)). Distances are metres, computed on a spherical Earth.

use traffic_types::{normalize_heading, wrap_longitude, Position};

/// Mean Earth radius, metres (WGS-84 authalic radius).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn to_radians(deg: f64) -> f64 {
    deg.to_radians()
}

/// Haversine great-circle distance between two positions, in metres,
/// over the horizontal (lat/lon) plane only — altitude is ignored.
///
/// Exposed separately from [`distance`] because the land behaviour's
/// gradient calculation (spec.md §4.3c, `atan(Δalt / horizontalDistance)`)
/// needs the horizontal leg on its own, not the slant range.
pub fn horizontal_distance(a: Position, b: Position) -> f64 {
    let (lat1, lat2) = (to_radians(a.lat), to_radians(b.lat));
    let dlat = lat2 - lat1;
    let dlon = to_radians(b.lon - a.lon);

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Great-circle distance between two positions, in metres: the haversine
/// horizontal distance combined with the altitude difference via
/// Pythagoras (spec.md §4.1). This is the "range" used for arrival/capture
/// checks, so two positions at the same lat/lon but hundreds of metres
/// apart in altitude are correctly reported as far apart, not coincident.
pub fn distance(a: Position, b: Position) -> f64 {
    let horizontal = horizontal_distance(a, b);
    let dalt = b.alt - a.alt;
    (horizontal * horizontal + dalt * dalt).sqrt()
}

/// Initial bearing from `a` to `b`, degrees, navigation convention.
pub fn bearing(a: Position, b: Position) -> f64 {
    let (lat1, lat2) = (to_radians(a.lat), to_radians(b.lat));
    let dlon = to_radians(b.lon - a.lon);

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_heading(y.atan2(x).to_degrees())
}

/// Advance `origin` by `distance_m` metres along `heading_deg` (navigation
/// convention), holding altitude constant. The caller is responsible for any
/// altitude change.
pub fn advance_position(origin: Position, heading_deg: f64, distance_m: f64) -> Position {
    if distance_m == 0.0 {
        return origin;
    }

    let lat1 = to_radians(origin.lat);
    let lon1 = to_radians(origin.lon);
    let theta = to_radians(heading_deg);
    let delta = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    Position::new(
        lat2.to_degrees().clamp(-90.0, 90.0),
        wrap_longitude(lon2.to_degrees()),
        origin.alt,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_identical_points_is_zero() {
        let p = Position::new(40.0, -74.0, 0.0);
        assert!(distance(p, p) < 1e-6);
    }

    #[test]
    fn distance_one_degree_of_latitude_is_about_111km() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(1.0, 0.0, 0.0);
        let d = distance(a, b);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }

    #[test]
    fn distance_combines_altitude_difference_via_pythagoras() {
        let a = Position::new(40.0, -74.0, 0.0);
        let b = Position::new(40.0, -74.0, 300.0);
        assert!((distance(a, b) - 300.0).abs() < 1e-6);

        let c = Position::new(0.0, 0.0, 0.0);
        let d = Position::new(0.0, 0.0, 400.0);
        let horizontal = horizontal_distance(c, d);
        assert_eq!(horizontal, 0.0);
        assert_eq!(distance(c, d), 400.0);
    }

    #[test]
    fn bearing_due_north_is_zero() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(1.0, 0.0, 0.0);
        assert!(bearing(a, b).abs() < 1e-6);
    }

    #[test]
    fn bearing_due_east_is_ninety() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(0.0, 1.0, 0.0);
        assert!((bearing(a, b) - 90.0).abs() < 0.1);
    }

    #[test]
    fn advance_then_distance_round_trips() {
        let origin = Position::new(36.8, -76.3, 0.0);
        let advanced = advance_position(origin, 45.0, 10_000.0);
        let d = distance(origin, advanced);
        assert!((d - 10_000.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn advance_zero_distance_is_identity() {
        let origin = Position::new(10.0, 10.0, 500.0);
        assert_eq!(advance_position(origin, 270.0, 0.0), origin);
    }
}
