//! Per-domain kinematic advance. Free functions, not a trait object: the
//! variant set is closed and known at compile time, so dispatch is a single
//! `match` rather than a vtable — the same style the teacher uses for its
//! physics step functions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use traffic_types::{
    normalize_heading, Platform, PlatformTypeDefinition, PlatformVariant, SimResult, Velocity,
};

use crate::geodesy::{advance_position, bearing, distance, horizontal_distance};

const AIRBORNE_CAPTURE_M: f64 = 100.0;
const SURFACE_CAPTURE_M: f64 = 10.0;
const ALTITUDE_DEADBAND_M: f64 = 10.0;
const DEFAULT_CLIMB_RATE: f64 = 10.0;
const MARITIME_DEFAULT_ACCEL: f64 = 0.5;
const MARITIME_TURNING_RADIUS_FACTOR: f64 = 5.0;

/// Advance one platform by `dt` seconds of simulation time.
///
/// `advance` always succeeds for the four known variants; `UnknownVariant`
/// is reserved for the scenario loader, which is where an unrecognised
/// variant tag actually surfaces (a Rust enum can't hold a fifth value).
pub fn advance(platform: &mut Platform, dt: f64, now: DateTime<Utc>) -> SimResult<()> {
    if dt <= 0.0 {
        platform.last_updated = now.max(platform.last_updated);
        return Ok(());
    }

    let type_def = Arc::clone(&platform.type_def);
    let propulsion_active = platform.speed > 0.0 || platform.navigation.destination.is_some();
    if propulsion_active {
        platform.runtime.fuel_remaining =
            (platform.runtime.fuel_remaining - type_def.performance.fuel_consumption * dt).max(0.0);
    }
    platform.runtime.mission_time += dt;

    match platform.variant {
        PlatformVariant::Airborne => advance_airborne(platform, &type_def, dt, now),
        PlatformVariant::Maritime => advance_maritime(platform, &type_def, dt, now),
        PlatformVariant::Land => advance_land(platform, &type_def, dt, now),
        PlatformVariant::Space => advance_space(platform, &type_def, dt, now),
    }

    Ok(())
}

/// Shortest-side turn toward `desired`, capped at `max_delta` degrees.
fn turn_toward(current: f64, desired: f64, max_delta: f64) -> f64 {
    let error = normalize_heading(desired - current + 180.0) - 180.0;
    if error.abs() <= max_delta {
        normalize_heading(desired)
    } else {
        normalize_heading(current + max_delta * error.signum())
    }
}

fn step_toward(current: f64, target: f64, max_delta: f64) -> f64 {
    if max_delta <= 0.0 {
        return target;
    }
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + max_delta * (target - current).signum()
    }
}

/// No-destination coast: integrate the existing NEU velocity into position.
fn coast(platform: &mut Platform, dt: f64, now: DateTime<Utc>) {
    let horizontal = platform.velocity.horizontal_speed();
    if horizontal > 0.0 {
        let heading = normalize_heading(platform.velocity.east.atan2(platform.velocity.north).to_degrees());
        let mut pos = advance_position(platform.position, heading, horizontal * dt);
        pos.alt = platform.position.alt + platform.velocity.up * dt;
        platform.position = pos;
    } else {
        platform.position.alt += platform.velocity.up * dt;
    }
    platform.last_updated = now.max(platform.last_updated);
}

fn advance_airborne(platform: &mut Platform, type_def: &PlatformTypeDefinition, dt: f64, now: DateTime<Utc>) {
    let Some(destination) = platform.navigation.destination else {
        coast(platform, dt, now);
        return;
    };

    let perf = &type_def.performance;
    let range = distance(platform.position, destination);
    if range <= AIRBORNE_CAPTURE_M {
        platform.position = destination;
        platform.navigation.destination = None;
        platform.speed = 0.0;
        platform.velocity = Velocity::zero();
        platform.last_updated = now.max(platform.last_updated);
        return;
    }

    let desired_heading = bearing(platform.position, destination);
    let heading = if perf.turning_radius > 0.0 && platform.speed > 0.0 {
        let max_turn_rate_deg = (platform.speed / perf.turning_radius).to_degrees();
        turn_toward(platform.heading, desired_heading, max_turn_rate_deg * dt)
    } else {
        normalize_heading(desired_heading)
    };

    let alt_error = destination.alt - platform.position.alt;
    let climb_rate = if perf.climb_rate > 0.0 { perf.climb_rate } else { DEFAULT_CLIMB_RATE };
    let (new_alt, vertical_speed) = if alt_error.abs() > ALTITUDE_DEADBAND_M {
        let delta = step_toward(0.0, alt_error, climb_rate * dt);
        (platform.position.alt + delta, delta / dt)
    } else {
        (platform.position.alt, 0.0)
    };

    let target_speed = perf.cruise_speed;
    let new_speed = if perf.acceleration > 0.0 {
        step_toward(platform.speed, target_speed, perf.acceleration * dt)
    } else {
        target_speed
    }
    .clamp(0.0, perf.max_speed.max(0.0));

    let mut new_position = advance_position(platform.position, heading, new_speed * dt);
    new_position.alt = new_alt;

    let heading_rad = heading.to_radians();
    let velocity = Velocity::new(new_speed * heading_rad.cos(), new_speed * heading_rad.sin(), vertical_speed);

    platform.apply_kinematics(new_position, velocity, heading, new_speed, platform.roll, now);
}

fn advance_maritime(platform: &mut Platform, type_def: &PlatformTypeDefinition, dt: f64, now: DateTime<Utc>) {
    let Some(destination) = platform.navigation.destination else {
        coast(platform, dt, now);
        platform.position.alt = 0.0;
        return;
    };

    let perf = &type_def.performance;
    let range = distance(platform.position, destination);
    if range <= SURFACE_CAPTURE_M {
        let mut snapped = destination;
        snapped.alt = 0.0;
        platform.position = snapped;
        platform.navigation.destination = None;
        platform.speed = 0.0;
        platform.velocity = Velocity::zero();
        platform.last_updated = now.max(platform.last_updated);
        return;
    }

    let desired_heading = bearing(platform.position, destination);
    let turning_radius = if perf.turning_radius > 0.0 {
        perf.turning_radius
    } else {
        MARITIME_TURNING_RADIUS_FACTOR * type_def.physical.length
    };
    let heading = if turning_radius > 0.0 && platform.speed > 0.0 {
        let max_turn_rate_deg = (platform.speed / turning_radius).to_degrees();
        turn_toward(platform.heading, desired_heading, max_turn_rate_deg * dt)
    } else {
        normalize_heading(desired_heading)
    };

    let acceleration = if perf.acceleration > 0.0 { perf.acceleration } else { MARITIME_DEFAULT_ACCEL };
    let target_speed = perf.cruise_speed;
    let new_speed = step_toward(platform.speed, target_speed, acceleration * dt).clamp(0.0, perf.max_speed.max(0.0));

    let mut new_position = advance_position(platform.position, heading, new_speed * dt);
    new_position.alt = 0.0;

    let heading_rad = heading.to_radians();
    let velocity = Velocity::new(new_speed * heading_rad.cos(), new_speed * heading_rad.sin(), 0.0);

    platform.apply_kinematics(new_position, velocity, heading, new_speed, platform.roll, now);
}

fn advance_land(platform: &mut Platform, type_def: &PlatformTypeDefinition, dt: f64, now: DateTime<Utc>) {
    let Some(destination) = platform.navigation.destination else {
        coast(platform, dt, now);
        return;
    };

    let perf = &type_def.performance;
    let range = distance(platform.position, destination);
    if range <= SURFACE_CAPTURE_M {
        platform.position = destination;
        platform.navigation.destination = None;
        platform.speed = 0.0;
        platform.velocity = Velocity::zero();
        platform.last_updated = now.max(platform.last_updated);
        return;
    }

    let desired_heading = bearing(platform.position, destination);
    let heading = if perf.turning_radius > 0.0 && platform.speed > 0.0 {
        let max_turn_rate_deg = (platform.speed / perf.turning_radius).to_degrees();
        turn_toward(platform.heading, desired_heading, max_turn_rate_deg * dt)
    } else {
        normalize_heading(desired_heading)
    };

    let alt_error = destination.alt - platform.position.alt;
    let horizontal_range = horizontal_distance(platform.position, destination);
    let gradient = (alt_error / horizontal_range.max(1e-6)).atan();
    let mut target_speed = perf.cruise_speed;
    if perf.max_gradient > 0.0 && gradient.abs() > perf.max_gradient {
        target_speed *= perf.max_gradient / gradient.abs();
    }

    let new_speed = if perf.acceleration > 0.0 {
        step_toward(platform.speed, target_speed, perf.acceleration * dt)
    } else {
        target_speed
    }
    .clamp(0.0, perf.max_speed.max(0.0));

    let new_position = advance_position(platform.position, heading, new_speed * dt);

    let heading_rad = heading.to_radians();
    let velocity = Velocity::new(new_speed * heading_rad.cos(), new_speed * heading_rad.sin(), 0.0);

    platform.apply_kinematics(new_position, velocity, heading, new_speed, platform.roll, now);
}

fn advance_space(platform: &mut Platform, type_def: &PlatformTypeDefinition, dt: f64, now: DateTime<Utc>) {
    let perf = &type_def.performance;
    if perf.orbital_period <= 0.0 {
        coast(platform, dt, now);
        return;
    }

    let omega_deg_per_s = 360.0 / perf.orbital_period;
    let new_lon = traffic_types::wrap_longitude(platform.position.lon + omega_deg_per_s * dt);
    let max_lat = perf.inclination;
    let new_lat = (max_lat
        * (2.0 * std::f64::consts::PI * platform.runtime.mission_time / perf.orbital_period).sin())
    .clamp(-90.0, 90.0);

    let position = traffic_types::Position::new(new_lat, new_lon, perf.orbital_altitude);
    let heading = 90.0_f64;
    let speed = perf.orbital_velocity;
    let heading_rad = heading.to_radians();
    let velocity = Velocity::new(speed * heading_rad.cos(), speed * heading_rad.sin(), 0.0);

    platform.apply_kinematics(position, velocity, heading, speed, platform.roll, now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use traffic_types::{Navigation, Position};

    fn make_platform(variant: PlatformVariant, type_def: PlatformTypeDefinition, position: Position) -> Platform {
        Platform::new(
            "P1".into(),
            "P1".into(),
            "P1".into(),
            Arc::new(type_def),
            variant,
            position,
            Utc::now(),
        )
    }

    #[test]
    fn airborne_without_destination_coasts_on_existing_velocity() {
        let mut p = make_platform(PlatformVariant::Airborne, PlatformTypeDefinition::default(), Position::new(0.0, 0.0, 1000.0));
        p.velocity = Velocity::new(100.0, 0.0, 0.0);
        p.speed = 100.0;
        let before = p.position;
        advance(&mut p, 10.0, Utc::now()).unwrap();
        assert!(p.position.lat > before.lat);
    }

    #[test]
    fn airborne_captures_destination_within_threshold() {
        let mut type_def = PlatformTypeDefinition::default();
        type_def.performance.cruise_speed = 230.0;
        type_def.performance.max_speed = 250.0;
        let dest = Position::new(0.0005, 0.0, 1000.0);
        let mut p = make_platform(PlatformVariant::Airborne, type_def, Position::new(0.0, 0.0, 1000.0));
        p.navigation = Navigation { destination: Some(dest), waypoints: vec![] };
        advance(&mut p, 1.0, Utc::now()).unwrap();
        assert!(p.navigation.destination.is_none());
        assert_eq!(p.speed, 0.0);
    }

    #[test]
    fn maritime_altitude_stays_locked_while_underway() {
        let mut type_def = PlatformTypeDefinition::default();
        type_def.performance.cruise_speed = 12.0;
        type_def.performance.max_speed = 15.0;
        let mut p = make_platform(PlatformVariant::Maritime, type_def, Position::new(36.8, -76.3, 0.0));
        p.navigation = Navigation { destination: Some(Position::new(36.9, -76.2, 0.0)), waypoints: vec![] };
        for _ in 0..10 {
            advance(&mut p, 1.0, Utc::now()).unwrap();
        }
        assert_eq!(p.position.alt, 0.0);
    }

    #[test]
    fn orbital_altitude_and_speed_are_pinned() {
        let mut type_def = PlatformTypeDefinition::default();
        type_def.performance.orbital_period = 5760.0;
        type_def.performance.orbital_velocity = 7590.0;
        type_def.performance.orbital_altitude = 550_000.0;
        type_def.performance.inclination = 53.0;
        let mut p = make_platform(PlatformVariant::Space, type_def, Position::new(0.0, 0.0, 550_000.0));
        advance(&mut p, 2_880.0, Utc::now()).unwrap();
        assert!((p.position.alt - 550_000.0).abs() < 1.0);
        assert_eq!(p.speed, 7590.0);
        assert_eq!(p.heading, 90.0);
    }

    #[test]
    fn land_gradient_scales_target_speed_on_steep_climb() {
        let mut type_def = PlatformTypeDefinition::default();
        type_def.performance.cruise_speed = 15.0;
        type_def.performance.max_speed = 22.0;
        type_def.performance.acceleration = 1.0;
        type_def.performance.max_gradient = 0.05;
        // A short horizontal hop with a large altitude gain forces a steep
        // gradient, which should throttle the target speed below cruise.
        let dest = Position::new(0.0005, 0.0, 200.0);
        let mut p = make_platform(PlatformVariant::Land, type_def, Position::new(0.0, 0.0, 0.0));
        p.navigation = Navigation { destination: Some(dest), waypoints: vec![] };
        p.speed = 15.0;
        advance(&mut p, 1.0, Utc::now()).unwrap();
        assert!(p.speed < 15.0, "gradient-limited speed should drop below cruise, got {}", p.speed);
    }

    #[test]
    fn land_captures_destination_within_threshold() {
        let mut type_def = PlatformTypeDefinition::default();
        type_def.performance.cruise_speed = 15.0;
        type_def.performance.max_speed = 22.0;
        let dest = Position::new(0.00005, 0.0, 0.0);
        let mut p = make_platform(PlatformVariant::Land, type_def, Position::new(0.0, 0.0, 0.0));
        p.navigation = Navigation { destination: Some(dest), waypoints: vec![] };
        advance(&mut p, 1.0, Utc::now()).unwrap();
        assert!(p.navigation.destination.is_none());
        assert_eq!(p.speed, 0.0);
    }

    #[test]
    fn zero_dt_leaves_kinematics_unchanged() {
        let mut type_def = PlatformTypeDefinition::default();
        type_def.performance.cruise_speed = 100.0;
        let mut p = make_platform(PlatformVariant::Airborne, type_def, Position::new(10.0, 10.0, 1000.0));
        p.speed = 50.0;
        let before_pos = p.position;
        let before_speed = p.speed;
        advance(&mut p, 0.0, Utc::now()).unwrap();
        assert_eq!(p.position, before_pos);
        assert_eq!(p.speed, before_speed);
    }
}
