//! End-to-end scenario coverage: the literal I/O examples from the testable
//! properties section, run directly against the behaviour layer rather than
//! through the engine's wall-clock tick loop (deterministic `Δt` steps).

use std::sync::Arc;

use chrono::Utc;
use traffic_sim::{behaviour, geodesy};
use traffic_types::{Platform, PlatformTypeDefinition, PlatformVariant, Position};

fn boeing_737_800() -> PlatformTypeDefinition {
    let mut td = PlatformTypeDefinition {
        class: "Boeing 737-800".into(),
        category: "commercial_aircraft".into(),
        ..Default::default()
    };
    td.performance.cruise_speed = 230.0;
    td.performance.max_speed = 257.0;
    td.performance.acceleration = 1.5;
    td.performance.turning_radius = 3000.0;
    td.performance.climb_rate = 12.0;
    td.performance.max_altitude = 12500.0;
    td
}

#[test]
fn scenario_1_boeing_737_800_nyc_to_mia() {
    let type_def = Arc::new(boeing_737_800());
    let origin = Position::new(40.7128, -74.0060, 10000.0);
    let destination = Position::new(25.7617, -80.1918, 10000.0);

    let mut platform = Platform::new(
        "AA1234".into(),
        "AA1234".into(),
        "AAL1".into(),
        type_def,
        PlatformVariant::Airborne,
        origin,
        Utc::now(),
    );
    platform.heading = 0.0;
    platform.set_destination(Some(destination)).unwrap();

    for _ in 0..10 {
        behaviour::advance(&mut platform, 1.0, Utc::now()).unwrap();
    }

    assert!(platform.position.lon < origin.lon, "longitude should move westward");
    assert_eq!(platform.position.alt, 10000.0);

    let bearing_to_dest = geodesy::bearing(platform.position, destination);
    let heading_error = (bearing_to_dest - platform.heading + 540.0) % 360.0 - 180.0;
    assert!(heading_error.abs() <= 5.0, "heading error {heading_error} exceeds 5 degrees");
}

#[test]
fn scenario_2_arleigh_burke_destroyer_at_port() {
    let mut type_def = PlatformTypeDefinition {
        class: "Arleigh Burke".into(),
        category: "military".into(),
        ..Default::default()
    };
    type_def.physical.length = 155.0;

    // Altitude erroneously non-zero on input; construction must zero it (I2).
    let mut platform = Platform::new(
        "DDG51".into(),
        "DDG51".into(),
        "DDG51".into(),
        Arc::new(type_def),
        PlatformVariant::Maritime,
        Position::new(36.8485, -76.2951, 17.0),
        Utc::now(),
    );
    assert_eq!(platform.position.alt, 0.0);

    for _ in 0..10 {
        behaviour::advance(&mut platform, 1.0, Utc::now()).unwrap();
    }

    assert_eq!(platform.position.alt, 0.0);
    assert_eq!(platform.speed, 0.0);
}

#[test]
fn scenario_3_starlink_satellite_half_orbit() {
    let mut type_def = PlatformTypeDefinition {
        class: "Starlink".into(),
        category: "satellite".into(),
        ..Default::default()
    };
    type_def.performance.orbital_period = 5760.0;
    type_def.performance.orbital_velocity = 7590.0;
    type_def.performance.orbital_altitude = 550_000.0;
    type_def.performance.inclination = 53.0;

    let mut platform = Platform::new(
        "STARLINK1".into(),
        "STARLINK1".into(),
        "STARLINK1".into(),
        Arc::new(type_def),
        PlatformVariant::Space,
        Position::new(0.0, 0.0, 550_000.0),
        Utc::now(),
    );

    behaviour::advance(&mut platform, 2_880.0, Utc::now()).unwrap();

    let lon_advance = (platform.position.lon - 0.0 + 360.0) % 360.0;
    assert!((lon_advance - 180.0).abs() <= 0.5, "got {lon_advance}");
    assert!((platform.position.alt - 550_000.0).abs() < 1.0);
    assert_eq!(platform.speed, 7590.0);
    assert_eq!(platform.heading, 90.0);
}

#[tokio::test]
async fn scenario_6_reset_converges_to_post_load_snapshot() {
    let clock = Arc::new(traffic_sim::clock::FixedClock::at(Utc::now()));
    let engine = traffic_sim::Engine::new(clock, std::time::Duration::from_millis(10));

    let mut platform_types = std::collections::HashMap::new();
    platform_types.insert("b738".to_string(), boeing_737_800());

    let doc = traffic_sim::ScenarioDocument {
        platform_types,
        platforms: vec![traffic_sim::scenario::PlatformInstanceSpec {
            id: "AA1234".into(),
            type_name: "b738".into(),
            variant: PlatformVariant::Airborne,
            name: None,
            position: Position::new(40.7128, -74.0060, 10000.0),
            destination: Some(Position::new(25.7617, -80.1918, 10000.0)),
        }],
    };

    engine.load_scenario(doc).await;
    let post_load = engine.snapshot().await;

    engine.start().await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    engine.stop().await;

    engine.reset().await;
    let after_reset = engine.snapshot().await;

    assert_eq!(post_load.len(), after_reset.len());
    assert_eq!(post_load[0].position, after_reset[0].position);
    assert_eq!(post_load[0].heading, after_reset[0].heading);
}

#[test]
fn p1_speed_stays_within_bounds_across_many_ticks() {
    let type_def = Arc::new(boeing_737_800());
    let mut platform = Platform::new(
        "P1".into(),
        "P1".into(),
        "P1".into(),
        type_def,
        PlatformVariant::Airborne,
        Position::new(0.0, 0.0, 10000.0),
        Utc::now(),
    );
    platform.set_destination(Some(Position::new(10.0, 10.0, 10000.0))).unwrap();

    for _ in 0..200 {
        behaviour::advance(&mut platform, 1.0, Utc::now()).unwrap();
        assert!(platform.speed >= 0.0);
        assert!(platform.speed <= platform.max_speed());
    }
}

#[test]
fn p4_heading_always_normalised() {
    let type_def = Arc::new(boeing_737_800());
    let mut platform = Platform::new(
        "P1".into(),
        "P1".into(),
        "P1".into(),
        type_def,
        PlatformVariant::Airborne,
        Position::new(0.0, 0.0, 10000.0),
        Utc::now(),
    );
    platform.heading = 10.0;
    platform.set_destination(Some(Position::new(-10.0, -170.0, 10000.0))).unwrap();

    for _ in 0..50 {
        behaviour::advance(&mut platform, 1.0, Utc::now()).unwrap();
        assert!((0.0..360.0).contains(&platform.heading));
    }
}

#[test]
fn p8_geodesy_round_trip_within_one_metre() {
    let origin = Position::new(45.0, 10.0, 0.0);
    for heading in [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0] {
        let advanced = geodesy::advance_position(origin, heading, 10_000.0);
        let d = geodesy::distance(origin, advanced);
        assert!((d - 10_000.0).abs() < 1.0, "heading {heading}: got {d}");
    }
}

#[test]
fn zero_dt_is_a_no_op_except_timestamp() {
    let type_def = Arc::new(boeing_737_800());
    let mut platform = Platform::new(
        "P1".into(),
        "P1".into(),
        "P1".into(),
        type_def,
        PlatformVariant::Airborne,
        Position::new(0.0, 0.0, 10000.0),
        Utc::now(),
    );
    platform.speed = 100.0;
    let before_position = platform.position;
    let before_speed = platform.speed;
    let before_heading = platform.heading;

    behaviour::advance(&mut platform, 0.0, Utc::now()).unwrap();

    assert_eq!(platform.position, before_position);
    assert_eq!(platform.speed, before_speed);
    assert_eq!(platform.heading, before_heading);
}
