use rand::rngs::StdRng;
use rand::SeedableRng;
use shuttle_tracker::bus::MovementSimulator;
use shuttle_tracker::data::{default_buses, read_positions_from_file, PositionStore};
use shuttle_tracker::location::{CampusBounds, Coordinates};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "shuttle-tracker-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn clamp_leaves_inside_points_alone() {
    let bounds = CampusBounds::default();
    let inside = Coordinates::new(12.995, 80.233);
    assert_eq!(bounds.clamp(inside), inside);
    assert!(bounds.contains(&inside));
}

#[test]
fn clamp_moves_outside_points_to_nearest_edge() {
    let bounds = CampusBounds::default();

    let north_east = bounds.clamp(Coordinates::new(14.0, 81.0));
    assert_eq!(north_east, Coordinates::new(bounds.north, bounds.east));

    let south_west = bounds.clamp(Coordinates::new(12.0, 79.0));
    assert_eq!(south_west, Coordinates::new(bounds.south, bounds.west));

    // Only the offending axis moves
    let west_only = bounds.clamp(Coordinates::new(12.995, 80.0));
    assert_eq!(west_only, Coordinates::new(12.995, bounds.west));
}

#[test]
fn inverted_bounds_are_rejected() {
    assert!(CampusBounds::try_new(12.0, 13.0, 81.0, 80.0).is_err());
    assert!(CampusBounds::try_new(13.0, 12.0, 80.0, 81.0).is_err());
    assert!(CampusBounds::try_new(13.0, 12.0, 81.0, 80.0).is_ok());
}

#[test]
fn step_moves_every_bus_and_keeps_identifiers() {
    let dir = unique_temp_dir("step-all");
    let mut store = PositionStore::load(dir.join("bus_coordinates.csv")).unwrap();
    let before = store.buses().clone();
    let mut rng = StdRng::seed_from_u64(7);

    MovementSimulator::default().step(&mut store, &mut rng).unwrap();

    assert_eq!(
        store.buses().keys().collect::<Vec<_>>(),
        before.keys().collect::<Vec<_>>()
    );
    for (bus, coords) in store.buses() {
        assert_ne!(*coords, before[bus], "{bus} did not move");
        assert!((coords.lat - before[bus].lat).abs() <= 0.000005 + 1e-12);
        assert!((coords.lng - before[bus].lng).abs() <= 0.000005 + 1e-12);
    }
}

#[test]
fn step_persists_the_whole_store() {
    let dir = unique_temp_dir("step-persist");
    let path = dir.join("bus_coordinates.csv");
    let mut store = PositionStore::load(&path).unwrap();
    let mut rng = StdRng::seed_from_u64(11);

    MovementSimulator::default().step(&mut store, &mut rng).unwrap();

    let on_disk = read_positions_from_file(&path).unwrap().unwrap();
    assert_eq!(&on_disk, store.buses());
}

#[test]
fn buses_never_leave_the_campus() {
    let bounds = CampusBounds::default();
    // A step far larger than the campus forces clamping on nearly every move
    let simulator = MovementSimulator::try_new(bounds, 0.05).unwrap();
    let mut buses = default_buses();
    buses.insert(
        "Corner".to_string(),
        Coordinates::new(bounds.north, bounds.east),
    );
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..1_000 {
        simulator.move_buses(&mut buses, &mut rng);
        for (bus, coords) in &buses {
            assert!(bounds.contains(coords), "{bus} escaped to {coords}");
        }
    }
    assert_eq!(buses.len(), 4);
}

#[test]
fn zero_step_keeps_buses_still() {
    let simulator = MovementSimulator::try_new(CampusBounds::default(), 0.0).unwrap();
    let mut buses = default_buses();
    let mut rng = StdRng::seed_from_u64(1);
    simulator.move_buses(&mut buses, &mut rng);
    assert_eq!(buses, default_buses());
}

#[test]
fn negative_step_is_rejected() {
    assert!(MovementSimulator::try_new(CampusBounds::default(), -0.1).is_err());
    assert!(MovementSimulator::try_new(CampusBounds::default(), f64::NAN).is_err());
}

#[test]
fn step_too_wide_to_sample_is_rejected() {
    assert!(MovementSimulator::try_new(CampusBounds::default(), 1e308).is_err());
    assert!(MovementSimulator::try_new(CampusBounds::default(), f64::MAX).is_err());
    assert!(MovementSimulator::try_new(CampusBounds::default(), 1.0).is_ok());
}
