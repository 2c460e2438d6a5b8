/// Integration tests for region CRUD through the tracker context.
/// Covers corner ordering, name uniqueness and the half-open box edges.

use tempfile::TempDir;
use vetrack::tracker::{
    AgentLocation, Position, RequestError, TradeCatalog, Tracker, TrackerStoreBuilder, WorldId,
};

fn setup_tracker() -> (Tracker, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = TrackerStoreBuilder::new(temp_dir.path())
        .without_flush()
        .open()
        .unwrap();
    (Tracker::new(store, TradeCatalog::vanilla()), temp_dir)
}

fn at(world: &str, x: f64, y: f64, z: f64) -> AgentLocation {
    AgentLocation::new(world, Position::new(x, y, z))
}

#[test]
fn corners_are_normalized_in_either_order() {
    let (tracker, _temp) = setup_tracker();
    let id = tracker
        .create_region("library", &at("world", 12.5, 80.0, -4.0), &at("world", -3.0, 60.0, 9.0))
        .unwrap();
    let region = tracker.get_region(id).unwrap();
    assert!(region.min.x <= region.max.x);
    assert!(region.min.y <= region.max.y);
    assert!(region.min.z <= region.max.z);
    assert_eq!(region.min, Position::new(-3.0, 60.0, -4.0));
    assert_eq!(region.max, Position::new(12.5, 80.0, 9.0));
    assert_eq!(region.world, WorldId::from("world"));
}

#[test]
fn duplicate_region_name_is_rejected() {
    let (tracker, _temp) = setup_tracker();
    tracker
        .create_region("farm", &at("world", 0.0, 0.0, 0.0), &at("world", 5.0, 5.0, 5.0))
        .unwrap();
    let err = tracker
        .create_region("farm", &at("world", 50.0, 0.0, 50.0), &at("world", 60.0, 5.0, 60.0))
        .unwrap_err();
    assert_eq!(err, RequestError::DuplicateName("farm".to_string()));
    assert_eq!(tracker.list_regions().len(), 1);
}

#[test]
fn empty_name_and_mixed_worlds_are_rejected() {
    let (tracker, _temp) = setup_tracker();
    assert!(matches!(
        tracker.create_region("  ", &at("world", 0.0, 0.0, 0.0), &at("world", 1.0, 1.0, 1.0)),
        Err(RequestError::InvalidRegion(_))
    ));
    assert_eq!(
        tracker.create_region("x", &at("world", 0.0, 0.0, 0.0), &at("world_nether", 1.0, 1.0, 1.0)),
        Err(RequestError::WorldMismatch)
    );
    assert!(tracker.list_regions().is_empty());
}

#[test]
fn rename_to_taken_name_keeps_both_names() {
    let (tracker, _temp) = setup_tracker();
    let a = tracker
        .create_region("north", &at("world", 0.0, 0.0, 0.0), &at("world", 5.0, 5.0, 5.0))
        .unwrap();
    let b = tracker
        .create_region("south", &at("world", 0.0, 0.0, 20.0), &at("world", 5.0, 5.0, 25.0))
        .unwrap();

    let err = tracker.update_region_name(b, "north").unwrap_err();
    assert_eq!(err, RequestError::DuplicateName("north".to_string()));
    assert_eq!(tracker.get_region(a).unwrap().name, "north");
    assert_eq!(tracker.get_region(b).unwrap().name, "south");
    assert_eq!(tracker.get_region_by_name("north").unwrap().id, a);
    assert_eq!(tracker.get_region_by_name("south").unwrap().id, b);
}

#[test]
fn rename_moves_the_name_index() {
    let (tracker, _temp) = setup_tracker();
    let id = tracker
        .create_region("old", &at("world", 0.0, 0.0, 0.0), &at("world", 5.0, 5.0, 5.0))
        .unwrap();
    assert_eq!(tracker.update_region_name(id, "new"), Ok(true));
    assert!(tracker.get_region_by_name("old").is_none());
    assert_eq!(tracker.get_region_by_name("new").unwrap().id, id);
    // the old name is free again
    tracker
        .create_region("old", &at("world", 9.0, 0.0, 0.0), &at("world", 12.0, 5.0, 5.0))
        .unwrap();
    assert_eq!(tracker.update_region_name(9999, "ghost"), Ok(false));
}

#[test]
fn name_lookup_is_case_sensitive() {
    let (tracker, _temp) = setup_tracker();
    tracker
        .create_region("Market", &at("world", 0.0, 0.0, 0.0), &at("world", 5.0, 5.0, 5.0))
        .unwrap();
    assert!(tracker.get_region_by_name("Market").is_some());
    assert!(tracker.get_region_by_name("market").is_none());
}

#[test]
fn delete_missing_region_returns_false() {
    let (tracker, _temp) = setup_tracker();
    let id = tracker
        .create_region("tmp", &at("world", 0.0, 0.0, 0.0), &at("world", 1.0, 1.0, 1.0))
        .unwrap();
    assert!(tracker.delete_region(id));
    assert!(!tracker.delete_region(id));
    assert!(tracker.get_region(id).is_none());
}

#[test]
fn resolve_region_honours_box_edges() {
    let (tracker, _temp) = setup_tracker();
    tracker
        .create_region("box", &at("world", 0.0, 0.0, 0.0), &at("world", 9.0, 9.0, 9.0))
        .unwrap();
    let world = WorldId::from("world");
    let region = tracker.get_region_by_name("box").unwrap();
    let upper = region.upper_bound();

    assert!(tracker.resolve_region(&world, &region.min).is_some());
    assert!(tracker.resolve_region(&world, &Position::new(9.5, 9.5, 9.5)).is_some());
    assert!(tracker
        .resolve_region(&world, &Position::new(upper.x, 1.0, 1.0))
        .is_none());
    assert!(tracker
        .resolve_region(&world, &Position::new(1.0, upper.y, 1.0))
        .is_none());
    assert!(tracker
        .resolve_region(&world, &Position::new(1.0, 1.0, upper.z))
        .is_none());
    assert!(tracker
        .resolve_region(&WorldId::from("world_nether"), &Position::new(1.0, 1.0, 1.0))
        .is_none());
}

#[test]
fn overlapping_regions_pick_first_created() {
    let (tracker, _temp) = setup_tracker();
    tracker
        .create_region("first", &at("world", 0.0, 0.0, 0.0), &at("world", 10.0, 10.0, 10.0))
        .unwrap();
    tracker
        .create_region("second", &at("world", 5.0, 5.0, 5.0), &at("world", 15.0, 15.0, 15.0))
        .unwrap();
    let world = WorldId::from("world");
    let hit = tracker.resolve_region(&world, &Position::new(7.0, 7.0, 7.0)).unwrap();
    assert_eq!(hit.name, "first");
    let hit = tracker.resolve_region(&world, &Position::new(12.0, 12.0, 12.0)).unwrap();
    assert_eq!(hit.name, "second");
}
