use hexmapgen::config::{LocationRule, RiverSettings};
use hexmapgen::hex::{DIRECTIONS, OffsetCoord};
use hexmapgen::{
    DEFAULT_MAX_ATTEMPTS, LocationKind, MapConfig, MapGenerator, MapSnapshot, MapValidator, River, WorldGrid,
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn generated(config: MapConfig, seed: u64) -> MapGenerator {
    let mut generator = MapGenerator::new(config);
    generator.generate_complete_map(seed, DEFAULT_MAX_ATTEMPTS);
    generator
}

#[test]
fn default_small_map_is_accepted() {
    let config = MapConfig::with_size(10, 10);
    let mut generator = MapGenerator::new(config.clone());
    assert!(generator.generate_complete_map(42, 3));
    assert!(generator.attempts_used() <= 3);

    let stats = generator.grid().terrain_statistics();
    let classes = &config.terrain.classes;
    assert!(stats.keys().any(|t| classes.is_water(t)), "{stats:?}");
    assert!(stats.keys().any(|t| !classes.is_water(t)), "{stats:?}");

    assert!(generator.rivers().len() >= config.rivers.min_rivers as usize);
    let towns = generator
        .locations()
        .iter()
        .filter(|l| l.kind == LocationKind::Town)
        .count() as u32;
    let town_rule = config.location_rule(LocationKind::Town).expect("town rule");
    assert!(towns >= town_rule.min_count);
    assert!(generator.validate().valid);
}

#[test]
fn same_seed_same_map() {
    let first = generated(MapConfig::with_size(16, 12), 2024);
    let second = generated(MapConfig::with_size(16, 12), 2024);
    assert_eq!(first.snapshot(), second.snapshot());
    assert_eq!(first.attempts_used(), second.attempts_used());
}

#[test]
fn different_seeds_give_different_maps() {
    let first = generated(MapConfig::with_size(16, 12), 1);
    let second = generated(MapConfig::with_size(16, 12), 2);
    assert_ne!(first.snapshot().cells, second.snapshot().cells);
}

#[test]
fn unsatisfiable_towns_report_one_minimum_error() {
    let mut config = MapConfig::with_size(4, 4);
    config.rivers = RiverSettings {
        min_rivers: 0,
        max_rivers: 0,
        ..RiverSettings::default()
    };
    config.locations = BTreeMap::from([(
        LocationKind::Town,
        LocationRule {
            terrain: vec!["swamp".into()],
            min_count: 5,
            max_count: 5,
            ..LocationRule::default()
        },
    )]);

    let mut generator = MapGenerator::new(config);
    generator.generate_terrain(11);
    generator.generate_rivers(11);
    assert!(!generator.place_all_locations(11));
    assert!(generator.locations().len() < 5);

    let result = generator.validate();
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
    assert!(result.errors[0].contains("town"));
    assert!(result.errors[0].contains("minimum"));
}

#[test]
fn uphill_step_produces_flow_warning() {
    let mut config = MapConfig::with_size(5, 5);
    config.rivers.min_rivers = 0;
    config.locations.clear();

    let mut grid = WorldGrid::new(5, 5, 10.0, "plains");
    let a = OffsetCoord::new(2, 2).to_axial();
    let b = a + DIRECTIONS[5];
    grid.get_cell_mut(a).expect("cell").elevation = 0.4;
    grid.get_cell_mut(b).expect("cell").elevation = 0.6;
    let river = River {
        id: 3,
        source: a,
        path: vec![a, b],
        length: 2,
        reaches_water: false,
        merged_with: BTreeSet::new(),
    };

    let result = MapValidator::new(&config).validate(&grid, &[river], &[]);
    assert!(
        result.warnings.iter().any(|w| w.contains("river 3") && w.contains("uphill")),
        "{:?}",
        result.warnings
    );
}

#[test]
fn snapshot_round_trip_restores_derived_state() {
    let original = generated(MapConfig::with_size(14, 10), 77);
    let json = original.snapshot().to_json().expect("serialize");

    let mut restored = MapGenerator::new(MapConfig::with_size(14, 10));
    restored
        .load_snapshot(MapSnapshot::from_json(&json).expect("deserialize"))
        .expect("restore");

    assert_eq!(restored.seed(), original.seed());
    assert_eq!(restored.rivers(), original.rivers());
    assert_eq!(restored.locations(), original.locations());
    for (a, b) in original.grid().cells().zip(restored.grid().cells()) {
        assert_eq!(a, b);
    }
    assert_eq!(restored.validate().errors, original.validate().errors);
}

#[test]
fn snapshot_with_out_of_grid_references_is_flagged() {
    let original = generated(MapConfig::with_size(10, 8), 5);
    let mut snapshot = original.snapshot();
    let outside = OffsetCoord::new(25, 25).to_axial();
    snapshot.rivers.push(River {
        id: 99,
        source: outside,
        path: vec![outside, outside + DIRECTIONS[0]],
        length: 2,
        reaches_water: false,
        merged_with: BTreeSet::new(),
    });

    let mut generator = MapGenerator::new(MapConfig::with_size(10, 8));
    generator.load_snapshot(snapshot).expect("restore");
    let result = generator.validate();
    assert!(!result.valid);
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.contains("river 99") && e.contains("outside the grid")),
        "{:?}",
        result.errors
    );
}

#[test]
fn shrunk_snapshot_flags_locations_outside() {
    let original = generated(MapConfig::with_size(16, 12), 8);
    let mut snapshot = original.snapshot();
    snapshot.width = 2;
    snapshot.height = 2;
    let outside = snapshot
        .locations
        .iter()
        .filter(|l| {
            let o = l.coords.to_offset();
            o.col >= 2 || o.row >= 2
        })
        .count();

    let mut generator = MapGenerator::new(MapConfig::with_size(16, 12));
    generator.load_snapshot(snapshot).expect("restore");
    let result = generator.validate();
    let flagged = result
        .errors
        .iter()
        .filter(|e| e.contains("are outside the grid"))
        .count();
    assert_eq!(flagged, outside);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn placed_locations_respect_spacing(seed in 0u64..10_000) {
        let config = MapConfig::with_size(18, 14);
        let generator = generated(config.clone(), seed);
        let locations = generator.locations();

        for (i, later) in locations.iter().enumerate() {
            let rule = config.location_rule(later.kind).expect("rule");
            for earlier in &locations[..i] {
                let d = later.coords.distance(earlier.coords);
                prop_assert!(d >= rule.min_distance_any);
                if later.kind == earlier.kind {
                    prop_assert!(d >= rule.min_distance_same_type);
                }
            }
        }
    }

    #[test]
    fn accepted_rivers_never_climb(seed in 0u64..10_000) {
        let config = MapConfig::with_size(18, 14);
        let generator = generated(config.clone(), seed);
        let tolerance = config.validation.flow_tolerance;

        for river in generator.rivers() {
            prop_assert!(river.length >= config.rivers.min_river_length);
            for pair in river.path.windows(2) {
                let a = generator.grid().get_cell(pair[0]).expect("cell").elevation;
                let b = generator.grid().get_cell(pair[1]).expect("cell").elevation;
                prop_assert!(b <= a + tolerance);
            }
        }
    }
}
