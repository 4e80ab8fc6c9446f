// src/validation.rs
//! Проверка готовой карты
//!
//! Валидатор — единственное место, где частичные результаты этапов
//! получают степень серьёзности: ошибки делают карту непригодной и
//! запускают повторную генерацию, предупреждения только записываются.
//! Статистика собирается всегда, независимо от исхода.

use crate::config::{LocationRule, MapConfig};
use crate::grid::WorldGrid;
use crate::hex::{self, AxialCoord};
use crate::locations::strategic::WaterAccess;
use crate::locations::{Location, LocationKind};
use crate::rivers::River;
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: BTreeMap<String, Value>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: BTreeMap::new(),
        }
    }
}

impl ValidationResult {
    /// Любая ошибка необратимо делает результат невалидным
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn stat(&mut self, key: &str, value: Value) {
        self.stats.insert(key.to_string(), value);
    }
}

pub struct MapValidator<'a> {
    config: &'a MapConfig,
}

impl<'a> MapValidator<'a> {
    #[must_use]
    pub const fn new(config: &'a MapConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn validate(&self, grid: &WorldGrid, rivers: &[River], locations: &[Location]) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.check_terrain(grid, &mut result);
        self.check_rivers(grid, rivers, &mut result);
        self.check_location_counts(locations, &mut result);
        self.check_location_constraints(grid, locations, &mut result);
        self.check_connectivity(grid, locations, &mut result);

        tracing::debug!(
            valid = result.valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "карта проверена"
        );
        result
    }

    fn check_terrain(&self, grid: &WorldGrid, result: &mut ValidationResult) {
        let settings = &self.config.validation;
        let classes = &self.config.terrain.classes;
        let total = grid.len();

        result.stat("width", json!(grid.width));
        result.stat("height", json!(grid.height));
        result.stat("total_cells", json!(total));
        result.stat("terrain_distribution", json!(grid.terrain_statistics()));
        result.stat("average_elevation", json!(grid.average_elevation()));
        result.stat("average_moisture", json!(grid.average_moisture()));

        if total == 0 {
            result.add_error("grid: map has no cells");
            return;
        }

        let ratio = |count: usize| count as f32 / total as f32;
        let water_ratio = ratio(grid.cells().filter(|c| classes.is_water(&c.terrain_type)).count());
        let high_ratio = ratio(
            grid.cells()
                .filter(|c| c.elevation >= settings.high_ground_elevation)
                .count(),
        );
        let open_ratio = ratio(grid.cells().filter(|c| classes.is_open_land(&c.terrain_type)).count());
        result.stat("water_ratio", json!(water_ratio));

        if water_ratio < settings.water_ratio_min || water_ratio > settings.water_ratio_max {
            result.add_warning(format!(
                "terrain: water covers {:.1}% of the map, expected {:.0}%..{:.0}%",
                water_ratio * 100.0,
                settings.water_ratio_min * 100.0,
                settings.water_ratio_max * 100.0
            ));
        }
        if high_ratio < settings.min_high_ground_ratio {
            result.add_warning(format!(
                "terrain: high ground covers only {:.1}% of the map",
                high_ratio * 100.0
            ));
        }
        if open_ratio < settings.min_open_land_ratio {
            result.add_warning(format!(
                "terrain: open land covers only {:.1}% of the map",
                open_ratio * 100.0
            ));
        }
    }

    fn check_rivers(&self, grid: &WorldGrid, rivers: &[River], result: &mut ValidationResult) {
        let settings = &self.config.rivers;
        let tolerance = self.config.validation.flow_tolerance;

        let lengths: Vec<usize> = rivers.iter().map(|r| r.length).collect();
        let average = if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().sum::<usize>() as f32 / lengths.len() as f32
        };
        result.stat("river_count", json!(rivers.len()));
        result.stat("river_lengths", json!(lengths));
        result.stat("average_river_length", json!(average));

        if rivers.len() < settings.min_rivers as usize {
            result.add_error(format!(
                "rivers: generated {} rivers, below minimum of {}",
                rivers.len(),
                settings.min_rivers
            ));
        }

        for river in rivers {
            let missing: Vec<AxialCoord> = river
                .path
                .iter()
                .copied()
                .filter(|&c| !grid.is_valid(c))
                .collect();
            for coord in &missing {
                result.add_error(format!(
                    "river {}: path coordinate {coord} is outside the grid",
                    river.id
                ));
            }

            if river.path.len() < settings.min_river_length {
                result.add_warning(format!(
                    "river {}: length {} is below minimum of {}",
                    river.id,
                    river.path.len(),
                    settings.min_river_length
                ));
            }
            if !river.reaches_water {
                result.add_warning(format!("river {}: does not reach water", river.id));
            }

            for pair in river.path.windows(2) {
                let (Some(a), Some(b)) = (grid.get_cell(pair[0]), grid.get_cell(pair[1])) else {
                    continue;
                };
                let rise = b.elevation - a.elevation;
                if rise > tolerance {
                    result.add_warning(format!(
                        "river {}: flows uphill from {} to {} (rise {rise:.2})",
                        river.id, pair[0], pair[1]
                    ));
                    break;
                }
            }
        }
    }

    fn check_location_counts(&self, locations: &[Location], result: &mut ValidationResult) {
        let mut counts: BTreeMap<LocationKind, u32> = BTreeMap::new();
        for location in locations {
            *counts.entry(location.kind).or_insert(0) += 1;
        }

        for (&kind, rule) in &self.config.locations {
            let placed = counts.get(&kind).copied().unwrap_or(0);
            if placed < rule.min_count {
                result.add_error(format!(
                    "{kind}: placed {placed} locations, below minimum of {}",
                    rule.min_count
                ));
            } else if placed > rule.max_count {
                result.add_warning(format!(
                    "{kind}: placed {placed} locations, above maximum of {}",
                    rule.max_count
                ));
            }
        }

        let by_name: BTreeMap<&str, u32> = counts.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        result.stat("location_counts", json!(by_name));
        result.stat("total_locations", json!(locations.len()));
    }

    fn check_location_constraints(&self, grid: &WorldGrid, locations: &[Location], result: &mut ValidationResult) {
        let classes = &self.config.terrain.classes;

        for (i, location) in locations.iter().enumerate() {
            let label = format!("{} '{}'", location.kind, location.name);
            let Some(cell) = grid.get_cell(location.coords) else {
                result.add_error(format!(
                    "{label}: coordinates {} are outside the grid",
                    location.coords
                ));
                continue;
            };
            let Some(rule) = self.config.location_rule(location.kind) else {
                continue;
            };

            if !rule.terrain.is_empty() && !rule.terrain.contains(&cell.terrain_type) {
                result.add_error(format!(
                    "{label}: placed on {} which is not allowed",
                    cell.terrain_type
                ));
            }
            if cell.elevation < rule.elevation_min || cell.elevation > rule.elevation_max {
                result.add_warning(format!(
                    "{label}: elevation {:.2} outside {:.2}..{:.2}",
                    cell.elevation, rule.elevation_min, rule.elevation_max
                ));
            }
            if !WaterAccess::of(grid, location.coords, classes).satisfies(rule.water) {
                result.add_error(format!("{label}: missing required water access"));
            }

            for other in &locations[i + 1..] {
                if too_close(location, other, rule) {
                    result.add_warning(format!(
                        "{label}: only {} hexes from {} '{}'",
                        location.coords.distance(other.coords),
                        other.kind,
                        other.name
                    ));
                }
            }
        }
    }

    /// Грубая связность: два города связаны, если прямая гекс-линия между
    /// ними проходит только по проходимым клеткам
    fn check_connectivity(&self, grid: &WorldGrid, locations: &[Location], result: &mut ValidationResult) {
        let classes = &self.config.terrain.classes;
        let towns: Vec<&Location> = locations
            .iter()
            .filter(|l| l.kind == LocationKind::Town && grid.is_valid(l.coords))
            .collect();

        let mut graph: UnGraph<usize, ()> = UnGraph::new_undirected();
        let nodes: Vec<NodeIndex> = (0..towns.len()).map(|i| graph.add_node(i)).collect();

        for i in 0..towns.len() {
            for j in i + 1..towns.len() {
                let path = hex::line(towns[i].coords, towns[j].coords);
                let inner = &path[1..path.len().saturating_sub(1).max(1)];
                let open = inner.iter().all(|&c| {
                    grid.get_cell(c)
                        .is_some_and(|cell| classes.is_passable(&cell.terrain_type))
                });
                if open {
                    graph.add_edge(nodes[i], nodes[j], ());
                }
            }
        }

        if towns.len() >= 2 {
            for (town, &node) in towns.iter().zip(&nodes) {
                if graph.neighbors(node).next().is_none() {
                    result.add_warning(format!(
                        "town '{}' at {} may be isolated from other towns",
                        town.name, town.coords
                    ));
                }
            }
        }
        result.stat("settlement_components", json!(connected_components(&graph)));
    }
}

fn too_close(a: &Location, b: &Location, rule: &LocationRule) -> bool {
    a.kind == b.kind && a.coords.distance(b.coords) < rule.min_distance_same_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RiverSettings, WaterRequirement};
    use crate::hex::OffsetCoord;

    fn flat_grid(width: u32, height: u32) -> WorldGrid {
        let mut grid = WorldGrid::new(width, height, 10.0, "plains");
        for cell in grid.cells_mut() {
            cell.elevation = 0.4;
            cell.moisture = 0.5;
        }
        grid
    }

    fn quiet_config() -> MapConfig {
        let mut config = MapConfig::default();
        config.rivers = RiverSettings {
            min_rivers: 0,
            max_rivers: 0,
            ..RiverSettings::default()
        };
        config.locations.clear();
        config
    }

    fn town(name: &str, col: i32, row: i32) -> Location {
        Location {
            kind: LocationKind::Town,
            name: name.to_string(),
            coords: OffsetCoord::new(col, row).to_axial(),
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn errors_flip_validity_for_good() {
        let mut result = ValidationResult::default();
        assert!(result.valid);
        result.add_warning("w");
        assert!(result.valid);
        result.add_error("e");
        result.add_warning("w2");
        assert!(!result.valid);
    }

    #[test]
    fn missing_towns_yield_single_minimum_error() {
        let mut config = quiet_config();
        config.locations.insert(
            LocationKind::Town,
            LocationRule {
                terrain: vec!["swamp".into()],
                min_count: 5,
                max_count: 5,
                ..LocationRule::default()
            },
        );
        let grid = flat_grid(4, 4);
        let result = MapValidator::new(&config).validate(&grid, &[], &[]);

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        assert!(result.errors[0].contains("town"));
        assert!(result.errors[0].contains("minimum"));
    }

    #[test]
    fn uphill_river_is_flagged() {
        let config = quiet_config();
        let mut grid = flat_grid(4, 4);
        let a = OffsetCoord::new(1, 1).to_axial();
        let b = a + hex::DIRECTIONS[0];
        grid.get_cell_mut(a).expect("cell").elevation = 0.5;
        grid.get_cell_mut(b).expect("cell").elevation = 0.7;
        let river = River {
            id: 0,
            source: a,
            path: vec![a, b],
            length: 2,
            reaches_water: false,
            merged_with: Default::default(),
        };

        let result = MapValidator::new(&config).validate(&grid, &[river], &[]);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.contains("uphill")), "{:?}", result.warnings);
    }

    #[test]
    fn river_outside_grid_is_an_error() {
        let config = quiet_config();
        let grid = flat_grid(4, 4);
        let inside = OffsetCoord::new(3, 3).to_axial();
        let outside = OffsetCoord::new(4, 3).to_axial();
        let river = River {
            id: 7,
            source: inside,
            path: vec![inside, outside],
            length: 2,
            reaches_water: false,
            merged_with: Default::default(),
        };

        let result = MapValidator::new(&config).validate(&grid, &[river], &[]);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("river 7") && e.contains("outside")));
    }

    #[test]
    fn location_on_wrong_terrain_is_an_error() {
        let mut config = quiet_config();
        config.locations.insert(
            LocationKind::Town,
            LocationRule {
                terrain: vec!["grassland".into()],
                ..LocationRule::default()
            },
        );
        let grid = flat_grid(5, 5);
        let result = MapValidator::new(&config).validate(&grid, &[], &[town("Dry Creek", 2, 2)]);
        assert!(result.errors.iter().any(|e| e.contains("not allowed")));
    }

    #[test]
    fn missing_water_access_is_an_error() {
        let mut config = quiet_config();
        config.locations.insert(
            LocationKind::Town,
            LocationRule {
                water: WaterRequirement::AdjacentWater,
                ..LocationRule::default()
            },
        );
        let grid = flat_grid(5, 5);
        let result = MapValidator::new(&config).validate(&grid, &[], &[town("Dry Creek", 2, 2)]);
        assert!(result.errors.iter().any(|e| e.contains("water access")));
    }

    #[test]
    fn towns_behind_water_are_isolated() {
        let config = quiet_config();
        let mut grid = flat_grid(7, 3);
        for row in 0..3 {
            let c = OffsetCoord::new(3, row).to_axial();
            grid.get_cell_mut(c).expect("cell").terrain_type = "deep_water".into();
        }
        let towns = [town("West", 0, 1), town("East", 6, 1)];

        let result = MapValidator::new(&config).validate(&grid, &[], &towns);
        assert_eq!(result.warnings.iter().filter(|w| w.contains("isolated")).count(), 2);
        assert_eq!(result.stats["settlement_components"], json!(2));
    }

    #[test]
    fn connected_towns_are_not_warned() {
        let config = quiet_config();
        let grid = flat_grid(7, 3);
        let towns = [town("West", 0, 1), town("East", 6, 1)];
        let result = MapValidator::new(&config).validate(&grid, &[], &towns);
        assert!(!result.warnings.iter().any(|w| w.contains("isolated")));
        assert_eq!(result.stats["settlement_components"], json!(1));
    }

    #[test]
    fn stats_are_attached_even_when_invalid() {
        let mut config = quiet_config();
        config.rivers.min_rivers = 2;
        config.rivers.max_rivers = 2;
        let grid = flat_grid(3, 3);
        let result = MapValidator::new(&config).validate(&grid, &[], &[]);
        assert!(!result.valid);
        assert_eq!(result.stats["total_cells"], json!(9));
        assert_eq!(result.stats["river_count"], json!(0));
    }
}
