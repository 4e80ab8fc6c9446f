// src/locations/strategic.rs
//! Географические предикаты для размещения: доступ к воде, стратегические
//! позиции (перевал, переправа, господствующая высота) и близость к маршрутам.

use crate::config::{PlacementHeuristics, TerrainClasses, WaterRequirement};
use crate::grid::WorldGrid;
use crate::hex::{AxialCoord, DIRECTIONS};

/// Что из воды есть в клетке и вокруг неё
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaterAccess {
    pub adjacent_water: bool,
    pub on_river: bool,
    pub adjacent_river: bool,
}

impl WaterAccess {
    #[must_use]
    pub fn of(grid: &WorldGrid, coord: AxialCoord, classes: &TerrainClasses) -> Self {
        let on_river = grid.get_cell(coord).is_some_and(|c| c.has_river);
        let mut access = Self {
            on_river,
            ..Self::default()
        };
        for neighbor in grid.neighbors(coord) {
            access.adjacent_water |= classes.is_water(&neighbor.terrain_type);
            access.adjacent_river |= neighbor.has_river;
        }
        access
    }

    #[must_use]
    pub const fn near_river(self) -> bool {
        self.on_river || self.adjacent_river
    }

    #[must_use]
    pub const fn satisfies(self, requirement: WaterRequirement) -> bool {
        match requirement {
            WaterRequirement::None => true,
            WaterRequirement::AdjacentWater => self.adjacent_water,
            WaterRequirement::AdjacentRiver => self.near_river(),
            WaterRequirement::OnRiver => self.on_river,
            WaterRequirement::AnyWater => self.adjacent_water || self.near_river(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategicFeatures {
    pub mountain_pass: bool,
    pub river_crossing: bool,
    pub commanding_view: bool,
}

impl StrategicFeatures {
    #[must_use]
    pub fn of(grid: &WorldGrid, coord: AxialCoord, heuristics: &PlacementHeuristics) -> Self {
        Self {
            mountain_pass: is_mountain_pass(grid, coord, heuristics),
            river_crossing: is_river_crossing(grid, coord, heuristics),
            commanding_view: has_commanding_view(grid, coord, heuristics),
        }
    }

    #[must_use]
    pub const fn any(self) -> bool {
        self.mountain_pass || self.river_crossing || self.commanding_view
    }

    #[must_use]
    pub fn count(self) -> u32 {
        u32::from(self.mountain_pass) + u32::from(self.river_crossing) + u32::from(self.commanding_view)
    }
}

/// Перевал: высокие соседи с двух противоположных сторон
#[must_use]
pub fn is_mountain_pass(grid: &WorldGrid, coord: AxialCoord, heuristics: &PlacementHeuristics) -> bool {
    let high = |d: AxialCoord| {
        grid.get_cell(coord + d)
            .is_some_and(|c| c.elevation >= heuristics.pass_elevation_min)
    };
    (0..3).any(|i| high(DIRECTIONS[i]) && high(DIRECTIONS[i + 3]))
}

/// Переправа: клетка на реке на возвышенном берегу
#[must_use]
pub fn is_river_crossing(grid: &WorldGrid, coord: AxialCoord, heuristics: &PlacementHeuristics) -> bool {
    grid.get_cell(coord)
        .is_some_and(|c| c.has_river && c.elevation >= heuristics.river_crossing_elevation_min)
}

/// Господствующая высота: клетка выше заданного числа соседей
#[must_use]
pub fn has_commanding_view(grid: &WorldGrid, coord: AxialCoord, heuristics: &PlacementHeuristics) -> bool {
    let Some(cell) = grid.get_cell(coord) else {
        return false;
    };
    let lower = grid
        .neighbors(coord)
        .filter(|n| n.elevation < cell.elevation)
        .count() as u32;
    lower >= heuristics.commanding_view_neighbors
}

/// Лежит ли клетка на пути между двумя городами с крюком не больше `detour_ratio`
#[must_use]
pub fn lies_between(coord: AxialCoord, a: AxialCoord, b: AxialCoord, detour_ratio: f32) -> bool {
    let direct = a.distance(b);
    if direct == 0 {
        return false;
    }
    let via = a.distance(coord) + coord.distance(b);
    via as f32 <= direct as f32 * (1.0 + detour_ratio)
}

/// Клетка вдоль маршрута: у реки или на дороге между любыми двумя городами
#[must_use]
pub fn is_along_route(
    grid: &WorldGrid,
    coord: AxialCoord,
    towns: &[AxialCoord],
    classes: &TerrainClasses,
    heuristics: &PlacementHeuristics,
) -> bool {
    if WaterAccess::of(grid, coord, classes).near_river() {
        return true;
    }
    towns.iter().enumerate().any(|(i, &a)| {
        towns[i + 1..]
            .iter()
            .any(|&b| lies_between(coord, a, b, heuristics.route_detour_ratio))
    })
}

/// Ближайшее расстояние до любой из точек
#[must_use]
pub fn nearest_distance(coord: AxialCoord, points: &[AxialCoord]) -> Option<u32> {
    points.iter().map(|&p| coord.distance(p)).min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::OffsetCoord;

    fn flat_grid(elevation: f32) -> WorldGrid {
        let mut grid = WorldGrid::new(5, 5, 10.0, "plains");
        for cell in grid.cells_mut() {
            cell.elevation = elevation;
        }
        grid
    }

    fn center() -> AxialCoord {
        OffsetCoord::new(2, 2).to_axial()
    }

    #[test]
    fn pass_needs_opposite_high_neighbors() {
        let heuristics = PlacementHeuristics::default();
        let mut grid = flat_grid(0.4);
        let c = center();
        grid.get_cell_mut(c + DIRECTIONS[1]).expect("cell").elevation = 0.8;
        assert!(!is_mountain_pass(&grid, c, &heuristics));
        grid.get_cell_mut(c + DIRECTIONS[4]).expect("cell").elevation = 0.8;
        assert!(is_mountain_pass(&grid, c, &heuristics));
    }

    #[test]
    fn commanding_view_counts_lower_neighbors() {
        let heuristics = PlacementHeuristics::default();
        let mut grid = flat_grid(0.4);
        let c = center();
        grid.get_cell_mut(c).expect("cell").elevation = 0.6;
        assert!(has_commanding_view(&grid, c, &heuristics));
        for d in &DIRECTIONS[..3] {
            grid.get_cell_mut(c + *d).expect("cell").elevation = 0.7;
        }
        // Ниже осталось только 3 соседа из 6
        assert!(!has_commanding_view(&grid, c, &heuristics));
    }

    #[test]
    fn river_crossing_requires_elevated_river_cell() {
        let heuristics = PlacementHeuristics::default();
        let mut grid = flat_grid(0.5);
        let c = center();
        assert!(!is_river_crossing(&grid, c, &heuristics));
        grid.get_cell_mut(c).expect("cell").has_river = true;
        assert!(is_river_crossing(&grid, c, &heuristics));
        grid.get_cell_mut(c).expect("cell").elevation = 0.3;
        assert!(!is_river_crossing(&grid, c, &heuristics));
    }

    #[test]
    fn water_requirements() {
        let classes = TerrainClasses::default();
        let mut grid = flat_grid(0.5);
        let c = center();
        let access = WaterAccess::of(&grid, c, &classes);
        assert!(access.satisfies(WaterRequirement::None));
        assert!(!access.satisfies(WaterRequirement::AnyWater));

        grid.get_cell_mut(c + DIRECTIONS[0]).expect("cell").terrain_type = "water".into();
        let access = WaterAccess::of(&grid, c, &classes);
        assert!(access.satisfies(WaterRequirement::AdjacentWater));
        assert!(!access.satisfies(WaterRequirement::AdjacentRiver));

        grid.get_cell_mut(c + DIRECTIONS[2]).expect("cell").has_river = true;
        let access = WaterAccess::of(&grid, c, &classes);
        assert!(access.satisfies(WaterRequirement::AdjacentRiver));
        assert!(!access.satisfies(WaterRequirement::OnRiver));
    }

    #[test]
    fn detour_threshold() {
        let a = AxialCoord::new(0, 0);
        let b = AxialCoord::new(10, 0);
        assert!(lies_between(AxialCoord::new(5, 0), a, b, 0.3));
        // Крюк 12 против прямых 10: в пределах 30%
        assert!(lies_between(AxialCoord::new(6, -2), a, b, 0.3));
        assert!(!lies_between(AxialCoord::new(5, -5), a, b, 0.3));
    }
}
