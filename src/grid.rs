// src/grid.rs
//! Сетка мира: единственный источник данных о клетках
//!
//! Клетки хранятся плоским вектором в растровом порядке смещённых координат
//! (строка за строкой), а доступ идёт по осевой координате. Растровый порядок
//! гарантирует детерминированный обход независимо от хеширования.

use crate::hex::{AxialCoord, OffsetCoord};
use crate::locations::LocationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Одна клетка карты
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub coords: AxialCoord,
    pub terrain_type: String,
    /// Высота, `0.0..=1.0`
    pub elevation: f32,
    /// Влажность, `0.0..=1.0`
    pub moisture: f32,
    pub has_river: bool,
    /// Направление к следующей клетке реки; нулевой вектор — нет реки или устье
    pub river_flow: AxialCoord,
    /// Обратная ссылка на локацию (только для поиска, владеет ею размещатель)
    #[serde(skip)]
    pub location: Option<LocationId>,
}

impl Cell {
    #[must_use]
    pub fn new(coords: AxialCoord, terrain_type: &str) -> Self {
        Self {
            coords,
            terrain_type: terrain_type.to_string(),
            elevation: 0.0,
            moisture: 0.0,
            has_river: false,
            river_flow: AxialCoord::ZERO,
            location: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorldGrid {
    pub width: u32,
    pub height: u32,
    pub hex_size: f32,
    cells: Vec<Cell>,
}

impl WorldGrid {
    /// Создаёт сетку `width × height`, заполняя каждую клетку типом `default_terrain`
    #[must_use]
    pub fn new(width: u32, height: u32, hex_size: f32, default_terrain: &str) -> Self {
        let mut grid = Self {
            width,
            height,
            hex_size,
            cells: Vec::new(),
        };
        grid.rebuild(default_terrain);
        grid
    }

    /// Полностью пересоздаёт клетки (перед каждой попыткой генерации)
    pub fn rebuild(&mut self, default_terrain: &str) {
        self.cells.clear();
        self.cells.reserve((self.width * self.height) as usize);
        for row in 0..self.height as i32 {
            for col in 0..self.width as i32 {
                let coords = OffsetCoord::new(col, row).to_axial();
                self.cells.push(Cell::new(coords, default_terrain));
            }
        }
    }

    /// Удаляет все клетки; после этого ни одна координата не валидна
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    fn index_of(&self, coord: AxialCoord) -> Option<usize> {
        let OffsetCoord { col, row } = coord.to_offset();
        if col < 0 || row < 0 || col >= self.width as i32 || row >= self.height as i32 {
            return None;
        }
        let idx = (row as u32 * self.width + col as u32) as usize;
        (idx < self.cells.len()).then_some(idx)
    }

    #[must_use]
    pub fn get_cell(&self, coord: AxialCoord) -> Option<&Cell> {
        self.index_of(coord).map(|idx| &self.cells[idx])
    }

    pub fn get_cell_mut(&mut self, coord: AxialCoord) -> Option<&mut Cell> {
        self.index_of(coord).map(|idx| &mut self.cells[idx])
    }

    #[must_use]
    pub fn is_valid(&self, coord: AxialCoord) -> bool {
        self.index_of(coord).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Клетки в растровом порядке
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    pub(crate) fn cells_slice_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Координаты всех клеток в растровом порядке
    #[must_use]
    pub fn coords(&self) -> Vec<AxialCoord> {
        self.cells.iter().map(|c| c.coords).collect()
    }

    /// Соседи, существующие в сетке (в порядке направлений E, NE, NW, W, SW, SE)
    pub fn neighbors(&self, coord: AxialCoord) -> impl Iterator<Item = &Cell> {
        coord
            .neighbors()
            .into_iter()
            .filter_map(move |n| self.get_cell(n))
    }

    /// Количество клеток каждого типа местности
    #[must_use]
    pub fn terrain_statistics(&self) -> BTreeMap<String, usize> {
        let mut stats = BTreeMap::new();
        for cell in &self.cells {
            *stats.entry(cell.terrain_type.clone()).or_insert(0) += 1;
        }
        stats
    }

    #[must_use]
    pub fn average_elevation(&self) -> f32 {
        self.average_by(|c| c.elevation)
    }

    #[must_use]
    pub fn average_moisture(&self) -> f32 {
        self.average_by(|c| c.moisture)
    }

    fn average_by(&self, f: impl Fn(&Cell) -> f32) -> f32 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().map(f).sum::<f32>() / self.cells.len() as f32
    }

    /// Координаты клеток с высотой в заданном диапазоне
    #[must_use]
    pub fn cells_by_elevation(&self, range: RangeInclusive<f32>) -> Vec<AxialCoord> {
        self.cells
            .iter()
            .filter(|c| range.contains(&c.elevation))
            .map(|c| c.coords)
            .collect()
    }

    /// Сбрасывает все речные отметки
    pub fn clear_rivers(&mut self) {
        for cell in &mut self.cells {
            cell.has_river = false;
            cell.river_flow = AxialCoord::ZERO;
        }
    }

    /// Сбрасывает все обратные ссылки на локации
    pub fn clear_locations(&mut self) {
        for cell in &mut self.cells {
            cell.location = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_fills_every_offset_cell() {
        let grid = WorldGrid::new(5, 4, 10.0, "plains");
        assert_eq!(grid.len(), 20);
        for row in 0..4 {
            for col in 0..5 {
                let coord = OffsetCoord::new(col, row).to_axial();
                let cell = grid.get_cell(coord).expect("cell exists");
                assert_eq!(cell.coords, coord);
                assert_eq!(cell.terrain_type, "plains");
            }
        }
    }

    #[test]
    fn out_of_bounds_is_invalid() {
        let grid = WorldGrid::new(3, 3, 10.0, "plains");
        assert!(!grid.is_valid(OffsetCoord::new(3, 0).to_axial()));
        assert!(!grid.is_valid(OffsetCoord::new(0, -1).to_axial()));
        assert!(grid.get_cell(AxialCoord::new(-1, 0)).is_none());
    }

    #[test]
    fn clear_discards_all_cells() {
        let mut grid = WorldGrid::new(3, 3, 10.0, "plains");
        grid.clear();
        assert!(grid.is_empty());
        assert!(!grid.is_valid(AxialCoord::new(0, 0)));
        grid.rebuild("water");
        assert_eq!(grid.len(), 9);
        assert_eq!(grid.terrain_statistics().get("water"), Some(&9));
    }

    #[test]
    fn corner_has_fewer_neighbors() {
        let grid = WorldGrid::new(4, 4, 10.0, "plains");
        let corner = OffsetCoord::new(0, 0).to_axial();
        let inner = OffsetCoord::new(1, 1).to_axial();
        assert!(grid.neighbors(corner).count() < 6);
        assert_eq!(grid.neighbors(inner).count(), 6);
    }

    #[test]
    fn aggregate_queries() {
        let mut grid = WorldGrid::new(2, 1, 10.0, "plains");
        let coords = grid.coords();
        grid.get_cell_mut(coords[0]).expect("cell").elevation = 0.2;
        grid.get_cell_mut(coords[1]).expect("cell").elevation = 0.8;
        assert!((grid.average_elevation() - 0.5).abs() < 1e-6);
        assert_eq!(grid.cells_by_elevation(0.5..=1.0), vec![coords[1]]);
    }
}
