// src/preview.rs
//! Диагностический предпросмотр карты в PNG
//!
//! Клетка рисуется кругом в базовом цвете своего типа местности. Реки
//! рисуются отрезками между центрами клеток, локации тёмными точками.

use crate::config::MapConfig;
use crate::error::{MapgenError, Result};
use crate::grid::WorldGrid;
use crate::hex::AxialCoord;
use crate::locations::Location;
use crate::rivers::River;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use std::path::Path;

const BACKGROUND: Rgb<u8> = Rgb([16, 16, 24]);
const UNKNOWN_TERRAIN: Rgb<u8> = Rgb([255, 0, 255]);
const RIVER: Rgb<u8> = Rgb([60, 140, 230]);
const LOCATION: Rgb<u8> = Rgb([20, 10, 10]);

/// Перевод осевых координат в пиксели холста с отступом в один гекс
struct Projection {
    size: f32,
    origin: (f32, f32),
}

impl Projection {
    fn new(grid: &WorldGrid) -> (Self, u32, u32) {
        let size = grid.hex_size;
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for cell in grid.cells() {
            let (x, y) = cell.coords.to_pixel(size);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        if grid.is_empty() {
            (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
        }

        let width = (max_x - min_x + 2.0 * size).ceil().max(1.0) as u32;
        let height = (max_y - min_y + 2.0 * size).ceil().max(1.0) as u32;
        let projection = Self {
            size,
            origin: (size - min_x, size - min_y),
        };
        (projection, width, height)
    }

    fn point(&self, coord: AxialCoord) -> (f32, f32) {
        let (x, y) = coord.to_pixel(self.size);
        (x + self.origin.0, y + self.origin.1)
    }
}

#[must_use]
pub fn render_preview(grid: &WorldGrid, rivers: &[River], locations: &[Location], config: &MapConfig) -> RgbImage {
    let (projection, width, height) = Projection::new(grid);
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    let radius = (grid.hex_size * 0.9).round().max(1.0) as i32;

    for cell in grid.cells() {
        let color = config
            .terrain
            .rule(&cell.terrain_type)
            .map_or(UNKNOWN_TERRAIN, |rule| Rgb(rule.color));
        let (x, y) = projection.point(cell.coords);
        draw_filled_circle_mut(&mut image, (x.round() as i32, y.round() as i32), radius, color);
    }

    for river in rivers {
        for pair in river.path.windows(2) {
            if !grid.is_valid(pair[0]) || !grid.is_valid(pair[1]) {
                continue;
            }
            draw_line_segment_mut(&mut image, projection.point(pair[0]), projection.point(pair[1]), RIVER);
        }
    }

    let dot = (radius / 3).max(1);
    for location in locations.iter().filter(|l| grid.is_valid(l.coords)) {
        let (x, y) = projection.point(location.coords);
        draw_filled_circle_mut(&mut image, (x.round() as i32, y.round() as i32), dot, LOCATION);
    }

    image
}

pub fn save_preview_png(
    path: impl AsRef<Path>,
    grid: &WorldGrid,
    rivers: &[River],
    locations: &[Location],
    config: &MapConfig,
) -> Result<()> {
    render_preview(grid, rivers, locations, config)
        .save(path)
        .map_err(|e| MapgenError::Image(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::OffsetCoord;

    #[test]
    fn canvas_covers_every_cell() {
        let config = MapConfig::default();
        let grid = WorldGrid::new(6, 4, 10.0, "plains");
        let image = render_preview(&grid, &[], &[], &config);

        let (projection, width, height) = Projection::new(&grid);
        assert_eq!(image.dimensions(), (width, height));
        for cell in grid.cells() {
            let (x, y) = projection.point(cell.coords);
            assert!(x >= 0.0 && y >= 0.0);
            assert!(x < width as f32 && y < height as f32);
        }
    }

    #[test]
    fn cells_use_rule_colors() {
        let config = MapConfig::default();
        let grid = WorldGrid::new(3, 3, 10.0, "plains");
        let image = render_preview(&grid, &[], &[], &config);

        let plains = config.terrain.rule("plains").expect("rule").color;
        let (projection, _, _) = Projection::new(&grid);
        let (x, y) = projection.point(OffsetCoord::new(1, 1).to_axial());
        assert_eq!(image.get_pixel(x.round() as u32, y.round() as u32).0, plains);
    }
}
