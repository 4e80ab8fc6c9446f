// src/terrain.rs
//! Генерация местности: высота, влажность и тип каждой клетки
//!
//! 1. Два независимых слоистых шумовых поля (fBm) выбираются в осевой
//!    координате клетки; влажность со своим сидом и большим сдвигом.
//!    Значение клетки зависит только от сида, настроек и её координаты.
//! 2. Растяжение полей на `0..=1` по всей сетке (`stretch`).
//! 3. Классификация по ранжированным правилам.
//! 4. Сглаживание по большинству соседей: все замены раунда вычисляются
//!    по состоянию до раунда и применяются разом.
//!
//! Цветовые вариации клеток здесь не считаются.

use crate::config::{NoiseSettings, TerrainRule, TerrainSettings};
use crate::grid::{Cell, WorldGrid};
use crate::hex::AxialCoord;
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Добавка к сиду поля влажности поверх `seed_offset` из конфигурации
pub const MOISTURE_SEED_DELTA: u64 = 1;

/// Сдвиг точки выборки влажности поверх `offset` из конфигурации
pub const MOISTURE_SAMPLE_OFFSET: f32 = 10_000.0;

pub struct TerrainGenerator<'a> {
    settings: &'a TerrainSettings,
}

impl<'a> TerrainGenerator<'a> {
    #[must_use]
    pub const fn new(settings: &'a TerrainSettings) -> Self {
        Self { settings }
    }

    /// Заполняет высоту, влажность и тип местности всех клеток
    pub fn generate(&self, grid: &mut WorldGrid, seed: u64) {
        self.sample_fields(grid, seed);
        self.stretch_fields(grid);
        self.classify_all(grid);
        let changed = self.smooth(grid);
        tracing::debug!(
            cells = grid.len(),
            smoothed = changed,
            average_elevation = grid.average_elevation(),
            "местность сгенерирована"
        );
    }

    /// Шаг 1: выборка шумовых полей
    pub fn sample_fields(&self, grid: &mut WorldGrid, seed: u64) {
        let elevation = build_noise(&self.settings.elevation_noise, seed);
        // Влажность развязана с высотой всегда, даже при одинаковых настройках полей
        let moisture = build_noise(&self.settings.moisture_noise, seed.wrapping_add(MOISTURE_SEED_DELTA));
        let elevation_settings = &self.settings.elevation_noise;
        let moisture_settings = &self.settings.moisture_noise;

        let sample_cell = |cell: &mut Cell| {
            cell.elevation = sample(&elevation, elevation_settings, cell.coords, 0.0);
            cell.moisture = sample(&moisture, moisture_settings, cell.coords, MOISTURE_SAMPLE_OFFSET);
        };

        #[cfg(feature = "parallel")]
        grid.cells_slice_mut().par_iter_mut().for_each(sample_cell);
        #[cfg(not(feature = "parallel"))]
        grid.cells_slice_mut().iter_mut().for_each(sample_cell);
    }

    /// Шаг 2: растяжение полей, у которых включён `stretch`
    pub fn stretch_fields(&self, grid: &mut WorldGrid) {
        if self.settings.elevation_noise.stretch {
            stretch(grid.cells_slice_mut(), |c| &mut c.elevation);
        }
        if self.settings.moisture_noise.stretch {
            stretch(grid.cells_slice_mut(), |c| &mut c.moisture);
        }
    }

    /// Шаг 3: классификация каждой клетки по правилам
    pub fn classify_all(&self, grid: &mut WorldGrid) {
        let classify_cell = |cell: &mut Cell| {
            let terrain = self.classify(cell.elevation, cell.moisture);
            if cell.terrain_type != terrain {
                cell.terrain_type = terrain.to_string();
            }
        };

        #[cfg(feature = "parallel")]
        grid.cells_slice_mut().par_iter_mut().for_each(classify_cell);
        #[cfg(not(feature = "parallel"))]
        grid.cells_slice_mut().iter_mut().for_each(classify_cell);
    }

    /// Правило с наибольшим приоритетом среди подходящих (при равенстве
    /// первое в списке), иначе тип по умолчанию.
    #[must_use]
    pub fn classify(&self, elevation: f32, moisture: f32) -> &str {
        let mut best: Option<&TerrainRule> = None;
        for rule in &self.settings.rules {
            if rule.matches(elevation, moisture) && best.is_none_or(|b| rule.priority > b.priority) {
                best = Some(rule);
            }
        }
        best.map_or(self.settings.default_terrain.as_str(), |r| r.name.as_str())
    }

    /// Шаг 4: сглаживание по большинству соседей. Возвращает число замен.
    pub fn smooth(&self, grid: &mut WorldGrid) -> usize {
        let smoothing = &self.settings.smoothing;
        let classes = &self.settings.classes;
        let mut total = 0;

        for _ in 0..smoothing.iterations {
            let view: &WorldGrid = grid;
            let changes: Vec<(AxialCoord, String)> = view
                .cells()
                .filter(|cell| {
                    let protected = (smoothing.protect_water && classes.is_water(&cell.terrain_type))
                        || (smoothing.protect_mountains && classes.is_mountain(&cell.terrain_type));
                    !protected
                })
                .filter_map(|cell| {
                    let majority = majority_neighbor(view, cell.coords)?;
                    (majority.1 >= smoothing.neighbor_threshold
                        && majority.0 != cell.terrain_type
                        && self.fits_elevation(majority.0, cell.elevation))
                    .then(|| (cell.coords, majority.0.to_string()))
                })
                .collect();

            if changes.is_empty() {
                break;
            }
            total += changes.len();
            for (coord, terrain) in changes {
                if let Some(cell) = grid.get_cell_mut(coord) {
                    cell.terrain_type = terrain;
                }
            }
        }
        total
    }

    /// Высота клетки укладывается в диапазон нового типа с допуском
    fn fits_elevation(&self, terrain: &str, elevation: f32) -> bool {
        let tolerance = self.settings.smoothing.elevation_tolerance;
        self.settings.rule(terrain).is_some_and(|rule| {
            elevation >= rule.elevation_min - tolerance && elevation <= rule.elevation_max + tolerance
        })
    }
}

/// Самый частый тип среди соседей (при равенстве — встреченный первым)
fn majority_neighbor(grid: &WorldGrid, coord: AxialCoord) -> Option<(&str, u32)> {
    let mut counts: Vec<(&str, u32)> = Vec::with_capacity(6);
    for neighbor in grid.neighbors(coord) {
        let terrain = neighbor.terrain_type.as_str();
        match counts.iter_mut().find(|(t, _)| *t == terrain) {
            Some(entry) => entry.1 += 1,
            None => counts.push((terrain, 1)),
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, u32)>, item| match best {
            Some(b) if b.1 >= item.1 => Some(b),
            _ => Some(item),
        })
}

fn build_noise(settings: &NoiseSettings, seed: u64) -> FastNoiseLite {
    let mut noise = FastNoiseLite::new();
    noise.set_seed(Some(seed.wrapping_add(settings.seed_offset) as i32));
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(settings.octaves as i32));
    noise.set_fractal_gain(Some(settings.persistence));
    noise.set_fractal_lacunarity(Some(settings.lacunarity));
    noise.set_frequency(Some(settings.frequency));
    noise
}

/// Значение поля в клетке, нормализованное из `-1..=1` в `0..=1`
fn sample(noise: &FastNoiseLite, settings: &NoiseSettings, coord: AxialCoord, shift: f32) -> f32 {
    let x = coord.q as f32 + settings.offset[0] + shift;
    let y = coord.r as f32 + settings.offset[1] + shift;
    ((noise.get_noise_2d(x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Линейно растягивает значения поля на весь диапазон `0..=1`
fn stretch(cells: &mut [Cell], field: impl Fn(&mut Cell) -> &mut f32) {
    let (mut min, mut max) = (f32::INFINITY, f32::NEG_INFINITY);
    for cell in cells.iter_mut() {
        let v = *field(cell);
        min = min.min(v);
        max = max.max(v);
    }
    if max - min <= f32::EPSILON {
        return;
    }
    for cell in cells.iter_mut() {
        let v = field(cell);
        *v = (*v - min) / (max - min);
    }
}
