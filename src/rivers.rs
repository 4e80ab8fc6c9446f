// src/rivers.rs
//! Трассировка рек жадным спуском по гексам
//!
//! Истоки — клетки суши не ниже `source_elevation_min`, у которых есть сосед
//! строго ниже. От истока река шагает к непосещённому соседу не выше
//! текущей клетки: сначала к воде, затем к уже проложенной реке (слияние),
//! иначе к самому низкому соседу; почти равные по высоте варианты
//! выбираются случайно. Принятая река сразу отмечается на сетке, чтобы
//! следующие трассы видели слияния.

use crate::config::{RiverSettings, TerrainClasses};
use crate::grid::WorldGrid;
use crate::hex::AxialCoord;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Смещение сида рек относительно сида генерации
pub const RIVER_SEED_OFFSET: u64 = 99_999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct River {
    pub id: u32,
    pub source: AxialCoord,
    pub path: Vec<AxialCoord>,
    pub length: usize,
    pub reaches_water: bool,
    /// Реки, в которые эта впадает
    #[serde(default)]
    pub merged_with: BTreeSet<u32>,
}

/// Результат одной трассировки
#[derive(Debug)]
struct Trace {
    path: Vec<AxialCoord>,
    merged_into: Option<u32>,
}

pub struct RiverGenerator<'a> {
    settings: &'a RiverSettings,
    classes: &'a TerrainClasses,
}

impl<'a> RiverGenerator<'a> {
    #[must_use]
    pub const fn new(settings: &'a RiverSettings, classes: &'a TerrainClasses) -> Self {
        Self { settings, classes }
    }

    /// Клетки, из которых может начаться река
    #[must_use]
    pub fn source_candidates(&self, grid: &WorldGrid) -> Vec<AxialCoord> {
        grid.cells()
            .filter(|cell| {
                cell.elevation >= self.settings.source_elevation_min
                    && !self.classes.is_water(&cell.terrain_type)
                    && grid.neighbors(cell.coords).any(|n| n.elevation < cell.elevation)
            })
            .map(|cell| cell.coords)
            .collect()
    }

    /// Прокладывает реки и отмечает их на сетке. Нехватка истоков не ошибка:
    /// результат просто короче, а валидатор сообщит о недоборе.
    pub fn generate(&self, grid: &mut WorldGrid, seed: u64) -> Vec<River> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(RIVER_SEED_OFFSET));
        grid.clear_rivers();

        let mut candidates = self.source_candidates(grid);
        if candidates.is_empty() {
            tracing::debug!("нет подходящих истоков, реки не созданы");
            return Vec::new();
        }

        let target = rng.gen_range(self.settings.min_rivers..=self.settings.max_rivers) as usize;
        let max_attempts = self.settings.max_attempts_per_river as usize * target;

        let mut rivers: Vec<River> = Vec::with_capacity(target);
        let mut river_at: HashMap<AxialCoord, u32> = HashMap::new();
        candidates.shuffle(&mut rng);
        let mut next = 0;
        let mut attempts = 0;

        while rivers.len() < target && attempts < max_attempts {
            if next >= candidates.len() {
                candidates.shuffle(&mut rng);
                next = 0;
            }
            let source = candidates[next];
            next += 1;
            attempts += 1;

            // Исток на уже проложенной реке сразу дал бы слияние нулевой длины
            if river_at.contains_key(&source) {
                continue;
            }

            let trace = self.trace(grid, source, &river_at, &mut rng);
            if trace.path.len() < self.settings.min_river_length {
                tracing::trace!(%source, length = trace.path.len(), "река слишком короткая, отброшена");
                continue;
            }

            let id = rivers.len() as u32;
            stamp_path(grid, &trace.path);
            for &coord in &trace.path {
                river_at.entry(coord).or_insert(id);
            }
            rivers.push(River {
                id,
                source,
                length: trace.path.len(),
                reaches_water: self.reaches_water(grid, &trace.path),
                merged_with: trace.merged_into.into_iter().collect(),
                path: trace.path,
            });
        }

        tracing::debug!(
            target,
            traced = rivers.len(),
            attempts,
            sources = candidates.len(),
            "реки проложены"
        );
        rivers
    }

    fn trace(
        &self,
        grid: &WorldGrid,
        source: AxialCoord,
        river_at: &HashMap<AxialCoord, u32>,
        rng: &mut ChaCha8Rng,
    ) -> Trace {
        let mut path = vec![source];
        let mut visited: HashSet<AxialCoord> = HashSet::from([source]);
        let mut current = source;
        let mut merged_into = None;

        for _ in 0..self.settings.max_steps {
            let Some(cell) = grid.get_cell(current) else {
                break;
            };
            if self.classes.is_water(&cell.terrain_type)
                || cell.elevation < self.settings.target_elevation_max
            {
                break;
            }

            let downhill: Vec<(AxialCoord, f32)> = grid
                .neighbors(current)
                .filter(|n| !visited.contains(&n.coords) && n.elevation <= cell.elevation)
                .map(|n| (n.coords, n.elevation))
                .collect();
            if downhill.is_empty() {
                break;
            }

            let water: Vec<(AxialCoord, f32)> = downhill
                .iter()
                .copied()
                .filter(|(c, _)| grid.get_cell(*c).is_some_and(|n| self.classes.is_water(&n.terrain_type)))
                .collect();
            let joining: Vec<(AxialCoord, f32)> = downhill
                .iter()
                .copied()
                .filter(|(c, _)| river_at.contains_key(c))
                .collect();

            let step = if let Some(&(c, _)) = lowest(&water) {
                c
            } else if let Some(&(c, _)) = lowest(&joining) {
                // Слияние: доходим до чужой реки и останавливаемся
                path.push(c);
                merged_into = river_at.get(&c).copied();
                break;
            } else {
                self.pick_downhill(&downhill, rng)
            };

            path.push(step);
            visited.insert(step);
            current = step;
        }

        Trace { path, merged_into }
    }

    /// Самый низкий сосед, при почти равных высотах — случайный из них
    fn pick_downhill(&self, downhill: &[(AxialCoord, f32)], rng: &mut ChaCha8Rng) -> AxialCoord {
        let min = downhill
            .iter()
            .map(|&(_, e)| e)
            .fold(f32::INFINITY, f32::min);
        let near: Vec<AxialCoord> = downhill
            .iter()
            .filter(|&&(_, e)| e - min <= self.settings.tie_tolerance)
            .map(|&(c, _)| c)
            .collect();
        near.choose(rng).copied().unwrap_or(downhill[0].0)
    }

    /// Последняя клетка пути — вода или ниже целевой высоты
    #[must_use]
    pub fn reaches_water(&self, grid: &WorldGrid, path: &[AxialCoord]) -> bool {
        path.last()
            .and_then(|&c| grid.get_cell(c))
            .is_some_and(|cell| {
                self.classes.is_water(&cell.terrain_type)
                    || cell.elevation < self.settings.target_elevation_max
            })
    }
}

fn lowest(options: &[(AxialCoord, f32)]) -> Option<&(AxialCoord, f32)> {
    options.iter().min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Отмечает путь на сетке: `river_flow` указывает на следующую клетку,
/// в устье — нулевой вектор. Клетки чужих рек (точка слияния) не
/// перезаписываются.
pub fn stamp_path(grid: &mut WorldGrid, path: &[AxialCoord]) {
    for (i, &coord) in path.iter().enumerate() {
        let flow = path.get(i + 1).map_or(AxialCoord::ZERO, |&next| next - coord);
        if let Some(cell) = grid.get_cell_mut(coord) {
            if cell.has_river {
                continue;
            }
            cell.has_river = true;
            cell.river_flow = flow;
        }
    }
}
