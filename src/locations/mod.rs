// src/locations/mod.rs
//! Размещение именованных локаций
//!
//! Типы размещаются строго по порядку [`LocationKind::ORDER`]: ограничения
//! поздних типов («рядом с городом», «между городами») зависят от уже
//! поставленных ранних. Для каждого типа:
//! 1. фильтрация кандидатов по местности, высоте, воде, расстояниям и
//!    географическим предикатам;
//! 2. оценка приоритета (один раз на кандидата, со случайной добавкой);
//! 3. перемешивание и устойчивая сортировка по приоритету, затем обход с
//!    повторной проверкой расстояний до уже размещённых локаций;
//! 4. выбор имени и флейворных свойств.
//!
//! Нехватка локаций не является ошибкой здесь — её фиксирует валидатор.

pub mod naming;
pub mod properties;
pub mod strategic;

use crate::config::{DistanceBand, LocationRule, MapConfig, WaterRequirement};
use crate::grid::{Cell, WorldGrid};
use crate::hex::AxialCoord;
use naming::NamePool;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use strategic::{StrategicFeatures, WaterAccess};

/// Смещение сида размещателя относительно сида генерации
pub const LOCATION_SEED_OFFSET: u64 = 77_777;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Town,
    Fort,
    TradingPost,
    Mission,
    Roadhouse,
    Cave,
    CaravanCamp,
}

impl LocationKind {
    /// Порядок размещения
    pub const ORDER: [Self; 7] = [
        Self::Town,
        Self::Fort,
        Self::TradingPost,
        Self::Mission,
        Self::Roadhouse,
        Self::Cave,
        Self::CaravanCamp,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Town => "town",
            Self::Fort => "fort",
            Self::TradingPost => "trading_post",
            Self::Mission => "mission",
            Self::Roadhouse => "roadhouse",
            Self::Cave => "cave",
            Self::CaravanCamp => "caravan_camp",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Town => "Town",
            Self::Fort => "Fort",
            Self::TradingPost => "Trading Post",
            Self::Mission => "Mission",
            Self::Roadhouse => "Roadhouse",
            Self::Cave => "Cave",
            Self::CaravanCamp => "Caravan Camp",
        }
    }

    /// Поселения, к которым привязываются `near_settlements`-локации
    #[must_use]
    pub const fn is_settlement(self) -> bool {
        matches!(self, Self::Town | Self::Fort)
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Индекс локации в наборе размещателя
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: LocationKind,
    pub name: String,
    pub coords: AxialCoord,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

/// Результат размещения всех типов
#[derive(Debug, Clone, Default)]
pub struct PlacementOutcome {
    pub locations: Vec<Location>,
    pub placed: BTreeMap<LocationKind, u32>,
    /// Типы, не добравшие `min_count`: (тип, размещено, минимум)
    pub shortfalls: Vec<(LocationKind, u32, u32)>,
}

impl PlacementOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.shortfalls.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    coord: AxialCoord,
    score: f32,
}

/// Координаты уже размещённых опорных локаций
struct Anchors {
    towns: Vec<AxialCoord>,
    settlements: Vec<AxialCoord>,
}

impl Anchors {
    fn from(placed: &[Location]) -> Self {
        Self {
            towns: placed
                .iter()
                .filter(|l| l.kind == LocationKind::Town)
                .map(|l| l.coords)
                .collect(),
            settlements: placed
                .iter()
                .filter(|l| l.kind.is_settlement())
                .map(|l| l.coords)
                .collect(),
        }
    }
}

/// Проверка расстояний до уже размещённых локаций
#[must_use]
pub fn spacing_ok(kind: LocationKind, rule: &LocationRule, coord: AxialCoord, placed: &[Location]) -> bool {
    placed.iter().all(|other| {
        let d = coord.distance(other.coords);
        d >= rule.min_distance_any && (other.kind != kind || d >= rule.min_distance_same_type)
    })
}

pub struct LocationPlacer<'a> {
    config: &'a MapConfig,
}

impl<'a> LocationPlacer<'a> {
    #[must_use]
    pub const fn new(config: &'a MapConfig) -> Self {
        Self { config }
    }

    /// Размещает все типы по порядку. Реки берутся из отметок на клетках сетки.
    pub fn place_all(&self, grid: &mut WorldGrid, seed: u64) -> PlacementOutcome {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(LOCATION_SEED_OFFSET));
        let mut names = NamePool::new();
        let mut outcome = PlacementOutcome::default();
        grid.clear_locations();

        for kind in LocationKind::ORDER {
            let Some(rule) = self.config.location_rule(kind) else {
                continue;
            };
            let count = self.place_kind(kind, rule, grid, &mut outcome.locations, &mut names, &mut rng);
            outcome.placed.insert(kind, count);
            if count < rule.min_count {
                tracing::warn!(%kind, placed = count, minimum = rule.min_count, "тип локации не добрал минимум");
                outcome.shortfalls.push((kind, count, rule.min_count));
            }
        }

        tracing::debug!(total = outcome.locations.len(), "локации размещены");
        outcome
    }

    fn place_kind(
        &self,
        kind: LocationKind,
        rule: &LocationRule,
        grid: &mut WorldGrid,
        placed: &mut Vec<Location>,
        names: &mut NamePool,
        rng: &mut ChaCha8Rng,
    ) -> u32 {
        let target = rng.gen_range(rule.min_count..=rule.max_count);
        if target == 0 {
            return 0;
        }

        let anchors = Anchors::from(placed);
        let mut candidates: Vec<Candidate> = {
            let view: &WorldGrid = grid;
            let already: &[Location] = placed;
            let coords: Vec<AxialCoord> = view
                .cells()
                .filter(|cell| self.is_candidate(kind, rule, cell, view, already, &anchors))
                .map(|cell| cell.coords)
                .collect();
            // Оценка считается один раз и дальше не пересчитывается
            coords
                .into_iter()
                .map(|coord| Candidate {
                    coord,
                    score: self.score(rule, coord, view, &anchors, rng),
                })
                .collect()
        };

        tracing::debug!(%kind, target, candidates = candidates.len(), "кандидаты отфильтрованы");

        // Перемешивание + устойчивая сортировка: равные оценки идут в случайном порядке
        candidates.shuffle(rng);
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut count = 0;
        for candidate in candidates {
            if count >= target {
                break;
            }
            if !spacing_ok(kind, rule, candidate.coord, placed) {
                continue;
            }
            let id = LocationId(placed.len() as u32);
            let location = Location {
                kind,
                name: names.next_name(kind, &rule.names, rng),
                coords: candidate.coord,
                properties: properties::flavor_properties(kind, rng),
            };
            if let Some(cell) = grid.get_cell_mut(candidate.coord) {
                cell.location = Some(id);
            }
            placed.push(location);
            count += 1;
        }
        count
    }

    fn is_candidate(
        &self,
        kind: LocationKind,
        rule: &LocationRule,
        cell: &Cell,
        grid: &WorldGrid,
        placed: &[Location],
        anchors: &Anchors,
    ) -> bool {
        let classes = &self.config.terrain.classes;
        let heuristics = &self.config.placement;
        let coord = cell.coords;

        if cell.location.is_some()
            || !rule.terrain.iter().any(|t| *t == cell.terrain_type)
            || !(rule.elevation_min..=rule.elevation_max).contains(&cell.elevation)
        {
            return false;
        }
        if !WaterAccess::of(grid, coord, classes).satisfies(rule.water) {
            return false;
        }
        if !spacing_ok(kind, rule, coord, placed) {
            return false;
        }
        if let Some(band) = rule.town_distance {
            if !strategic::nearest_distance(coord, &anchors.towns).is_some_and(|d| band.contains(d)) {
                return false;
            }
        }
        if rule.strategic && !StrategicFeatures::of(grid, coord, heuristics).any() {
            return false;
        }
        if rule.near_settlements
            && !strategic::nearest_distance(coord, &anchors.settlements)
                .is_some_and(|d| heuristics.settlement_band.contains(d))
        {
            return false;
        }
        if rule.between_settlements && towns_in_band(coord, anchors, heuristics.between_band).len() < 2 {
            return false;
        }
        if rule.along_routes && !strategic::is_along_route(grid, coord, &anchors.towns, classes, heuristics) {
            return false;
        }
        true
    }

    fn score(
        &self,
        rule: &LocationRule,
        coord: AxialCoord,
        grid: &WorldGrid,
        anchors: &Anchors,
        rng: &mut ChaCha8Rng,
    ) -> f32 {
        let heuristics = &self.config.placement;
        let mut score = 0.0;

        let wants_water = rule.prefer_rivers || rule.along_routes || rule.water != WaterRequirement::None;
        if wants_water {
            let access = WaterAccess::of(grid, coord, &self.config.terrain.classes);
            if access.on_river {
                score += heuristics.river_bonus;
            } else if access.adjacent_river {
                score += heuristics.river_bonus * 0.5;
            }
            if access.adjacent_water {
                score += heuristics.water_bonus;
            }
        }

        if rule.strategic {
            score += heuristics.strategic_bonus * StrategicFeatures::of(grid, coord, heuristics).count() as f32;
        }

        if rule.between_settlements {
            let distances = towns_in_band(coord, anchors, heuristics.between_band);
            if distances.len() >= 2 {
                score += heuristics.between_bonus / (1.0 + variance(&distances));
            }
        }

        score + rng.gen_range(0.0_f32..1.0) * heuristics.jitter
    }
}

fn towns_in_band(coord: AxialCoord, anchors: &Anchors, band: DistanceBand) -> Vec<f32> {
    anchors
        .towns
        .iter()
        .map(|&t| coord.distance(t))
        .filter(|&d| band.contains(d))
        .map(|d| d as f32)
        .collect()
}

fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n
}
