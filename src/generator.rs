// src/generator.rs
//! Оркестратор генерации
//!
//! Последовательность одной попытки: местность → реки → локации → проверка.
//! Если карта не прошла проверку, попытка повторяется с производным сидом
//! `seed + k × 10000` (k ≥ 2). Когда попытки исчерпаны, остаётся лучшая из
//! них (с наименьшим числом ошибок) и явный флаг неуспеха.

use crate::config::MapConfig;
use crate::error::Result;
use crate::grid::WorldGrid;
use crate::locations::{Location, LocationPlacer};
use crate::rivers::{River, RiverGenerator};
use crate::snapshot::MapSnapshot;
use crate::terrain::TerrainGenerator;
use crate::validation::{MapValidator, ValidationResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Шаг сида между попытками
pub const ATTEMPT_SEED_STEP: u64 = 10_000;

/// Этапы конечного автомата генерации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Idle,
    GeneratingTerrain,
    GeneratingRivers,
    PlacingLocations,
    Validating,
    Accepted,
    Retrying,
    Exhausted,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::GeneratingTerrain => "generating_terrain",
            Self::GeneratingRivers => "generating_rivers",
            Self::PlacingLocations => "placing_locations",
            Self::Validating => "validating",
            Self::Accepted => "accepted",
            Self::Retrying => "retrying",
            Self::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// Наблюдатель за ходом генерации. Вызывается синхронно между этапами.
pub trait ProgressObserver {
    fn on_stage(&mut self, _stage: GenerationStage, _attempt: u32) {}

    /// Доля выполненной работы, `0.0..=1.0`, не убывает в пределах одного запуска
    fn on_progress(&mut self, _fraction: f32) {}
}

/// Сид попытки с номером `attempt` (нумерация с 1)
#[must_use]
pub const fn attempt_seed(seed: u64, attempt: u32) -> u64 {
    if attempt < 2 {
        seed
    } else {
        seed.wrapping_add(attempt as u64 * ATTEMPT_SEED_STEP)
    }
}

/// Полное состояние одной попытки
#[derive(Debug, Clone)]
struct Attempt {
    seed: u64,
    grid: WorldGrid,
    rivers: Vec<River>,
    locations: Vec<Location>,
    validation: ValidationResult,
}

const STAGES_PER_ATTEMPT: u32 = 4;

pub struct MapGenerator {
    config: MapConfig,
    grid: WorldGrid,
    rivers: Vec<River>,
    locations: Vec<Location>,
    seed: u64,
    stage: GenerationStage,
    attempts_used: u32,
    last_validation: Option<ValidationResult>,
    observer: Option<Box<dyn ProgressObserver>>,
}

impl fmt::Debug for MapGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapGenerator")
            .field("seed", &self.seed)
            .field("stage", &self.stage)
            .field("cells", &self.grid.len())
            .field("rivers", &self.rivers.len())
            .field("locations", &self.locations.len())
            .finish_non_exhaustive()
    }
}

impl MapGenerator {
    /// Конфигурация должна быть уже проверена ([`MapConfig::validate`])
    #[must_use]
    pub fn new(config: MapConfig) -> Self {
        let grid = empty_grid(&config);
        Self {
            config,
            grid,
            rivers: Vec::new(),
            locations: Vec::new(),
            seed: 0,
            stage: GenerationStage::Idle,
            attempts_used: 0,
            last_validation: None,
            observer: None,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Пересоздаёт сетку и заполняет местность. Реки и локации прошлой
    /// генерации сбрасываются.
    pub fn generate_terrain(&mut self, seed: u64) {
        self.seed = seed;
        self.grid = empty_grid(&self.config);
        self.rivers.clear();
        self.locations.clear();
        TerrainGenerator::new(&self.config.terrain).generate(&mut self.grid, seed);
    }

    /// Прокладывает реки по текущей местности, возвращает их число.
    /// Локации прошлой генерации сбрасываются.
    pub fn generate_rivers(&mut self, seed: u64) -> usize {
        self.locations.clear();
        self.grid.clear_locations();
        let generator = RiverGenerator::new(&self.config.rivers, &self.config.terrain.classes);
        self.rivers = generator.generate(&mut self.grid, seed);
        self.rivers.len()
    }

    /// Размещает локации; `false`, если какой-то тип не набрал минимум
    pub fn place_all_locations(&mut self, seed: u64) -> bool {
        let outcome = LocationPlacer::new(&self.config).place_all(&mut self.grid, seed);
        let success = outcome.success();
        self.locations = outcome.locations;
        success
    }

    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        MapValidator::new(&self.config).validate(&self.grid, &self.rivers, &self.locations)
    }

    /// Полный цикл с повторами. `true` только если какая-то попытка
    /// прошла проверку; иначе в генераторе остаётся лучшая попытка.
    pub fn generate_complete_map(&mut self, seed: u64, max_attempts: u32) -> bool {
        let max_attempts = max_attempts.max(1);
        let total_steps = (max_attempts * STAGES_PER_ATTEMPT) as f32;
        let mut best: Option<Attempt> = None;
        self.last_validation = None;

        for attempt in 1..=max_attempts {
            let current_seed = attempt_seed(seed, attempt);
            let step = |done: u32| ((attempt - 1) * STAGES_PER_ATTEMPT + done) as f32 / total_steps;
            self.attempts_used = attempt;
            tracing::info!(attempt, seed = current_seed, "попытка генерации");

            self.enter(GenerationStage::GeneratingTerrain, attempt);
            self.generate_terrain(current_seed);
            self.progress(step(1));

            self.enter(GenerationStage::GeneratingRivers, attempt);
            let rivers = self.generate_rivers(current_seed);
            self.progress(step(2));

            self.enter(GenerationStage::PlacingLocations, attempt);
            let placed_all = self.place_all_locations(current_seed);
            self.progress(step(3));

            self.enter(GenerationStage::Validating, attempt);
            let validation = self.validate();
            self.progress(step(4));

            if validation.valid {
                tracing::info!(
                    attempt,
                    seed = current_seed,
                    rivers,
                    locations = self.locations.len(),
                    warnings = validation.warnings.len(),
                    "карта принята"
                );
                self.last_validation = Some(validation);
                self.enter(GenerationStage::Accepted, attempt);
                self.progress(1.0);
                return true;
            }

            tracing::warn!(
                attempt,
                seed = current_seed,
                placed_all,
                errors = ?validation.errors,
                "карта не прошла проверку"
            );
            if best
                .as_ref()
                .is_none_or(|b| validation.errors.len() < b.validation.errors.len())
            {
                best = Some(Attempt {
                    seed: current_seed,
                    grid: self.grid.clone(),
                    rivers: self.rivers.clone(),
                    locations: self.locations.clone(),
                    validation,
                });
            }
            if attempt < max_attempts {
                self.enter(GenerationStage::Retrying, attempt);
            }
        }

        if let Some(best) = best {
            tracing::warn!(
                seed = best.seed,
                errors = best.validation.errors.len(),
                "попытки исчерпаны, оставлена лучшая карта"
            );
            self.seed = best.seed;
            self.grid = best.grid;
            self.rivers = best.rivers;
            self.locations = best.locations;
            self.last_validation = Some(best.validation);
        }
        self.enter(GenerationStage::Exhausted, max_attempts);
        self.progress(1.0);
        false
    }

    /// Загружает ранее сохранённую карту вместо генерации
    pub fn load_snapshot(&mut self, snapshot: MapSnapshot) -> Result<()> {
        let restored = snapshot.restore(&self.config.terrain.default_terrain)?;
        self.seed = restored.seed;
        self.grid = restored.grid;
        self.rivers = restored.rivers;
        self.locations = restored.locations;
        self.stage = GenerationStage::Idle;
        self.attempts_used = 0;
        self.last_validation = None;
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot::from_parts(self.seed, &self.grid, &self.rivers, &self.locations)
    }

    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.config
    }

    #[must_use]
    pub const fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    #[must_use]
    pub fn rivers(&self) -> &[River] {
        &self.rivers
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Сид, из которого получены текущие данные
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn stage(&self) -> GenerationStage {
        self.stage
    }

    /// Сколько попыток потратил последний [`Self::generate_complete_map`]
    #[must_use]
    pub const fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    /// Результат проверки принятой (или лучшей) попытки
    #[must_use]
    pub const fn last_validation(&self) -> Option<&ValidationResult> {
        self.last_validation.as_ref()
    }

    fn enter(&mut self, stage: GenerationStage, attempt: u32) {
        self.stage = stage;
        if let Some(observer) = self.observer.as_mut() {
            observer.on_stage(stage, attempt);
        }
    }

    fn progress(&mut self, fraction: f32) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_progress(fraction.clamp(0.0, 1.0));
        }
    }
}

fn empty_grid(config: &MapConfig) -> WorldGrid {
    WorldGrid::new(
        config.map.width,
        config.map.height,
        config.map.hex_size,
        &config.terrain.default_terrain,
    )
}
