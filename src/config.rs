// src/config.rs
//! Конфигурация генерации карты
//!
//! Этот модуль определяет все параметры, управляющие процедурной генерацией:
//! - Размеры карты и размер гекса
//! - Правила классификации местности и параметры шумовых полей
//! - Параметры сглаживания, рек и размещения локаций
//! - Пороги валидатора
//!
//! Все структуры строго типизированы и сериализуются в TOML/JSON. Проверка
//! значений выполняется один раз при загрузке ([`MapConfig::validate`]),
//! дальше алгоритмы доверяют конфигурации.

use crate::error::{MapgenError, Result};
use crate::locations::LocationKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Размеры карты
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapSettings {
    /// Ширина карты в гексах (столбцы)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Высота карты в гексах (строки)
    #[serde(default = "default_height")]
    pub height: u32,

    /// Радиус описанной окружности гекса в пикселях (для предпросмотра и пиксельных запросов)
    #[serde(default = "default_hex_size")]
    pub hex_size: f32,
}

fn default_width() -> u32 {
    40
}
fn default_height() -> u32 {
    30
}
fn default_hex_size() -> f32 {
    12.0
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            width: 40,
            height: 30,
            hex_size: 12.0,
        }
    }
}

/// Правило классификации местности
///
/// Клетка подходит под правило, если её высота и влажность лежат в обоих
/// диапазонах (границы включительно). При нескольких совпадениях побеждает
/// больший `priority`, при равенстве — первое найденное.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerrainRule {
    pub name: String,
    pub elevation_min: f32,
    pub elevation_max: f32,
    #[serde(default)]
    pub moisture_min: f32,
    #[serde(default = "one")]
    pub moisture_max: f32,
    #[serde(default)]
    pub priority: i32,
    /// Базовый цвет для диагностического предпросмотра
    #[serde(default = "default_rule_color")]
    pub color: [u8; 3],
}

fn one() -> f32 {
    1.0
}
fn default_rule_color() -> [u8; 3] {
    [128, 128, 128]
}

impl TerrainRule {
    fn new(name: &str, elevation: (f32, f32), moisture: (f32, f32), priority: i32, color: [u8; 3]) -> Self {
        Self {
            name: name.to_string(),
            elevation_min: elevation.0,
            elevation_max: elevation.1,
            moisture_min: moisture.0,
            moisture_max: moisture.1,
            priority,
            color,
        }
    }

    #[must_use]
    pub fn matches(&self, elevation: f32, moisture: f32) -> bool {
        (self.elevation_min..=self.elevation_max).contains(&elevation)
            && (self.moisture_min..=self.moisture_max).contains(&moisture)
    }
}

/// Параметры одного слоистого шумового поля (fBm)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseSettings {
    pub frequency: f32,
    pub octaves: u32,
    /// Множитель амплитуды между октавами
    pub persistence: f32,
    /// Множитель частоты между октавами
    pub lacunarity: f32,
    /// Дополнительный сдвиг точки выборки
    pub offset: [f32; 2],
    /// Добавка к сиду генерации для этого поля
    pub seed_offset: u64,
    /// Растягивать значения поля на весь диапазон `0..=1` после нормализации
    pub stretch: bool,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            frequency: 0.09,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: [0.0, 0.0],
            seed_offset: 0,
            stretch: true,
        }
    }
}

impl NoiseSettings {
    /// Поле влажности по умолчанию: крупнее и глаже поля высот.
    /// Собственный сид и сдвиг точки выборки генератор добавляет сам.
    #[must_use]
    pub fn moisture() -> Self {
        Self {
            frequency: 0.07,
            octaves: 3,
            ..Self::default()
        }
    }
}

/// Параметры сглаживания по большинству соседей
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmoothingSettings {
    /// Сколько соседей одного типа нужно для перекраски клетки (из 6)
    pub neighbor_threshold: u32,
    pub iterations: u32,
    pub protect_water: bool,
    pub protect_mountains: bool,
    /// Допуск по высоте при проверке диапазона нового типа
    pub elevation_tolerance: f32,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            neighbor_threshold: 4,
            iterations: 2,
            protect_water: true,
            protect_mountains: true,
            elevation_tolerance: 0.1,
        }
    }
}

/// Группы типов местности, на которые опираются реки, размещение и валидатор
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainClasses {
    pub water_types: Vec<String>,
    pub mountain_types: Vec<String>,
    /// Непроходимые типы для грубой проверки связности городов
    pub impassable_types: Vec<String>,
    /// Открытые равнины (проверка баланса местности)
    pub open_land_types: Vec<String>,
}

impl Default for TerrainClasses {
    fn default() -> Self {
        Self {
            water_types: strings(&["deep_water", "water"]),
            mountain_types: strings(&["mountains", "peaks"]),
            impassable_types: strings(&["deep_water", "water", "peaks"]),
            open_land_types: strings(&["plains", "grassland"]),
        }
    }
}

impl TerrainClasses {
    #[must_use]
    pub fn is_water(&self, terrain: &str) -> bool {
        self.water_types.iter().any(|t| t == terrain)
    }

    #[must_use]
    pub fn is_mountain(&self, terrain: &str) -> bool {
        self.mountain_types.iter().any(|t| t == terrain)
    }

    #[must_use]
    pub fn is_passable(&self, terrain: &str) -> bool {
        !self.impassable_types.iter().any(|t| t == terrain)
    }

    #[must_use]
    pub fn is_open_land(&self, terrain: &str) -> bool {
        self.open_land_types.iter().any(|t| t == terrain)
    }
}

/// Настройки генератора местности
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainSettings {
    pub rules: Vec<TerrainRule>,
    /// Тип для клеток, не подошедших ни под одно правило
    pub default_terrain: String,
    pub elevation_noise: NoiseSettings,
    pub moisture_noise: NoiseSettings,
    pub smoothing: SmoothingSettings,
    pub classes: TerrainClasses,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            rules: default_terrain_rules(),
            default_terrain: "plains".to_string(),
            elevation_noise: NoiseSettings::default(),
            moisture_noise: NoiseSettings::moisture(),
            smoothing: SmoothingSettings::default(),
            classes: TerrainClasses::default(),
        }
    }
}

impl TerrainSettings {
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&TerrainRule> {
        self.rules.iter().find(|r| r.name == name)
    }
}

fn default_terrain_rules() -> Vec<TerrainRule> {
    vec![
        TerrainRule::new("deep_water", (0.0, 0.16), (0.0, 1.0), 10, [20, 50, 110]),
        TerrainRule::new("water", (0.16, 0.27), (0.0, 1.0), 9, [50, 100, 170]),
        TerrainRule::new("desert", (0.27, 0.6), (0.0, 0.3), 3, [215, 190, 130]),
        TerrainRule::new("plains", (0.27, 0.6), (0.3, 0.6), 2, [170, 190, 100]),
        TerrainRule::new("grassland", (0.27, 0.6), (0.6, 1.0), 2, [120, 180, 80]),
        TerrainRule::new("forest", (0.45, 0.7), (0.55, 1.0), 4, [50, 110, 50]),
        TerrainRule::new("hills", (0.6, 0.75), (0.0, 1.0), 5, [150, 130, 90]),
        TerrainRule::new("mountains", (0.75, 0.9), (0.0, 1.0), 6, [120, 110, 105]),
        TerrainRule::new("peaks", (0.9, 1.0), (0.0, 1.0), 7, [235, 235, 240]),
    ]
}

/// Параметры генератора рек
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiverSettings {
    /// Минимальная высота истока
    pub source_elevation_min: f32,
    /// Река останавливается, опустившись ниже этой высоты
    pub target_elevation_max: f32,
    pub min_river_length: usize,
    pub min_rivers: u32,
    pub max_rivers: u32,
    pub max_attempts_per_river: u32,
    /// Предохранитель длины трассировки
    pub max_steps: usize,
    /// Соседи с разницей высот меньше этого считаются равными (случайный выбор)
    pub tie_tolerance: f32,
}

impl Default for RiverSettings {
    fn default() -> Self {
        Self {
            source_elevation_min: 0.6,
            target_elevation_max: 0.3,
            min_river_length: 3,
            min_rivers: 1,
            max_rivers: 4,
            max_attempts_per_river: 10,
            max_steps: 200,
            tie_tolerance: 0.05,
        }
    }
}

/// Требование к воде рядом с локацией
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaterRequirement {
    #[default]
    None,
    /// Хотя бы один сосед — водная клетка
    AdjacentWater,
    /// Клетка на реке или рядом с рекой
    AdjacentRiver,
    /// Клетка сама на реке
    OnRiver,
    /// Водный сосед или река рядом
    AnyWater,
}

/// Диапазон расстояний в гексах (включительно)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistanceBand {
    pub min: u32,
    pub max: u32,
}

impl DistanceBand {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn contains(self, distance: u32) -> bool {
        distance >= self.min && distance <= self.max
    }
}

/// Правила размещения одного типа локаций
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocationRule {
    /// Разрешённые типы местности
    pub terrain: Vec<String>,
    pub elevation_min: f32,
    pub elevation_max: f32,
    pub water: WaterRequirement,
    pub min_count: u32,
    pub max_count: u32,
    pub min_distance_same_type: u32,
    pub min_distance_any: u32,
    /// Расстояние до ближайшего города должно попадать в диапазон
    pub town_distance: Option<DistanceBand>,
    /// Перевалы, переправы и господствующие высоты
    pub strategic: bool,
    /// Вдоль рек или дорог между городами
    pub along_routes: bool,
    pub prefer_rivers: bool,
    /// Недалеко от города или форта
    pub near_settlements: bool,
    /// Примерно посередине между городами
    pub between_settlements: bool,
    /// Имена; повторяются, только когда список исчерпан
    pub names: Vec<String>,
}

impl Default for LocationRule {
    fn default() -> Self {
        Self {
            terrain: strings(&["plains", "grassland"]),
            elevation_min: 0.0,
            elevation_max: 1.0,
            water: WaterRequirement::None,
            min_count: 0,
            max_count: 1,
            min_distance_same_type: 3,
            min_distance_any: 1,
            town_distance: None,
            strategic: false,
            along_routes: false,
            prefer_rivers: false,
            near_settlements: false,
            between_settlements: false,
            names: Vec::new(),
        }
    }
}

/// Пороги и бонусы эвристик размещения
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlacementHeuristics {
    /// Сколько соседей из 6 должно быть ниже клетки для «господствующей высоты»
    pub commanding_view_neighbors: u32,
    /// Допустимый крюк относительно прямой между двумя городами
    pub route_detour_ratio: f32,
    /// Высота соседей с двух противоположных сторон для перевала
    pub pass_elevation_min: f32,
    /// Минимальная высота клетки на реке для переправы
    pub river_crossing_elevation_min: f32,
    /// Расстояние до ближайшего города/форта для `near_settlements`
    pub settlement_band: DistanceBand,
    /// Диапазон расстояний до городов для `between_settlements`
    pub between_band: DistanceBand,
    pub river_bonus: f32,
    pub water_bonus: f32,
    pub strategic_bonus: f32,
    pub between_bonus: f32,
    /// Амплитуда случайной добавки к приоритету
    pub jitter: f32,
}

impl Default for PlacementHeuristics {
    fn default() -> Self {
        Self {
            commanding_view_neighbors: 4,
            route_detour_ratio: 0.3,
            pass_elevation_min: 0.65,
            river_crossing_elevation_min: 0.45,
            settlement_band: DistanceBand::new(2, 6),
            between_band: DistanceBand::new(2, 10),
            river_bonus: 2.0,
            water_bonus: 1.0,
            strategic_bonus: 1.5,
            between_bonus: 2.0,
            jitter: 0.1,
        }
    }
}

/// Пороги валидатора карты
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationSettings {
    pub water_ratio_min: f32,
    pub water_ratio_max: f32,
    /// С какой высоты клетка считается возвышенностью
    pub high_ground_elevation: f32,
    pub min_high_ground_ratio: f32,
    pub min_open_land_ratio: f32,
    /// Допустимый подъём высоты между соседними клетками реки
    pub flow_tolerance: f32,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            water_ratio_min: 0.05,
            water_ratio_max: 0.5,
            high_ground_elevation: 0.65,
            min_high_ground_ratio: 0.02,
            min_open_land_ratio: 0.05,
            flow_tolerance: 0.05,
        }
    }
}

/// Полная конфигурация генерации
///
/// Передаётся в генератор явно; сам крейт не читает файлы во время генерации.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapConfig {
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub terrain: TerrainSettings,
    #[serde(default)]
    pub rivers: RiverSettings,
    /// Правила по типам; порядок размещения задаёт [`LocationKind::ORDER`]
    #[serde(default = "default_location_rules")]
    pub locations: BTreeMap<LocationKind, LocationRule>,
    #[serde(default)]
    pub placement: PlacementHeuristics,
    #[serde(default)]
    pub validation: ValidationSettings,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            map: MapSettings::default(),
            terrain: TerrainSettings::default(),
            rivers: RiverSettings::default(),
            locations: default_location_rules(),
            placement: PlacementHeuristics::default(),
            validation: ValidationSettings::default(),
        }
    }
}

impl MapConfig {
    /// Загружает и проверяет конфигурацию из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// [map]
    /// width = 24
    /// height = 18
    ///
    /// [rivers]
    /// min_rivers = 2
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Конфигурация по умолчанию с другими размерами карты
    #[must_use]
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            map: MapSettings {
                width,
                height,
                ..MapSettings::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn location_rule(&self, kind: LocationKind) -> Option<&LocationRule> {
        self.locations.get(&kind)
    }

    /// Проверяет значения один раз при загрузке
    pub fn validate(&self) -> Result<()> {
        if self.map.width == 0 || self.map.height == 0 {
            return Err(MapgenError::invalid("map", "width and height must be positive"));
        }
        if self.map.hex_size <= 0.0 {
            return Err(MapgenError::invalid("map.hex_size", "must be positive"));
        }

        let terrain = &self.terrain;
        if terrain.rules.is_empty() {
            return Err(MapgenError::invalid("terrain.rules", "at least one rule is required"));
        }
        if terrain.default_terrain.is_empty() {
            return Err(MapgenError::invalid("terrain.default_terrain", "must not be empty"));
        }
        for rule in &terrain.rules {
            check_unit_range(
                &format!("terrain.rules.{}.elevation", rule.name),
                rule.elevation_min,
                rule.elevation_max,
            )?;
            check_unit_range(
                &format!("terrain.rules.{}.moisture", rule.name),
                rule.moisture_min,
                rule.moisture_max,
            )?;
        }
        for (field, noise) in [
            ("terrain.elevation_noise", &terrain.elevation_noise),
            ("terrain.moisture_noise", &terrain.moisture_noise),
        ] {
            if noise.octaves == 0 {
                return Err(MapgenError::invalid(field, "octaves must be at least 1"));
            }
            if noise.frequency <= 0.0 {
                return Err(MapgenError::invalid(field, "frequency must be positive"));
            }
        }
        if !(1..=6).contains(&terrain.smoothing.neighbor_threshold) {
            return Err(MapgenError::invalid(
                "terrain.smoothing.neighbor_threshold",
                "must be between 1 and 6",
            ));
        }

        let rivers = &self.rivers;
        if rivers.min_rivers > rivers.max_rivers {
            return Err(MapgenError::invalid("rivers", "min_rivers exceeds max_rivers"));
        }
        if rivers.min_river_length == 0 {
            return Err(MapgenError::invalid("rivers.min_river_length", "must be positive"));
        }

        for (kind, rule) in &self.locations {
            if rule.min_count > rule.max_count {
                return Err(MapgenError::invalid(
                    format!("locations.{kind}"),
                    "min_count exceeds max_count",
                ));
            }
            check_unit_range(
                &format!("locations.{kind}.elevation"),
                rule.elevation_min,
                rule.elevation_max,
            )?;
            if let Some(band) = rule.town_distance {
                if band.min > band.max {
                    return Err(MapgenError::invalid(
                        format!("locations.{kind}.town_distance"),
                        "min exceeds max",
                    ));
                }
            }
        }

        let placement = &self.placement;
        for (field, band) in [
            ("placement.settlement_band", placement.settlement_band),
            ("placement.between_band", placement.between_band),
        ] {
            if band.min > band.max {
                return Err(MapgenError::invalid(field, "min exceeds max"));
            }
        }
        if placement.commanding_view_neighbors > 6 {
            return Err(MapgenError::invalid(
                "placement.commanding_view_neighbors",
                "must not exceed 6",
            ));
        }

        let validation = &self.validation;
        if validation.water_ratio_min > validation.water_ratio_max {
            return Err(MapgenError::invalid(
                "validation",
                "water_ratio_min exceeds water_ratio_max",
            ));
        }
        Ok(())
    }
}

fn check_unit_range(field: &str, min: f32, max: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) {
        return Err(MapgenError::invalid(field, "range must lie within 0..=1"));
    }
    if min > max {
        return Err(MapgenError::invalid(field, "min exceeds max"));
    }
    Ok(())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_location_rules() -> BTreeMap<LocationKind, LocationRule> {
    let mut rules = BTreeMap::new();
    rules.insert(
        LocationKind::Town,
        LocationRule {
            terrain: strings(&["plains", "grassland", "forest", "desert", "hills"]),
            elevation_min: 0.27,
            elevation_max: 0.75,
            min_count: 1,
            max_count: 3,
            min_distance_same_type: 4,
            min_distance_any: 2,
            prefer_rivers: true,
            names: strings(&[
                "Dry Creek",
                "Redemption",
                "Silver Bluff",
                "Tombstone Flats",
                "Cedar Springs",
                "Dustwater",
                "Hollow Rock",
                "Sweetwater",
                "Copper Gulch",
                "Last Chance",
            ]),
            ..LocationRule::default()
        },
    );
    rules.insert(
        LocationKind::Fort,
        LocationRule {
            terrain: strings(&["hills", "plains", "grassland", "desert", "mountains"]),
            elevation_min: 0.35,
            elevation_max: 0.9,
            max_count: 2,
            min_distance_same_type: 5,
            min_distance_any: 2,
            strategic: true,
            names: strings(&["Fort Bastion", "Fort Kearny", "Fort Defiance", "Fort Sumner", "Fort Laramie"]),
            ..LocationRule::default()
        },
    );
    rules.insert(
        LocationKind::TradingPost,
        LocationRule {
            terrain: strings(&["plains", "grassland", "forest", "desert"]),
            elevation_min: 0.27,
            elevation_max: 0.7,
            max_count: 2,
            min_distance_same_type: 4,
            min_distance_any: 2,
            along_routes: true,
            prefer_rivers: true,
            names: strings(&["Bent's Post", "Beaver Post", "Crossroads Post", "Fur Exchange", "Pike's Post"]),
            ..LocationRule::default()
        },
    );
    rules.insert(
        LocationKind::Mission,
        LocationRule {
            terrain: strings(&["plains", "grassland", "desert", "forest"]),
            elevation_min: 0.27,
            elevation_max: 0.7,
            max_count: 2,
            min_distance_same_type: 5,
            min_distance_any: 2,
            town_distance: Some(DistanceBand::new(2, 7)),
            prefer_rivers: true,
            names: strings(&["San Miguel", "Santa Cruz", "San Gabriel", "Santa Ines", "San Rafael"]),
            ..LocationRule::default()
        },
    );
    rules.insert(
        LocationKind::Roadhouse,
        LocationRule {
            terrain: strings(&["plains", "grassland", "desert", "hills", "forest"]),
            elevation_min: 0.27,
            elevation_max: 0.75,
            max_count: 2,
            min_distance_same_type: 3,
            min_distance_any: 2,
            between_settlements: true,
            names: strings(&["Halfway House", "Stage Stop", "The Weary Mule", "Coyote Inn", "Dusty Rest"]),
            ..LocationRule::default()
        },
    );
    rules.insert(
        LocationKind::Cave,
        LocationRule {
            terrain: strings(&["hills", "mountains"]),
            elevation_min: 0.55,
            elevation_max: 0.95,
            max_count: 3,
            min_distance_same_type: 3,
            min_distance_any: 1,
            names: strings(&["Bat Cave", "Echo Cavern", "Miner's Hollow", "Rattlesnake Den", "Deep Hole"]),
            ..LocationRule::default()
        },
    );
    rules.insert(
        LocationKind::CaravanCamp,
        LocationRule {
            terrain: strings(&["plains", "desert", "grassland"]),
            elevation_min: 0.27,
            elevation_max: 0.65,
            water: WaterRequirement::AnyWater,
            max_count: 2,
            min_distance_same_type: 4,
            min_distance_any: 2,
            near_settlements: true,
            names: strings(&["Wagon Circle", "Dust Camp", "Oasis Camp", "Trail's End", "Muleskinner Camp"]),
            ..LocationRule::default()
        },
    );
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        MapConfig::default().validate().expect("default config must validate");
    }

    #[test]
    fn default_has_all_location_kinds() {
        let config = MapConfig::default();
        for kind in LocationKind::ORDER {
            assert!(config.location_rule(kind).is_some(), "missing rule for {kind}");
        }
    }

    #[test]
    fn toml_overrides_keep_other_defaults() {
        let config = MapConfig::from_toml_str(
            r#"
            [map]
            width = 12

            [rivers]
            min_rivers = 2
            max_rivers = 5
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.map.width, 12);
        assert_eq!(config.map.height, 30);
        assert_eq!(config.rivers.min_rivers, 2);
        assert_eq!(config.terrain.rules.len(), 9);
        assert_eq!(config.locations.len(), 7);
    }

    #[test]
    fn toml_location_table_uses_snake_case_keys() {
        let config = MapConfig::from_toml_str(
            r#"
            [locations.caravan_camp]
            terrain = ["desert"]
            min_count = 1
            max_count = 2
            "#,
        )
        .expect("valid toml");
        let rule = config.location_rule(LocationKind::CaravanCamp).expect("rule");
        assert_eq!(rule.terrain, vec!["desert".to_string()]);
        assert!(config.location_rule(LocationKind::Town).is_none());
    }

    #[test]
    fn rejects_inverted_river_counts() {
        let mut config = MapConfig::default();
        config.rivers.min_rivers = 5;
        config.rivers.max_rivers = 2;
        let err = config.validate().expect_err("must fail");
        assert!(matches!(err, MapgenError::InvalidConfig { .. }));
    }

    #[test]
    fn rejects_rule_outside_unit_range() {
        let mut config = MapConfig::default();
        config.terrain.rules[0].elevation_max = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_octaves() {
        let mut config = MapConfig::default();
        config.terrain.moisture_noise.octaves = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rule_matching_is_inclusive() {
        let rule = TerrainRule::new("x", (0.2, 0.4), (0.0, 1.0), 0, [0, 0, 0]);
        assert!(rule.matches(0.2, 0.0));
        assert!(rule.matches(0.4, 1.0));
        assert!(!rule.matches(0.41, 0.5));
    }
}
