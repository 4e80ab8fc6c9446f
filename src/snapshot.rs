// src/snapshot.rs
//! Сохранение и загрузка сгенерированной карты в JSON
//!
//! Производное состояние (`has_river`, `river_flow`, ссылки клеток на
//! локации) при загрузке пересчитывается из рек и локаций, а не берётся
//! из файла как есть. Ссылки за пределами сетки сохраняются, чтобы их
//! увидел валидатор.

use crate::error::{MapgenError, Result};
use crate::grid::{Cell, WorldGrid};
use crate::hex::AxialCoord;
use crate::locations::{Location, LocationId};
use crate::rivers::{River, stamp_path};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Текущая версия формата
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub version: u32,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub hex_size: f32,
    pub cells: Vec<Cell>,
    pub rivers: Vec<River>,
    pub locations: Vec<Location>,
}

/// Содержимое снимка, развёрнутое обратно в рабочие структуры
#[derive(Debug, Clone)]
pub struct RestoredMap {
    pub seed: u64,
    pub grid: WorldGrid,
    pub rivers: Vec<River>,
    pub locations: Vec<Location>,
}

impl MapSnapshot {
    #[must_use]
    pub fn from_parts(seed: u64, grid: &WorldGrid, rivers: &[River], locations: &[Location]) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            seed,
            width: grid.width,
            height: grid.height,
            hex_size: grid.hex_size,
            cells: grid.cells().cloned().collect(),
            rivers: rivers.to_vec(),
            locations: locations.to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(MapgenError::Snapshot(format!(
                "version {} is newer than supported {SNAPSHOT_VERSION}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Восстанавливает сетку, реки и локации
    ///
    /// Клетки вне размеров снимка отбрасываются; реки и локации остаются
    /// как есть, даже если ссылаются на отсутствующие координаты.
    pub fn restore(self, default_terrain: &str) -> Result<RestoredMap> {
        if self.width == 0 || self.height == 0 {
            return Err(MapgenError::Snapshot(format!(
                "invalid dimensions {}x{}",
                self.width, self.height
            )));
        }
        if self.hex_size <= 0.0 {
            return Err(MapgenError::Snapshot("hex_size must be positive".into()));
        }

        let mut grid = WorldGrid::new(self.width, self.height, self.hex_size, default_terrain);
        let mut dropped = 0;
        for record in self.cells {
            match grid.get_cell_mut(record.coords) {
                Some(cell) => {
                    *cell = Cell {
                        has_river: false,
                        river_flow: AxialCoord::ZERO,
                        location: None,
                        ..record
                    };
                }
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, "клетки снимка вне размеров карты отброшены");
        }

        for river in &self.rivers {
            stamp_path(&mut grid, &river.path);
        }
        for (i, location) in self.locations.iter().enumerate() {
            if let Some(cell) = grid.get_cell_mut(location.coords) {
                cell.location = Some(LocationId(i as u32));
            }
        }

        Ok(RestoredMap {
            seed: self.seed,
            grid,
            rivers: self.rivers,
            locations: self.locations,
        })
    }
}
