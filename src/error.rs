// src/error.rs
//! Ошибки внешних границ крейта: загрузка конфигурации, снимки карт, экспорт.
//!
//! Сам конвейер генерации ошибок не возвращает — нехватка рек или локаций
//! передаётся данными в [`crate::validation::ValidationResult`].

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum MapgenError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Конфигурация прочитана, но содержит недопустимые значения
    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("image export failed: {0}")]
    Image(String),
}

impl MapgenError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapgenError>;
