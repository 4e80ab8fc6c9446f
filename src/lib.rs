pub mod config;
pub mod error;
pub mod generator;
pub mod grid;
pub mod hex;
pub mod locations;
pub mod preview;
pub mod rivers;
pub mod snapshot;
pub mod terrain;
pub mod validation;

pub use config::MapConfig;
pub use error::{MapgenError, Result};
pub use generator::{DEFAULT_MAX_ATTEMPTS, GenerationStage, MapGenerator, ProgressObserver};
pub use grid::{Cell, WorldGrid};
pub use hex::{AxialCoord, CubeCoord, OffsetCoord};
pub use locations::{Location, LocationKind, LocationPlacer};
pub use rivers::{River, RiverGenerator};
pub use snapshot::MapSnapshot;
pub use terrain::TerrainGenerator;
pub use validation::{MapValidator, ValidationResult};
