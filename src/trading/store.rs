use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::trading::position::Position;

/// Backing storage for the active position set. Both operations work on the
/// whole set; `replace` must be atomic.
pub trait PositionStore {
    fn load(&self) -> Result<Vec<Position>, StoreError>;
    fn replace(&mut self, positions: &[Position]) -> Result<(), StoreError>;
}

/// Pretty-printed JSON array on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl PositionStore for JsonFileStore {
    /// Missing or unparseable files read as an empty set; unreadable rows are skipped.
    fn load(&self) -> Result<Vec<Position>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No position log at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows = match serde_json::from_str::<Vec<serde_json::Value>>(&content) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    "Position log {} is corrupt ({}), treating as empty",
                    self.path.display(),
                    e
                );
                return Ok(Vec::new());
            }
        };

        // One bad row costs only that row.
        let positions = rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, row)| match serde_json::from_value::<Position>(row) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Skipping row {} of {}: {}", i, self.path.display(), e);
                    None
                }
            })
            .collect();
        Ok(positions)
    }

    /// Write to a sibling temp file then rename over the target.
    fn replace(&mut self, positions: &[Position]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }

        let json = serde_json::to_string_pretty(positions)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        Ok(())
    }
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    positions: Vec<Position>,
    pub writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_positions(positions: Vec<Position>) -> Self {
        Self {
            positions,
            writes: 0,
        }
    }
}

impl PositionStore for MemoryStore {
    fn load(&self) -> Result<Vec<Position>, StoreError> {
        Ok(self.positions.clone())
    }

    fn replace(&mut self, positions: &[Position]) -> Result<(), StoreError> {
        self.positions = positions.to_vec();
        self.writes += 1;
        Ok(())
    }
}
