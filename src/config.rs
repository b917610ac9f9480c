use crate::error::{AppError, Result};
use crate::grid::Coord;
use crate::playback::{DEFAULT_SPEED, MAX_SPEED, MIN_SPEED};
use crate::settings::SolverConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Largest grid the terminal canvas is expected to hold
pub const MAX_ROWS: usize = 100;
pub const MAX_COLS: usize = 150;

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    pub rows: usize,
    pub cols: usize,
    pub start: Coord,
    pub end: Coord,
    /// Playback speed (1-100)
    pub speed: u8,
    /// Base URL of the trace backend
    pub backend_url: String,
    /// Options forwarded to the solver
    pub solver: SolverConfig,
}

impl AppConfig {
    /// Export config to a JSON file, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// `~/.config/astar-trace-viewer/config.json` or platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("astar-trace-viewer").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 || self.rows > MAX_ROWS || self.cols > MAX_COLS {
            return Err(AppError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        for coord in [self.start, self.end] {
            if coord.row >= self.rows || coord.col >= self.cols {
                return Err(AppError::OutOfBounds {
                    row: coord.row,
                    col: coord.col,
                });
            }
        }
        if self.start == self.end {
            return Err(AppError::EndpointsOverlap {
                row: self.start.row,
                col: self.start.col,
            });
        }
        if !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(AppError::config(format!(
                "speed {} outside {MIN_SPEED}-{MAX_SPEED}",
                self.speed
            )));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            rows: 20,
            cols: 30,
            start: Coord::new(5, 5),
            end: Coord::new(5, 20),
            speed: DEFAULT_SPEED,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            solver: SolverConfig::default(),
        }
    }
}
