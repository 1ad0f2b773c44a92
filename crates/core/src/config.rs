//! Application Configuration
//!
//! Manages the designer settings:
//! - Grid editing mode and snapping
//! - Overlays (structure, debug)
//! - Preview geometry used when no renderer is attached

use std::path::{Path, PathBuf};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{RDroidError, Result};

/// How equidistant drop candidates are resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieBreak {
    /// Prefer dropping into an existing cell
    #[default]
    PreferExistingCell,
    /// Prefer creating a new row or column
    PreferNewBoundary,
}

/// Boolean grid settings that can be toggled by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFlag {
    GridMode,
    SnapToGrid,
    ShowStructure,
    DebugOverlay,
}

impl GridFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridFlag::GridMode => "grid-mode",
            GridFlag::SnapToGrid => "snap-to-grid",
            GridFlag::ShowStructure => "show-structure",
            GridFlag::DebugOverlay => "debug-overlay",
        }
    }
}

impl FromStr for GridFlag {
    type Err = RDroidError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "grid-mode" | "grid_mode" => Ok(GridFlag::GridMode),
            "snap-to-grid" | "snap_to_grid" | "snap" => Ok(GridFlag::SnapToGrid),
            "show-structure" | "show_structure" | "structure" => Ok(GridFlag::ShowStructure),
            "debug-overlay" | "debug_overlay" | "debug" => Ok(GridFlag::DebugOverlay),
            other => Err(RDroidError::Config(format!("Unknown grid setting: {}", other))),
        }
    }
}

/// GridLayout editor configuration, read at the start of each interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridEditorConfig {
    /// Drops snap to existing cells only (no new rows or columns)
    pub grid_mode: bool,
    /// Round new boundary offsets to `grid_size`
    pub snap_to_grid: bool,
    /// Draw row/column guide lines
    pub show_structure: bool,
    /// Draw cell indices and widget bounds
    pub debug_overlay: bool,
    /// Snap granularity in pixels
    pub grid_size: i32,
    /// Distance in pixels within which a drop snaps to an existing boundary
    pub snap_distance: i32,
    /// Size in pixels of rows and columns created by structural actions
    pub default_cell_size: i32,
    /// Pixels per dp, used when writing pixel sizes back as dp
    pub density: f32,
    /// Equidistant candidate resolution
    pub tie_break: TieBreak,
}

impl Default for GridEditorConfig {
    fn default() -> Self {
        Self {
            grid_mode: false,
            snap_to_grid: true,
            show_structure: false,
            debug_overlay: false,
            grid_size: 8,
            snap_distance: 10,
            default_cell_size: 48,
            density: 1.0,
            tie_break: TieBreak::default(),
        }
    }
}

impl GridEditorConfig {
    /// Flip a flag and return its new value
    pub fn toggle(&mut self, flag: GridFlag) -> bool {
        let value = match flag {
            GridFlag::GridMode => &mut self.grid_mode,
            GridFlag::SnapToGrid => &mut self.snap_to_grid,
            GridFlag::ShowStructure => &mut self.show_structure,
            GridFlag::DebugOverlay => &mut self.debug_overlay,
        };
        *value = !*value;
        debug!("Grid setting {} -> {}", flag.as_str(), *value);
        *value
    }

    /// Current value of a flag
    pub fn flag(&self, flag: GridFlag) -> bool {
        match flag {
            GridFlag::GridMode => self.grid_mode,
            GridFlag::SnapToGrid => self.snap_to_grid,
            GridFlag::ShowStructure => self.show_structure,
            GridFlag::DebugOverlay => self.debug_overlay,
        }
    }
}

/// Geometry used to lay out documents when no renderer supplies bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Width of one preview column in pixels
    pub cell_width: i32,
    /// Height of one preview row in pixels
    pub cell_height: i32,
    /// Position of the layout on the canvas
    pub origin_x: i32,
    pub origin_y: i32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            cell_width: 120,
            cell_height: 48,
            origin_x: 0,
            origin_y: 0,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// GridLayout editor settings
    pub grid: GridEditorConfig,
    /// Preview layout settings
    pub preview: PreviewConfig,
    /// Recently opened layout files
    pub recent_layouts: Vec<PathBuf>,
    /// Maximum recent layouts to store
    pub max_recent_layouts: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            grid: GridEditorConfig::default(),
            preview: PreviewConfig::default(),
            recent_layouts: Vec::new(),
            max_recent_layouts: 10,
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "rdroid", "R-Droid")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| RDroidError::Config("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| RDroidError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Load configuration from a file, writing defaults when it does not exist
    pub async fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {:?}", path);
            let contents = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save_to(path).await?;
            Ok(config)
        }
    }

    /// Save configuration to a file
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Add a recent layout file
    pub fn add_recent_layout(&mut self, path: PathBuf) {
        // Remove if already exists
        self.recent_layouts.retain(|p| p != &path);

        // Add to front
        self.recent_layouts.insert(0, path);

        // Trim to max size
        self.recent_layouts.truncate(self.max_recent_layouts);
    }
}
