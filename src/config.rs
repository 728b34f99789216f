// src/config.rs - Host configuration for the panel controller
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub machine: MachineConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub heaters: HeaterConfig,

    #[serde(default)]
    pub presets: PresetConfig,

    #[serde(default)]
    pub mesh: MeshConfig,
}

/// Serial link to the TFT panel.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PanelConfig {
    pub port: String,
    pub baud: u32,

    /// Which panel revision is attached. `auto` probes at startup.
    pub kind: PanelKindConfig,

    /// How long the panel takes to finish its boot animation before it will
    /// accept serial traffic.
    pub boot_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PanelKindConfig {
    #[default]
    Auto,
    Standard,
    New,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Prefix of the firmware's ready status line.
    pub name: String,

    /// Version string reported to the panel on A33.
    pub version: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory served to the panel as the SD card root.
    pub root: String,
}

/// Heater sanity limits and the windows used for "heating done" detection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaterConfig {
    pub hotend_min: f32,
    pub hotend_max: f32,
    pub bed_min: f32,
    pub bed_max: f32,

    pub temp_window: f32,
    pub bed_temp_window: f32,

    /// Coldest hotend allowed to drive the filament load/unload macros.
    pub extrude_min_temp: f32,
}

/// Preheat presets exposed on the panel (PLA and ABS buttons).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PresetConfig {
    pub preheat1_hotend: f32,
    pub preheat1_bed: f32,
    pub preheat2_hotend: f32,
    pub preheat2_bed: f32,
}

/// Bed-leveling mesh geometry: grid size plus the bed coordinates of cell
/// (0,0) and the pitch between adjacent cells.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MeshConfig {
    pub grid_x: u8,
    pub grid_y: u8,
    pub origin_x: f32,
    pub origin_y: f32,
    pub pitch: f32,

    /// Per-cell clamp range for mesh edits.
    pub cell_floor: f32,
    pub cell_ceiling: f32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud: 115200,
            kind: PanelKindConfig::Auto,
            boot_delay_ms: 1000,
        }
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "Chiron".to_string(),
            version: "2.1.2".to_string(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: "gcodes".to_string(),
        }
    }
}

impl Default for HeaterConfig {
    fn default() -> Self {
        Self {
            hotend_min: 5.0,
            hotend_max: 275.0,
            bed_min: 5.0,
            bed_max: 120.0,
            temp_window: 1.0,
            bed_temp_window: 1.0,
            extrude_min_temp: 170.0,
        }
    }
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            preheat1_hotend: 190.0,
            preheat1_bed: 60.0,
            preheat2_hotend: 240.0,
            preheat2_bed: 90.0,
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            grid_x: 5,
            grid_y: 5,
            origin_x: 17.0,
            origin_y: 20.0,
            pitch: 93.0,
            cell_floor: -5.0,
            cell_ceiling: 2.0,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }
}
