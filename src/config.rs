use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

#[derive(Resource, Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub home: HomeConfig,
    pub camera: CameraConfig,
    pub ui: UiConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    /// URL (http/https) or file path of the dataset JSON
    pub source: String,
}

/// Home view the camera starts at and returns to
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct HomeConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub heading_deg: f32,
    pub pitch_deg: f32,
    /// Distance from camera to the home point
    pub range_m: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Duration of the fly-to-home animation
    pub flight_secs: f32,
    pub vertical_exaggeration: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Catppuccin flavor name for the UI chrome
    pub theme: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            source: "assets/data/aviation_data.json".to_string(),
        }
    }
}

impl Default for HomeConfig {
    fn default() -> Self {
        // RKPK (Gimhae International)
        Self {
            latitude: 35.1795,
            longitude: 128.9382,
            heading_deg: 0.0,
            pitch_deg: 35.0,
            range_m: 30_000.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            flight_secs: 2.0,
            vertical_exaggeration: 2.0,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "Mocha".to_string(),
        }
    }
}

fn config_path() -> PathBuf {
    crate::paths::config_dir().join(CONFIG_FILE)
}

/// Read config from `path`. Missing sections or fields take defaults.
pub fn read_config(path: &Path) -> Result<AppConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config: {}", e))?;
    toml::from_str(&contents).map_err(|e| format!("Failed to parse config: {}", e))
}

pub fn load_config() -> AppConfig {
    let path = config_path();
    if path.exists() {
        match read_config(&path) {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                return config;
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                return AppConfig::default();
            }
        }
    }

    let config = AppConfig::default();
    save_config(&config);
    config
}

pub fn save_config(config: &AppConfig) {
    let path = config_path();
    crate::paths::ensure_dir(crate::paths::config_dir().as_path());
    match toml::to_string_pretty(config) {
        Ok(contents) => {
            if let Err(e) = fs::write(&path, contents) {
                error!("Failed to write config: {}", e);
            } else {
                info!("Saved config to {:?}", path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(load_config());
    }
}
