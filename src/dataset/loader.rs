use bevy::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::types::Dataset;
use crate::config::AppConfig;
use crate::filters::ViewFilters;

/// Reasons a dataset load can fail. Any of these is terminal.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid dataset JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the dataset document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Url(String),
    File(PathBuf),
}

impl DatasetSource {
    /// `http://` and `https://` locations are fetched, anything else is a file path.
    /// Relative file paths resolve against `base`.
    pub fn parse(location: &str, base: &Path) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DatasetSource::Url(trimmed.to_string())
        } else {
            let path = PathBuf::from(trimmed);
            if path.is_absolute() {
                DatasetSource::File(path)
            } else {
                DatasetSource::File(base.join(path))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DatasetSource::Url(url) => url.clone(),
            DatasetSource::File(path) => path.display().to_string(),
        }
    }
}

/// Parse a dataset document
pub fn parse_dataset(json: &str) -> Result<Dataset, DatasetError> {
    Ok(serde_json::from_str(json)?)
}

/// Fetch and parse the dataset (blocking, run off the main thread)
pub fn fetch_dataset(source: &DatasetSource) -> Result<Dataset, DatasetError> {
    let body = match source {
        DatasetSource::Url(url) => {
            info!("Fetching dataset from {}", url);
            reqwest::blocking::get(url)?.error_for_status()?.text()?
        }
        DatasetSource::File(path) => {
            info!("Reading dataset from {:?}", path);
            std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
                path: path.clone(),
                source,
            })?
        }
    };
    parse_dataset(&body)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    #[default]
    NotStarted,
    Loading,
    Ready,
    Failed,
}

/// Resource holding the loaded dataset.
///
/// `dataset` stays empty until `state` is `Ready` and is never modified after that.
#[derive(Resource, Default)]
pub struct AviationDataset {
    pub dataset: Dataset,
    pub state: LoadingState,
    /// Message of the load failure, shown in the panel
    pub error: Option<String>,
    /// Human-readable location the data was loaded from
    pub source: Option<String>,
}

type LoadResult = Arc<Mutex<Option<Result<Dataset, DatasetError>>>>;

/// Resource holding the shared handle to the background loading thread result.
#[derive(Resource)]
pub(crate) struct DatasetLoadHandle(LoadResult);

/// Startup system: spawns a background thread for the single dataset fetch.
pub fn start_dataset_loading(
    mut commands: Commands,
    mut data: ResMut<AviationDataset>,
    config: Res<AppConfig>,
) {
    if data.state != LoadingState::NotStarted {
        return;
    }

    let source = DatasetSource::parse(&config.dataset.source, &crate::paths::base_dir());
    data.state = LoadingState::Loading;
    data.source = Some(source.describe());
    info!("Starting dataset load from {}", source.describe());

    let result_handle: LoadResult = Arc::new(Mutex::new(None));
    let handle = result_handle.clone();

    std::thread::spawn(move || {
        let result = fetch_dataset(&source);
        let Ok(mut lock) = handle.lock() else {
            error!("Failed to acquire lock for dataset result");
            return;
        };
        *lock = Some(result);
    });

    commands.insert_resource(DatasetLoadHandle(result_handle));
}

/// Update system: moves the loaded dataset into the resource once the thread finishes.
pub fn poll_dataset_loading(
    mut commands: Commands,
    mut data: ResMut<AviationDataset>,
    mut filters: ResMut<ViewFilters>,
    load_handle: Option<Res<DatasetLoadHandle>>,
) {
    if data.state != LoadingState::Loading {
        return;
    }

    let Some(handle) = load_handle else {
        return;
    };

    let result = {
        let Ok(mut lock) = handle.0.lock() else {
            error!("Failed to acquire lock for dataset poll");
            return;
        };
        let Some(result) = lock.take() else {
            return;
        };
        result
    };
    commands.remove_resource::<DatasetLoadHandle>();

    match result {
        Ok(dataset) => {
            info!(
                "Dataset ready: {} waypoints, {} obstacles, {} airspace zones, {} procedures",
                dataset.waypoints.len(),
                dataset.obstacles.len(),
                dataset.airspace.len(),
                dataset.procedures.len(),
            );
            filters.0 = filters.0.clone().with_sources(dataset.waypoint_sources());
            data.dataset = dataset;
            data.state = LoadingState::Ready;
        }
        Err(e) => {
            error!("Failed to load dataset: {}", e);
            data.error = Some(e.to_string());
            data.state = LoadingState::Failed;
        }
    }
}
