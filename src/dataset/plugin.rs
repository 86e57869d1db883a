use bevy::prelude::*;

use super::{AviationDataset, start_dataset_loading, poll_dataset_loading};

pub struct DatasetPlugin;

impl Plugin for DatasetPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<AviationDataset>()
            .add_systems(Startup, start_dataset_loading)
            .add_systems(Update, poll_dataset_loading);
    }
}
