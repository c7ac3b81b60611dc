use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::OnceCell;

use super::loader;
use super::model::ShipmentDataset;

/// The dataset of this process. Written once, then only read.
static DATASET: OnceCell<Arc<ShipmentDataset>> = OnceCell::new();

/// Load and derive the dataset on first call; later calls return the cached
/// instance and ignore their arguments. The returned handle is read-only.
pub fn load_once(path: &Path, route_separator: &str) -> Result<Arc<ShipmentDataset>> {
    DATASET
        .get_or_try_init(|| loader::load_file(path, route_separator).map(Arc::new))
        .cloned()
}
