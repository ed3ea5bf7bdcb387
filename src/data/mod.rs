pub mod bundle;
pub mod import;
pub mod validate;

use std::fs;
use std::path::Path;

use crate::data::bundle::BundleError;
use crate::planner::ranking::RankedTrial;

pub const DEFAULT_RESULTS_PATH: &str = "data/results.json";

pub fn save_results(results: &[RankedTrial], path: &str) -> Result<(), BundleError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(BundleError::Write)?;
        }
    }
    let serialized = serde_json::to_string_pretty(results).map_err(BundleError::Parse)?;
    fs::write(path, serialized).map_err(BundleError::Write)
}

pub fn load_results(path: &str) -> Result<Vec<RankedTrial>, BundleError> {
    let raw = fs::read_to_string(path).map_err(BundleError::Read)?;
    serde_json::from_str(&raw).map_err(BundleError::Parse)
}
