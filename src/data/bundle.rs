//! Combined export: plan configuration, roster and ranked results in one
//! document, so a whole planning session can be saved and restored.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::Participant;
use crate::planner::ranking::RankedTrial;
use crate::planner::PlanConfig;

pub const DEFAULT_BUNDLE_PATH: &str = "data/bundle.json";
pub const DEFAULT_CONFIG_PATH: &str = "data/config.json";

#[derive(Debug)]
pub enum BundleError {
    Read(std::io::Error),
    Parse(serde_json::Error),
    Write(std::io::Error),
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read bundle: {err}"),
            Self::Parse(err) => write!(f, "failed to parse bundle JSON: {err}"),
            Self::Write(err) => write!(f, "failed to write bundle: {err}"),
        }
    }
}

impl std::error::Error for BundleError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanBundle {
    pub config: PlanConfig,
    pub roster: Vec<Participant>,
    #[serde(default)]
    pub results: Vec<RankedTrial>,
}

impl PlanBundle {
    pub fn save(&self, path: &str) -> Result<(), BundleError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(BundleError::Write)?;
            }
        }
        let serialized = serde_json::to_string_pretty(self).map_err(BundleError::Parse)?;
        fs::write(path, serialized).map_err(BundleError::Write)
    }

    pub fn load(path: &str) -> Result<Self, BundleError> {
        let raw = fs::read_to_string(path).map_err(BundleError::Read)?;
        serde_json::from_str(&raw).map_err(BundleError::Parse)
    }
}

/// Writes a plan configuration on its own, so a restored bundle leaves a
/// config file the `plan` command can point at directly.
pub fn save_config(config: &PlanConfig, path: &str) -> Result<(), BundleError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(BundleError::Write)?;
        }
    }
    let serialized = serde_json::to_string_pretty(config).map_err(BundleError::Parse)?;
    fs::write(path, serialized).map_err(BundleError::Write)
}
