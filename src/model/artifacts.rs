//! Loading and caching of the pretrained artifacts.

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ArtifactPaths;
use crate::error::StartupError;
use crate::model::network::RegressionNetwork;
use crate::model::scaler::Scaler;

/// Columns of the feature vector: latitude, longitude, epoch seconds.
pub const FEATURE_COUNT: usize = 3;
pub const TARGET_COUNT: usize = 1;

/// Model plus its two fitted scalers. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub model: RegressionNetwork,
    pub input_scaler: Scaler,
    pub output_scaler: Scaler,
}

impl Artifacts {
    /// Validates that the three pieces fit the 1x3 -> 1x1 contract.
    pub fn new(
        model: RegressionNetwork,
        input_scaler: Scaler,
        output_scaler: Scaler,
    ) -> Result<Self, String> {
        check_model(&model)?;
        check_scaler(&input_scaler, "input", FEATURE_COUNT)?;
        check_scaler(&output_scaler, "output", TARGET_COUNT)?;
        Ok(Artifacts {
            model,
            input_scaler,
            output_scaler,
        })
    }

    /// Reads and checks each file on its own, so a failure names the file
    /// that caused it.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, StartupError> {
        info!(
            model = %paths.model.display(),
            input_scaler = %paths.input_scaler.display(),
            output_scaler = %paths.output_scaler.display(),
            "loading artifacts"
        );
        let model: RegressionNetwork = read_artifact(&paths.model)?;
        check_model(&model).map_err(|reason| invalid(&paths.model, reason))?;
        debug!(?model, "model decoded");

        let input_scaler: Scaler = read_artifact(&paths.input_scaler)?;
        check_scaler(&input_scaler, "input", FEATURE_COUNT)
            .map_err(|reason| invalid(&paths.input_scaler, reason))?;

        let output_scaler: Scaler = read_artifact(&paths.output_scaler)?;
        check_scaler(&output_scaler, "output", TARGET_COUNT)
            .map_err(|reason| invalid(&paths.output_scaler, reason))?;

        Ok(Artifacts {
            model,
            input_scaler,
            output_scaler,
        })
    }
}

fn check_model(model: &RegressionNetwork) -> Result<(), String> {
    model.validate()?;
    if model.input_size() != Some(FEATURE_COUNT) {
        return Err(format!(
            "model expects {:?} inputs, features have {FEATURE_COUNT}",
            model.input_size()
        ));
    }
    if model.output_size() != Some(TARGET_COUNT) {
        return Err(format!(
            "model produces {:?} outputs, expected {TARGET_COUNT}",
            model.output_size()
        ));
    }
    Ok(())
}

fn check_scaler(scaler: &Scaler, role: &str, width: usize) -> Result<(), String> {
    scaler.validate()?;
    if scaler.width() != width {
        return Err(format!(
            "{role} scaler fitted on {} columns, expected {width}",
            scaler.width()
        ));
    }
    Ok(())
}

fn invalid(path: &Path, reason: String) -> StartupError {
    StartupError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    }
}

/// Reads one bincode artifact from disk.
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, StartupError> {
    let data = std::fs::read(path).map_err(|source| StartupError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    bincode::deserialize(&data).map_err(|source| StartupError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Lazily loads the artifacts on first use and hands out the same shared
/// instance afterwards. There is no teardown and no reload.
#[derive(Debug)]
pub struct ArtifactCache {
    paths: ArtifactPaths,
    cell: OnceCell<Arc<Artifacts>>,
}

impl ArtifactCache {
    pub fn new(paths: ArtifactPaths) -> Self {
        ArtifactCache {
            paths,
            cell: OnceCell::new(),
        }
    }

    /// A cache that is already filled, for hosts that build artifacts in
    /// memory.
    pub fn preloaded(artifacts: Artifacts) -> Self {
        ArtifactCache {
            paths: ArtifactPaths::default(),
            cell: OnceCell::with_value(Arc::new(artifacts)),
        }
    }

    pub fn get(&self) -> Result<Arc<Artifacts>, StartupError> {
        self.cell
            .get_or_try_init(|| Artifacts::load(&self.paths).map(Arc::new))
            .map(Arc::clone)
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }
}
