//! Configuration for the scoring service.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::util::safe_read_to_string;
use crate::error::{Error, Result};
use crate::scaler::ScalingMode;

/// Environment variable naming a JSON configuration file
pub const CONFIG_ENV: &str = "CARDIO_CONFIG";

/// Configuration for the scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Path of the classifier artifact, read once at startup
    pub model_path: PathBuf,
    /// How the scaled feature group is rescaled before inference
    pub scaling: ScalingMode,
    /// Column ranges used when `scaling` is `fitted`
    pub scaler_params_path: Option<PathBuf>,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            model_path: PathBuf::from("models/cardio_model.json"),
            scaling: ScalingMode::default(),
            scaler_params_path: None,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    /// Load a configuration from a JSON file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = safe_read_to_string(path, "service configuration")?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Invalid configuration {}: {e}", path.display())))
    }

    /// Apply `CARDIO_*` overrides looked up through `lookup`
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of an environment variable, if set
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("CARDIO_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(path) = lookup("CARDIO_MODEL_PATH") {
            self.model_path = PathBuf::from(path);
        }
        if let Some(mode) = lookup("CARDIO_SCALING") {
            self.scaling = mode.parse()?;
        }
        if let Some(path) = lookup("CARDIO_SCALER_PATH") {
            self.scaler_params_path = Some(PathBuf::from(path));
        }
        if let Some(limit) = lookup("CARDIO_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = limit.trim().parse().map_err(|_| {
                Error::Config(format!("CARDIO_MAX_UPLOAD_BYTES is not a size: '{limit}'"))
            })?;
        }
        Ok(self)
    }

    /// Resolve the configuration from an optional file and the process
    /// environment
    ///
    /// The file is the first of `explicit_path` and `CARDIO_CONFIG` that is
    /// set; without one the defaults are used.
    pub fn load(explicit_path: Option<PathBuf>) -> Result<Self> {
        let path = explicit_path.or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));
        let base = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                log::info!("No config file specified, using defaults");
                Self::default()
            }
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }
}
