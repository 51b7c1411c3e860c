//! Min-max scaling of the scaled feature group into [-1, 1].
//!
//! Three modes are supported:
//! - [`ScalingMode::PerRequest`] fits min/max on the rows of the current
//!   request. A single-row request therefore always yields `0.0`.
//! - [`ScalingMode::Fitted`] uses ranges persisted next to the model and
//!   clips out-of-range values.
//! - [`ScalingMode::Disabled`] leaves every feature untouched.
//!
//! A zero-range column maps to `0.0` in every mode.

use std::path::Path;
use std::str::FromStr;

use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::util::safe_read_to_string;
use crate::error::{Error, Result};
use crate::features::DerivedColumns;
use crate::schema::Feature;

/// Lower bound of the scaled range
pub const SCALED_MIN: f64 = -1.0;
/// Upper bound of the scaled range
pub const SCALED_MAX: f64 = 1.0;

/// How the scaled feature group is rescaled before inference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Skip the scaling stage
    Disabled,
    /// Fit min/max on the values of each request
    #[default]
    PerRequest,
    /// Use min/max loaded at startup
    Fitted,
}

impl FromStr for ScalingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            "per_request" | "per-request" => Ok(Self::PerRequest),
            "fitted" => Ok(Self::Fitted),
            other => Err(Error::Config(format!(
                "Unknown scaling mode '{other}'. Use 'disabled', 'per_request' or 'fitted'."
            ))),
        }
    }
}

/// Observed range of one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: f64,
    pub max: f64,
}

impl ColumnRange {
    /// Fit the range of `values`; `None` when there are no values
    #[must_use]
    pub fn fit(values: &[f64]) -> Option<Self> {
        let (first, rest) = values.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((*first, *first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(Self { min, max })
    }

    /// Map `value` into [`SCALED_MIN`, `SCALED_MAX`]
    ///
    /// A zero-range or non-finite range maps to `0.0`. Values outside the
    /// range are clipped when `clip` is set.
    #[must_use]
    pub fn scale(&self, value: f64, clip: bool) -> f64 {
        let span = self.max - self.min;
        if !(span.is_finite() && span > 0.0) {
            return 0.0;
        }
        let scaled = SCALED_MIN + (SCALED_MAX - SCALED_MIN) * (value - self.min) / span;
        if clip {
            scaled.clamp(SCALED_MIN, SCALED_MAX)
        } else {
            scaled
        }
    }
}

/// Column ranges persisted alongside the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub columns: FxHashMap<String, ColumnRange>,
}

impl ScalerParams {
    /// Load parameters from a JSON file
    ///
    /// # Errors
    /// Returns an error when the file is unreadable, malformed, or lacks a
    /// range for one of the scaled features
    pub fn load(path: &Path) -> Result<Self> {
        let contents = safe_read_to_string(path, "scaler parameters")?;
        let params: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Invalid scaler parameters: {e}")))?;
        params.check()?;
        info!("Loaded scaler parameters from {}", path.display());
        Ok(params)
    }

    fn check(&self) -> Result<()> {
        for feature in Feature::SCALED {
            let range = self.range(feature).ok_or_else(|| {
                Error::Config(format!("Scaler parameters lack a range for '{feature}'"))
            })?;
            if !(range.min.is_finite() && range.max.is_finite()) || range.min > range.max {
                return Err(Error::Config(format!(
                    "Scaler range for '{feature}' is invalid: [{}, {}]",
                    range.min, range.max
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn range(&self, feature: Feature) -> Option<ColumnRange> {
        self.columns.get(feature.name()).copied()
    }
}

/// The scaling stage of the pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Scaler {
    Disabled,
    #[default]
    PerRequest,
    Fitted(ScalerParams),
}

impl Scaler {
    /// Build the stage for `mode`, loading parameters when required
    ///
    /// # Errors
    /// Returns [`Error::Config`] when `Fitted` is requested without a
    /// parameters file, or the file cannot be loaded
    pub fn from_mode(mode: ScalingMode, params_path: Option<&Path>) -> Result<Self> {
        match mode {
            ScalingMode::Disabled => Ok(Self::Disabled),
            ScalingMode::PerRequest => Ok(Self::PerRequest),
            ScalingMode::Fitted => {
                let path = params_path.ok_or_else(|| {
                    Error::Config("Fitted scaling requires a scaler parameters path".to_string())
                })?;
                Ok(Self::Fitted(ScalerParams::load(path)?))
            }
        }
    }

    #[must_use]
    pub const fn mode(&self) -> ScalingMode {
        match self {
            Self::Disabled => ScalingMode::Disabled,
            Self::PerRequest => ScalingMode::PerRequest,
            Self::Fitted(_) => ScalingMode::Fitted,
        }
    }

    /// Rescale the scaled feature group of `columns` in place
    pub fn transform(&self, columns: &mut DerivedColumns) {
        if matches!(self, Self::Disabled) {
            return;
        }

        for feature in Feature::SCALED {
            let values = columns.column_mut(feature);
            let (range, clip) = match self {
                Self::Disabled => return,
                Self::PerRequest => match ColumnRange::fit(values) {
                    Some(range) => (range, false),
                    None => continue,
                },
                Self::Fitted(params) => match params.range(feature) {
                    Some(range) => (range, true),
                    None => continue,
                },
            };

            for value in values.iter_mut() {
                *value = range.scale(*value, clip);
            }
            debug!(
                "Scaled '{feature}' with range [{}, {}]",
                range.min, range.max
            );
        }
    }
}
