//! Risk banding of single-record predictions.

use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of the LOW band, in percent
pub const LOW_UPPER: f64 = 10.0;
/// Upper bound (inclusive) of the MODERATE band, in percent
pub const MODERATE_UPPER: f64 = 30.0;

/// Discrete risk category with a fixed advisory message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    /// Band for a probability percentage: `p < 10` is LOW, `10 <= p <= 30`
    /// is MODERATE, anything above is HIGH
    #[must_use]
    pub fn from_percentage(p: f64) -> Self {
        if p < LOW_UPPER {
            Self::Low
        } else if p <= MODERATE_UPPER {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// Fixed advisory returned with single-record predictions
    ///
    /// English renderings of the messages the service was first deployed
    /// with, which were written in Russian.
    #[must_use]
    pub const fn advisory(self) -> &'static str {
        match self {
            Self::Low => "You have a low probability of cardiovascular disease.",
            Self::Moderate => {
                "You have a moderate risk of heart disease. Consulting a doctor is recommended."
            }
            Self::High => {
                "Warning! You have a high risk of cardiovascular disease! Please see a doctor!"
            }
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
