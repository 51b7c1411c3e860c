//! Column names and feature layout for cardiovascular health records.
//!
//! The classifier consumes twelve features: the eleven measured attributes
//! plus the derived body-mass index. They fall into two disjoint groups,
//! the *scaled* group rescaled before inference and the *pass-through*
//! group handed to the classifier unchanged.

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};

pub const HEIGHT: &str = "height";
pub const WEIGHT: &str = "weight";
pub const AP_HI: &str = "ap_hi";
pub const AP_LO: &str = "ap_lo";
pub const AGE_YEARS: &str = "age_years";
pub const GENDER: &str = "gender";
pub const CHOLESTEROL: &str = "cholesterol";
pub const GLUC: &str = "gluc";
pub const SMOKE: &str = "smoke";
pub const ALCO: &str = "alco";
pub const ACTIVE: &str = "active";
pub const BMI: &str = "bmi";

/// Name of the column appended to batch output
pub const PROBABILITY_COLUMN: &str = "Disease Probability (%)";

/// Attributes every record must carry, in canonical order
pub const REQUIRED_FIELDS: [&str; 11] = [
    HEIGHT,
    WEIGHT,
    AP_HI,
    AP_LO,
    AGE_YEARS,
    GENDER,
    CHOLESTEROL,
    GLUC,
    SMOKE,
    ALCO,
    ACTIVE,
];

/// A single classifier input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Height,
    Weight,
    ApHi,
    ApLo,
    AgeYears,
    Bmi,
    Gender,
    Cholesterol,
    Gluc,
    Smoke,
    Alco,
    Active,
}

impl Feature {
    /// Every feature, scaled group first
    pub const ALL: [Self; 12] = [
        Self::Height,
        Self::Weight,
        Self::ApHi,
        Self::ApLo,
        Self::AgeYears,
        Self::Bmi,
        Self::Gender,
        Self::Cholesterol,
        Self::Gluc,
        Self::Smoke,
        Self::Alco,
        Self::Active,
    ];

    /// Features rescaled into [-1, 1] before inference
    pub const SCALED: [Self; 6] = [
        Self::Height,
        Self::Weight,
        Self::ApHi,
        Self::ApLo,
        Self::AgeYears,
        Self::Bmi,
    ];

    /// Features passed to the classifier unchanged
    pub const PASS_THROUGH: [Self; 6] = [
        Self::Gender,
        Self::Cholesterol,
        Self::Gluc,
        Self::Smoke,
        Self::Alco,
        Self::Active,
    ];

    /// Column name of this feature
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Height => HEIGHT,
            Self::Weight => WEIGHT,
            Self::ApHi => AP_HI,
            Self::ApLo => AP_LO,
            Self::AgeYears => AGE_YEARS,
            Self::Bmi => BMI,
            Self::Gender => GENDER,
            Self::Cholesterol => CHOLESTEROL,
            Self::Gluc => GLUC,
            Self::Smoke => SMOKE,
            Self::Alco => ALCO,
            Self::Active => ACTIVE,
        }
    }

    /// Look up a feature by column name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.name() == name)
    }

    /// Position of this feature in [`Feature::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn is_scaled(self) -> bool {
        matches!(
            self,
            Self::Height | Self::Weight | Self::ApHi | Self::ApLo | Self::AgeYears | Self::Bmi
        )
    }

    /// Whether the value comes from the input rather than being derived
    #[must_use]
    pub const fn is_required_input(self) -> bool {
        !matches!(self, Self::Bmi)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Order in which features are laid out in a feature vector
///
/// The default layout is [`Feature::ALL`]. A classifier that names its
/// inputs dictates its own order through [`FeatureLayout::from_names`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayout {
    order: Vec<Feature>,
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self {
            order: Feature::ALL.to_vec(),
        }
    }
}

impl FeatureLayout {
    /// Build a layout from the feature names a classifier was trained on
    ///
    /// # Errors
    /// Returns [`Error::Model`] for unknown or repeated names
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref();
            let feature = Feature::from_name(name)
                .ok_or_else(|| Error::Model(format!("Unknown model feature '{name}'")))?;
            if !seen.insert(feature) {
                return Err(Error::Model(format!("Model feature '{name}' listed twice")));
            }
            order.push(feature);
        }

        if order.is_empty() {
            return Err(Error::Model("Model declares no features".to_string()));
        }

        Ok(Self { order })
    }

    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Position of `feature` in the vector, if the layout uses it
    #[must_use]
    pub fn position(&self, feature: Feature) -> Option<usize> {
        self.order.iter().position(|f| *f == feature)
    }
}
