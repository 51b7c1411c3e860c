//! Inference engine wrapping the process-wide classifier.

use std::path::Path;
use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use crate::classifier::{Classifier, load_classifier};
use crate::error::{Error, Result};
use crate::features::FeatureMatrix;
use crate::schema::FeatureLayout;

/// Rows per rayon task when scoring a batch
const SCORING_CHUNK_ROWS: usize = 1024;

/// Read-only handle to a loaded classifier and the feature order it expects
///
/// Cloning shares the classifier.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    classifier: Arc<dyn Classifier>,
    layout: FeatureLayout,
}

impl InferenceEngine {
    /// Wrap a loaded classifier
    ///
    /// The layout comes from the classifier's own feature names when it has
    /// them and defaults to the canonical order otherwise.
    ///
    /// # Errors
    /// Returns [`Error::Model`] when the layout and the classifier disagree
    /// on the number of features
    pub fn new(classifier: Arc<dyn Classifier>) -> Result<Self> {
        let layout = match classifier.feature_names() {
            Some(names) => FeatureLayout::from_names(names)?,
            None => FeatureLayout::default(),
        };

        if layout.len() != classifier.n_features() {
            return Err(Error::Model(format!(
                "Classifier expects {} features but the layout has {}",
                classifier.n_features(),
                layout.len()
            )));
        }

        Ok(Self { classifier, layout })
    }

    /// Load the classifier artifact at `path`
    pub fn load(path: &Path) -> Result<Self> {
        Self::new(load_classifier(path)?)
    }

    #[must_use]
    pub const fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Positive-class probability in [0, 1] for every row of `matrix`
    ///
    /// # Errors
    /// Returns [`Error::Inference`] when the matrix width does not match the
    /// classifier or the classifier returns something outside [0, 1]
    pub fn predict_proba(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>> {
        if matrix.num_rows() > 0 && matrix.width() != self.classifier.n_features() {
            return Err(Error::Inference(format!(
                "Feature vectors have {} values, classifier expects {}",
                matrix.width(),
                self.classifier.n_features()
            )));
        }

        let probabilities: Vec<f64> = matrix
            .as_slice()
            .par_chunks(matrix.width().max(1) * SCORING_CHUNK_ROWS)
            .flat_map_iter(|chunk| {
                chunk
                    .chunks_exact(matrix.width().max(1))
                    .map(|row| self.classifier.predict_proba(row))
                    .collect::<Vec<_>>()
            })
            .collect();

        if let Some((row, p)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.is_finite() && (0.0..=1.0).contains(*p)))
        {
            return Err(Error::Inference(format!(
                "Classifier returned {p} for row {row}"
            )));
        }

        debug!("Scored {} rows", probabilities.len());
        Ok(probabilities)
    }
}
