//! Pretrained binary classifiers.
//!
//! The pipeline only sees the [`Classifier`] trait. The artifact shipped by
//! the training pipeline is an oblivious-tree ensemble exported as JSON and
//! is read by [`ObliviousForest`].

pub mod oblivious;

use std::path::Path;
use std::sync::Arc;

pub use oblivious::ObliviousForest;

use crate::error::Result;

/// A read-only binary classifier producing positive-class probabilities
///
/// Implementations are shared across request threads and must not mutate
/// state while scoring.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Number of values expected in each feature vector
    fn n_features(&self) -> usize;

    /// Names of the features in training order, when the artifact records
    /// them
    fn feature_names(&self) -> Option<&[String]>;

    /// Positive-class probability for one feature vector
    fn predict_proba(&self, features: &[f64]) -> f64;
}

/// Load the classifier artifact at `path`
///
/// # Errors
/// Returns a model error when the file is missing or inconsistent
pub fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>> {
    let forest = ObliviousForest::load(path)?;
    Ok(Arc::new(forest))
}
