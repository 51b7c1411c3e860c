//! Presence checks run ahead of every other pipeline stage.
//!
//! Only attribute names are inspected. Value types and ranges are left to
//! the feature engineer.

use rustc_hash::FxHashSet;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::schema::REQUIRED_FIELDS;

/// Required fields absent from `present`, in canonical order
#[must_use]
pub fn missing_fields(present: &FxHashSet<&str>) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .into_iter()
        .filter(|name| !present.contains(name))
        .collect()
}

/// Check that a set of column names carries every required attribute
///
/// # Errors
/// Returns [`Error::MissingFields`] naming each absent column
pub fn validate_columns<'a, I>(columns: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: FxHashSet<&str> = columns.into_iter().collect();
    let missing = missing_fields(&present);
    if missing.is_empty() {
        Ok(())
    } else {
        log::debug!("Rejecting input with missing columns: {missing:?}");
        Err(Error::missing_fields(missing))
    }
}

/// Check a single-record payload and return it as a JSON object
///
/// # Errors
/// Returns [`Error::InvalidPayload`] when the payload is not an object and
/// [`Error::MissingFields`] when required keys are absent
pub fn validate_record(payload: &Value) -> Result<&Map<String, Value>> {
    let object = payload
        .as_object()
        .ok_or_else(|| Error::InvalidPayload("expected a JSON object".to_string()))?;
    validate_columns(object.keys().map(String::as_str))?;
    Ok(object)
}
