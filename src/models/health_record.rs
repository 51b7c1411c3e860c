//! Health record entity model
//!
//! A [`HealthRecord`] holds the eleven measured attributes of one person.
//! Records arrive as JSON objects in single mode and are lowered into a
//! one-row `RecordBatch` so that single and batch requests share one
//! scoring path.

use arrow::record_batch::RecordBatch;
use arrow_schema::FieldRef;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::schema;

/// Measured attributes of one person
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Height in centimetres
    pub height: f64,
    /// Weight in kilograms
    pub weight: f64,
    /// Systolic blood pressure
    pub ap_hi: f64,
    /// Diastolic blood pressure
    pub ap_lo: f64,
    /// Age in whole years
    pub age_years: f64,
    pub gender: f64,
    /// Cholesterol category (1 normal, 2 above normal, 3 well above normal)
    pub cholesterol: f64,
    /// Glucose category, same coding as cholesterol
    pub gluc: f64,
    pub smoke: f64,
    pub alco: f64,
    /// Physical activity flag
    pub active: f64,
}

impl HealthRecord {
    /// Build a record from a JSON object that has already passed validation
    ///
    /// Numeric strings are accepted; anything else is a
    /// [`Error::MalformedValue`]. Extra keys are ignored.
    pub fn from_json(object: &Map<String, Value>) -> Result<Self> {
        let field = |name: &str| -> Result<f64> {
            match object.get(name) {
                Some(Value::Number(n)) => n
                    .as_f64()
                    .ok_or_else(|| Error::malformed(name, 0, format!("{n} is not representable"))),
                Some(Value::Bool(b)) => Ok(f64::from(u8::from(*b))),
                Some(Value::String(s)) => s
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| Error::malformed(name, 0, format!("'{s}' is not numeric"))),
                Some(Value::Null) => Err(Error::malformed(name, 0, "null value")),
                Some(other) => Err(Error::malformed(name, 0, format!("{other} is not numeric"))),
                None => Err(Error::missing_fields([name])),
            }
        };

        Ok(Self {
            height: field(schema::HEIGHT)?,
            weight: field(schema::WEIGHT)?,
            ap_hi: field(schema::AP_HI)?,
            ap_lo: field(schema::AP_LO)?,
            age_years: field(schema::AGE_YEARS)?,
            gender: field(schema::GENDER)?,
            cholesterol: field(schema::CHOLESTEROL)?,
            gluc: field(schema::GLUC)?,
            smoke: field(schema::SMOKE)?,
            alco: field(schema::ALCO)?,
            active: field(schema::ACTIVE)?,
        })
    }

    /// Lower records into a `RecordBatch` using `serde_arrow`
    pub fn to_record_batch(records: &[Self]) -> Result<RecordBatch> {
        let fields = Vec::<FieldRef>::from_type::<Self>(TracingOptions::default())?;
        let batch = serde_arrow::to_record_batch(&fields, &records)?;
        Ok(batch)
    }
}
