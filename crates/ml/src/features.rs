//! Feature derivation from a player's raw attribute ratings.
//!
//! [`RawPlayerAttributes`] is parsed from a field-name-keyed JSON object and
//! expanded into the fixed 10-dimensional [`DerivedFeatures`] vector the
//! scaler and classifier were fitted on. The normalizer only knows positions,
//! so [`DerivedFeatures::to_array`] is the single place the order is defined.

use serde_json::{Map, Value};

use crate::error::PredictError;

/// Request field names, in schema order.
pub const FIELD_NAMES: [&str; RawPlayerAttributes::NUM_FIELDS] = [
    "weak_foot",
    "pace",
    "shooting",
    "passing",
    "dribbling",
    "defending",
    "physicality",
    "height_cm",
];

/// Model input names, in the order the artifact was trained on.
pub const FEATURE_NAMES: [&str; DerivedFeatures::NUM_FEATURES] = [
    "weak_foot",
    "pace",
    "shooting",
    "passing",
    "dribbling",
    "defending",
    "physicality",
    "height_cm",
    "attacking",
    "defensive",
];

/// Raw ratings supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPlayerAttributes {
    /// Weak foot rating (1–5 in most data sets).
    pub weak_foot: f64,
    pub pace: f64,
    pub shooting: f64,
    pub passing: f64,
    pub dribbling: f64,
    pub defending: f64,
    pub physicality: f64,
    /// Height in centimetres.
    pub height_cm: f64,
}

impl RawPlayerAttributes {
    pub const NUM_FIELDS: usize = 8;

    /// Parse the eight required fields from an untrusted JSON object.
    ///
    /// Numbers and numeric strings are accepted. Every missing or unusable
    /// field is reported at once; nothing is defaulted. Extra keys are ignored.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, PredictError> {
        let mut values = [0.0; Self::NUM_FIELDS];
        let mut missing = Vec::new();
        let mut invalid = Vec::new();

        for (slot, &name) in values.iter_mut().zip(FIELD_NAMES.iter()) {
            match fields.get(name) {
                None => missing.push(name),
                Some(v) => match coerce_number(v) {
                    Some(x) => *slot = x,
                    None => invalid.push(name),
                },
            }
        }

        if !missing.is_empty() || !invalid.is_empty() {
            return Err(PredictError::Validation { missing, invalid });
        }

        let [weak_foot, pace, shooting, passing, dribbling, defending, physicality, height_cm] =
            values;
        Ok(Self {
            weak_foot,
            pace,
            shooting,
            passing,
            dribbling,
            defending,
            physicality,
            height_cm,
        })
    }

    /// Compute the derived vector. Called once per request; nothing is cached.
    ///
    /// Inputs are finite, but large enough ratings still overflow the sums;
    /// that is reported against the fields feeding the composite.
    pub fn derive(&self) -> Result<DerivedFeatures, PredictError> {
        let derived = DerivedFeatures {
            raw: *self,
            attacking: (self.shooting + self.passing + self.dribbling) / 3.0,
            defensive: (self.defending + self.physicality) / 2.0,
        };

        let mut invalid = Vec::new();
        if !derived.attacking.is_finite() {
            invalid.extend_from_slice(DerivedFeatures::sources(8));
        }
        if !derived.defensive.is_finite() {
            invalid.extend_from_slice(DerivedFeatures::sources(9));
        }
        if !invalid.is_empty() {
            return Err(PredictError::Validation {
                missing: Vec::new(),
                invalid,
            });
        }
        Ok(derived)
    }
}

/// A JSON number, or a string holding one. Non-finite values are rejected.
fn coerce_number(value: &Value) -> Option<f64> {
    let x = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}

/// Raw attributes plus the two composite ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    pub raw: RawPlayerAttributes,
    /// Mean of shooting, passing and dribbling.
    pub attacking: f64,
    /// Mean of defending and physicality.
    pub defensive: f64,
}

impl DerivedFeatures {
    pub const NUM_FEATURES: usize = 10;

    /// Request fields that feed dimension `dim` of [`Self::to_array`].
    pub fn sources(dim: usize) -> &'static [&'static str] {
        match dim {
            8 => &FIELD_NAMES[2..5],
            9 => &FIELD_NAMES[5..7],
            d if d < RawPlayerAttributes::NUM_FIELDS => &FIELD_NAMES[d..=d],
            _ => &[],
        }
    }

    /// Flatten in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; Self::NUM_FEATURES] {
        let r = &self.raw;
        [
            r.weak_foot,
            r.pace,
            r.shooting,
            r.passing,
            r.dribbling,
            r.defending,
            r.physicality,
            r.height_cm,
            self.attacking,
            self.defensive,
        ]
    }
}
