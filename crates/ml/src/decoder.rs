//! Class index to position label decoding.

use crate::error::PredictError;

/// Maps a class index back to the position name it was encoded from.
///
/// Index `i` is the `i`-th label in the order they were fitted (alphabetical
/// for most label encoders, but the manifest is the authority).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDecoder {
    labels: Vec<String>,
}

impl LabelDecoder {
    pub fn new(labels: Vec<String>) -> Result<Self, PredictError> {
        if labels.is_empty() {
            return Err(PredictError::integrity("label decoder has no labels"));
        }
        if let Some(blank) = labels.iter().position(|l| l.trim().is_empty()) {
            return Err(PredictError::integrity(format!("label {blank} is blank")));
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// An out-of-range index means classifier and decoder come from
    /// different training runs.
    pub fn decode(&self, index: usize) -> Result<&str, PredictError> {
        self.labels.get(index).map(String::as_str).ok_or_else(|| {
            PredictError::integrity(format!(
                "classifier returned class {index}, decoder knows 0..={}",
                self.labels.len() - 1
            ))
        })
    }
}
