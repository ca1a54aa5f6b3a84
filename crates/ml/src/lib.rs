//! # scout-ml
//!
//! Inference pipeline that turns a player's raw attribute ratings into a
//! predicted playing position:
//!
//! 1. [`features`] validates the request and derives the composite ratings.
//! 2. [`normalize`] applies the fitted per-dimension scaling.
//! 3. [`classifier`] maps the normalized vector to a class index and
//!    [`decoder`] turns that into a position label.
//!
//! [`artifact`] loads the fitted parameters once; [`predictor`] composes the
//! stages.

pub mod artifact;
pub mod classifier;
pub mod decoder;
pub mod error;
pub mod features;
pub mod model;
pub mod normalize;
pub mod predictor;

pub use artifact::ArtifactBundle;
pub use error::{ErrorKind, PredictError};
pub use features::RawPlayerAttributes;
pub use predictor::{PositionPredictor, Prediction};
