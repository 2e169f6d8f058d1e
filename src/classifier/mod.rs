//! Wake request classification.
//!
//! Decides whether a captured frame is a wake request and which address it
//! targets.

mod frame_classifier;

pub use frame_classifier::{FrameClassifier, ValidationMode};
