//! Audio output backends for goatsynth.

mod cpal_backend;
mod traits;

pub use cpal_backend::{CpalOutput, Resampler};
pub use traits::{AudioError, AudioOutput};
