//! Synthesis and sequencing engine for goatsynth.
//!
//! A four-voice SID-style chip (three voices mixed) driven by a GTS5
//! sequencer. [`Engine`] ties the two to a fixed 16 kHz sample clock.

pub mod chip;
mod engine;
pub mod envelope;
pub mod frequency;
pub mod sequencer;
mod sink;
pub mod track;
pub mod voice;

pub use chip::{Chip, Register};
pub use engine::{Engine, SAMPLE_RATE, TICK_RATE, VBI_COUNT};
pub use envelope::EnvelopePhase;
pub use sequencer::Sequencer;
pub use sink::SampleSink;
pub use track::Track;
