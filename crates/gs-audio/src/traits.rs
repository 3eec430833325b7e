//! Audio output trait and error types.

use gs_engine::SampleSink;

/// Error type for audio operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Failed to initialize audio device
    #[error("device init error: {0}")]
    DeviceInit(String),
    /// Failed to create audio stream
    #[error("stream create error: {0}")]
    StreamCreate(String),
    /// Playback error
    #[error("playback error: {0}")]
    Playback(String),
    /// No audio device available
    #[error("no audio device available")]
    NoDevice,
    /// Output was stopped while samples were still being written
    #[error("output stopped")]
    Stopped,
}

/// Audio output backend: a blocking sample sink fed with unsigned 8-bit
/// mono samples at the engine rate.
pub trait AudioOutput: SampleSink<Error = AudioError> {
    /// Stop playback. Pending writes fail with [`AudioError::Stopped`].
    fn stop(&mut self) -> Result<(), AudioError>;
}
