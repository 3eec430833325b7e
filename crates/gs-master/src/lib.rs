//! Headless controller for the goatsynth player.
//!
//! Provides a unified API for loading songs, real-time playback and offline
//! rendering for the CLI.

mod config;
mod error;
mod wav;

use gs_audio::{AudioOutput, CpalOutput};
use gs_engine::chip::SILENCE;
use gs_engine::{Engine, SampleSink, VBI_COUNT};
use std::io::{Cursor, Seek, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

// Re-export common types so callers don't need gs-format/gs-engine directly.
pub use config::RenderConfig;
pub use error::PlayerError;
pub use gs_audio::AudioError;
pub use gs_engine::SAMPLE_RATE;
pub use gs_format::{LoadOptions, Song, SongError, SongInfo};
pub use wav::WavWriter;

/// Headless player: owns a song and manages playback.
#[derive(Default)]
pub struct Controller {
    song: Option<Arc<Song>>,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    samples_played: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Song management ---

    pub fn song(&self) -> Option<&Arc<Song>> {
        self.song.as_ref()
    }

    pub fn info(&self) -> Option<SongInfo> {
        self.song.as_ref().map(|song| song.info())
    }

    pub fn load(&mut self, data: &[u8]) -> Result<(), PlayerError> {
        self.load_with(data, &LoadOptions::default())
    }

    pub fn load_with(&mut self, data: &[u8], options: &LoadOptions) -> Result<(), PlayerError> {
        self.stop();
        self.song = Some(Arc::new(gs_format::load_song_with(data, options)?));
        Ok(())
    }

    fn engine(&self, subtune: usize) -> Result<Engine, PlayerError> {
        let song = self.song.clone().ok_or(PlayerError::NoSong)?;
        Ok(Engine::new(song, subtune)?)
    }

    // --- Real-time playback ---

    /// Start playing a subtune on the default audio device until the song
    /// ends or [`Controller::stop`] is called.
    pub fn play(&mut self, subtune: usize) -> Result<(), PlayerError> {
        self.stop();
        let engine = self.engine(subtune)?;

        let stop_signal = Arc::new(AtomicBool::new(false));
        let samples_played = Arc::new(AtomicU64::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stop = stop_signal.clone();
        let played = samples_played.clone();
        let done = finished.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let thread = std::thread::Builder::new()
            .name("gs-audio".into())
            .spawn(move || audio_thread(engine, ready_tx, stop, played, done))?;

        // Device errors surface here rather than on the audio thread
        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let _ = thread.join();
                return Err(err.into());
            }
            Err(_) => {
                let _ = thread.join();
                return Err(AudioError::Playback("audio thread exited".into()).into());
            }
        }

        self.playback = Some(PlaybackHandle {
            stop_signal,
            samples_played,
            finished,
            thread: Some(thread),
        });
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Relaxed))
    }

    /// Samples handed to the device so far, updated once per frame.
    pub fn samples_played(&self) -> u64 {
        self.playback
            .as_ref()
            .map_or(0, |p| p.samples_played.load(Ordering::Relaxed))
    }

    // --- Offline rendering ---

    /// Render into any sink. Returns the number of samples emitted.
    pub fn render_into<S>(&self, config: &RenderConfig, sink: &mut S) -> Result<u64, PlayerError>
    where
        S: SampleSink,
        PlayerError: From<S::Error>,
    {
        let mut engine = self.engine(config.subtune)?;
        let max_samples = config.max_samples();
        let loops = config.loops.max(1);
        let mut ends = 0;

        while engine.samples_emitted() < max_samples {
            if engine.step(sink)? {
                ends += 1;
                if ends >= loops {
                    break;
                }
            }
        }

        tracing::debug!(
            subtune = config.subtune,
            samples = engine.samples_emitted(),
            ends,
            "render complete"
        );
        Ok(engine.samples_emitted())
    }

    pub fn render_samples(&self, config: &RenderConfig) -> Result<Vec<u8>, PlayerError> {
        let mut samples = Vec::new();
        self.render_into(config, &mut samples)?;
        Ok(samples)
    }

    /// Stream a WAV file to `w`, returning it once the header is patched.
    pub fn render_wav<W: Write + Seek>(&self, config: &RenderConfig, w: W) -> Result<W, PlayerError> {
        let mut writer = WavWriter::new(w)?;
        self.render_into(config, &mut writer)?;
        Ok(writer.finish()?)
    }

    pub fn render_to_wav(&self, config: &RenderConfig) -> Result<Vec<u8>, PlayerError> {
        Ok(self.render_wav(config, Cursor::new(Vec::new()))?.into_inner())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(feature = "alloc_check")]
fn realtime<T>(f: impl FnOnce() -> T) -> T {
    assert_no_alloc::assert_no_alloc(f)
}

#[cfg(not(feature = "alloc_check"))]
fn realtime<T>(f: impl FnOnce() -> T) -> T {
    f()
}

fn audio_thread(
    mut engine: Engine,
    ready: SyncSender<Result<(), AudioError>>,
    stop_signal: Arc<AtomicBool>,
    samples_played: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
) {
    let opened = CpalOutput::new().and_then(|(mut output, consumer)| {
        output.build_stream(consumer)?;
        Ok(output)
    });
    let mut output = match opened {
        Ok(output) => output,
        Err(err) => {
            finished.store(true, Ordering::Relaxed);
            let _ = ready.send(Err(err));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let result = realtime(|| -> Result<bool, AudioError> {
        while !stop_signal.load(Ordering::Relaxed) {
            if engine.step(&mut output)? {
                return Ok(true);
            }
            if engine.samples_emitted() % VBI_COUNT as u64 == 0 {
                samples_played.store(engine.samples_emitted(), Ordering::Relaxed);
            }
        }
        Ok(false)
    });

    match result {
        Ok(true) => {
            tracing::debug!(samples = engine.samples_emitted(), "song finished");
            // Push silence through so the buffered tail reaches the device
            for _ in 0..SAMPLE_RATE / 10 {
                if !output.write_spin(SILENCE) {
                    break;
                }
            }
        }
        Ok(false) => tracing::debug!("playback stopped"),
        Err(err) => tracing::error!(%err, "playback aborted"),
    }

    samples_played.store(engine.samples_emitted(), Ordering::Relaxed);
    let _ = output.stop();
    finished.store(true, Ordering::Relaxed);
}
