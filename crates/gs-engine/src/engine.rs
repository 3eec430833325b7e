//! Sample clock driving the chip and the sequencer.

use std::sync::Arc;

use gs_format::{Song, SongError};

use crate::chip::{Chip, SILENCE};
use crate::sequencer::Sequencer;
use crate::sink::SampleSink;
use crate::track::Track;

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 16_000;

/// Sequencer frames per second.
pub const TICK_RATE: u32 = 50;

/// Samples per sequencer frame.
pub const VBI_COUNT: u32 = SAMPLE_RATE / TICK_RATE;

/// A playing song. Single-owner; move it to the thread that renders.
pub struct Engine {
    song: Arc<Song>,
    chip: Chip,
    sequencer: Sequencer,
    /// Sequencer state at the start of the subtune, for `reset`
    initial: Sequencer,
    /// Sample computed on the previous step, emitted on the next
    pending: u8,
    vbi_countdown: u32,
    samples: u64,
}

impl Engine {
    pub fn new(song: Arc<Song>, subtune: usize) -> Result<Self, SongError> {
        let sequencer = Sequencer::new(&song, subtune)?;
        tracing::debug!(name = %song.name, subtune, "engine ready");
        Ok(Self {
            song,
            chip: Chip::new(),
            initial: sequencer.clone(),
            sequencer,
            pending: SILENCE,
            vbi_countdown: VBI_COUNT,
            samples: 0,
        })
    }

    pub fn song(&self) -> &Arc<Song> {
        &self.song
    }

    pub fn subtune(&self) -> usize {
        self.sequencer.subtune()
    }

    pub fn chip(&self) -> &Chip {
        &self.chip
    }

    /// Direct register access, e.g. for driving the chip without a song.
    pub fn chip_mut(&mut self) -> &mut Chip {
        &mut self.chip
    }

    pub fn tracks(&self) -> &[Track] {
        self.sequencer.tracks()
    }

    /// Samples emitted since creation or the last reset.
    pub fn samples_emitted(&self) -> u64 {
        self.samples
    }

    /// Compute one sample from the chip alone.
    pub fn next_sample(&mut self) -> u8 {
        self.chip.next_sample()
    }

    /// Run one sequencer frame alone. Returns the end-of-song flag.
    pub fn tick_sequencer(&mut self) -> bool {
        self.sequencer.tick(&self.song, &mut self.chip)
    }

    /// One sample tick: emit the previously computed sample, compute the
    /// next one, and run a sequencer frame every [`VBI_COUNT`] samples.
    ///
    /// Returns true when that frame reached the end of the song.
    pub fn step<S: SampleSink>(&mut self, sink: &mut S) -> Result<bool, S::Error> {
        sink.emit(self.pending)?;
        self.samples += 1;
        self.pending = self.chip.next_sample();

        self.vbi_countdown -= 1;
        if self.vbi_countdown == 0 {
            self.vbi_countdown = VBI_COUNT;
            return Ok(self.tick_sequencer());
        }
        Ok(false)
    }

    /// Restart the subtune from the top with a silent chip.
    pub fn reset(&mut self) {
        self.chip.reset();
        self.sequencer = self.initial.clone();
        self.pending = SILENCE;
        self.vbi_countdown = VBI_COUNT;
        self.samples = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Register;
    use crate::voice::{GATE, PULSE};
    use gs_format::{load_song, SongBuilder};

    const END: u8 = 0xFF;

    fn minimal() -> Arc<Song> {
        let bytes = SongBuilder::new()
            .subtune([vec![0, END, 0], vec![0, END, 0], vec![0, END, 0]])
            .pattern_with_end(vec![])
            .build();
        Arc::new(load_song(&bytes).unwrap())
    }

    #[test]
    fn vbi_count_is_320() {
        assert_eq!(VBI_COUNT, 320);
    }

    #[test]
    fn rejects_bad_subtune() {
        assert!(matches!(
            Engine::new(minimal(), 1),
            Err(SongError::NoSuchSubtune { index: 1, count: 1 })
        ));
    }

    #[test]
    fn first_output_is_silence() {
        let mut engine = Engine::new(minimal(), 0).unwrap();
        let mut out = Vec::new();
        engine.step(&mut out).unwrap();
        assert_eq!(out, [SILENCE]);
    }

    #[test]
    fn sequencer_runs_every_vbi() {
        let mut engine = Engine::new(minimal(), 0).unwrap();
        let mut out = Vec::new();
        for n in 1..VBI_COUNT {
            assert!(!engine.step(&mut out).unwrap(), "sample {n}");
        }
        // The minimal song finishes on its first frame
        assert!(engine.step(&mut out).unwrap());
        assert_eq!(out.len(), VBI_COUNT as usize);
        assert_eq!(engine.samples_emitted(), VBI_COUNT as u64);
    }

    #[test]
    fn output_lags_by_one_sample() {
        let mut engine = Engine::new(minimal(), 0).unwrap();
        let chip = engine.chip_mut();
        chip.write_register(0, Register::AttackDecay, 0x00);
        chip.write_register(0, Register::SustainRelease, 0xF0);
        chip.write_register(0, Register::PulseWidth, 0x800);
        chip.write_register(0, Register::Control, (PULSE | GATE) as u16);

        let mut out = Vec::new();
        engine.step(&mut out).unwrap();
        engine.step(&mut out).unwrap();
        // First byte was computed before the gate opened
        assert_eq!(out[0], SILENCE);
        // Second byte is the first voiced sample, still fully faded
        assert_eq!(out[1], SILENCE);
    }

    #[test]
    fn reset_replays_identically() {
        let mut engine = Engine::new(minimal(), 0).unwrap();
        let mut first = Vec::new();
        for _ in 0..1000 {
            engine.step(&mut first).unwrap();
        }
        engine.reset();
        let mut second = Vec::new();
        for _ in 0..1000 {
            engine.step(&mut second).unwrap();
        }
        assert_eq!(first, second);
    }
}
