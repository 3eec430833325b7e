//! Per-channel playback state.

use gs_format::{OrderCursor, Song, SongError, WalkMode};

/// Table cursor value meaning "program not running".
pub const INACTIVE: u8 = 0xFF;

/// Rows advance every this many ticks until a tempo command says otherwise.
pub const DEFAULT_TEMPO: u8 = 5;

#[derive(Clone, Debug)]
pub struct Track {
    /// 0-based instrument, `None` until the first key-on
    pub instrument: Option<u8>,
    pub wave_cursor: u8,
    pub pulse_cursor: u8,
    pub speed_cursor: u8,
    /// Ticks left before the wavetable program continues
    pub wave_delay: u8,
    /// Ticks left in the current pulse modulation step
    pub pulse_repeat: u8,
    /// Pulse width change per tick
    pub pulse_delta: i8,
    /// Note currently sounding, after wavetable offsets
    pub note: u8,
    /// Note from the last key-on
    pub original_note: u8,
    /// Ticks per row
    pub tempo: u8,
    /// Ticks until the next row
    pub step_countdown: u8,
    /// Orderlist position with its repeat count and transpose
    pub order: OrderCursor,
    /// Byte offset of the next row in the song data
    pub song_position: usize,
    /// Set when the channel hit data it cannot follow
    pub stopped: bool,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            instrument: None,
            wave_cursor: INACTIVE,
            pulse_cursor: INACTIVE,
            speed_cursor: 0,
            wave_delay: 0,
            pulse_repeat: 0,
            pulse_delta: 0,
            note: 0,
            original_note: 0,
            tempo: DEFAULT_TEMPO,
            // The first row plays on the first tick
            step_countdown: 1,
            order: OrderCursor::new(),
            song_position: 0,
            stopped: false,
        }
    }
}

impl Track {
    /// Position a fresh track on the first pattern of its orderlist.
    pub fn start(song: &Song, subtune: usize, channel: usize) -> Result<Self, SongError> {
        let list = song.orderlist(subtune, channel).ok_or(SongError::NoSuchSubtune {
            index: subtune,
            count: song.subtune_count(),
        })?;

        let mut track = Self::default();
        let resolved = track.order.resolve(list, WalkMode::Init)?;
        track.song_position = song.pattern_offset(resolved.pattern).ok_or_else(|| {
            SongError::InvalidFormat(format!("missing pattern {}", resolved.pattern))
        })?;

        tracing::debug!(
            channel,
            pattern = resolved.pattern,
            transpose = track.order.transpose,
            "channel start"
        );
        Ok(track)
    }

    /// Whether a table program should run this tick.
    pub fn has_instrument(&self) -> bool {
        self.instrument.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_format::{load_song, SongBuilder};

    #[test]
    fn start_resolves_first_pattern() {
        let bytes = SongBuilder::new()
            .subtune([vec![0xF3, 1, 0xFF, 0], vec![0, 0xFF, 0], vec![0xD2, 1, 0xFF, 0]])
            .pattern_with_end(vec![])
            .pattern_with_end(vec![[0x70, 0, 0, 0]])
            .build();
        let song = load_song(&bytes).unwrap();

        let t0 = Track::start(&song, 0, 0).unwrap();
        assert_eq!(t0.order.position, 1);
        assert_eq!(t0.order.transpose, 3);
        assert_eq!(t0.song_position, song.pattern_offset(1).unwrap());
        assert_eq!(t0.wave_cursor, INACTIVE);
        assert_eq!(t0.tempo, DEFAULT_TEMPO);
        assert_eq!(t0.step_countdown, 1);

        let t2 = Track::start(&song, 0, 2).unwrap();
        assert_eq!(t2.order.repeat, 2);
    }

    #[test]
    fn start_rejects_missing_subtune() {
        let bytes = SongBuilder::new()
            .subtune([vec![0, 0xFF, 0], vec![0, 0xFF, 0], vec![0, 0xFF, 0]])
            .pattern_with_end(vec![])
            .build();
        let song = load_song(&bytes).unwrap();
        assert_eq!(
            Track::start(&song, 1, 0).unwrap_err(),
            SongError::NoSuchSubtune { index: 1, count: 1 }
        );
    }
}
