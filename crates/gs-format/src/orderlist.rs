//! Orderlist walker.
//!
//! An orderlist is a byte sequence of pattern numbers with in-band control
//! codes. The walker skips control codes, recording repeat counts and
//! transposes, until it reaches a concrete pattern number. It is used both
//! when a channel starts playing and each time a pattern finishes, and by the
//! loader to check that every reachable position resolves.

use crate::SongError;

/// First repeat code; the low nibble is the repeat count (0 = 16).
pub const REPEAT: u8 = 0xD0;
/// First transpose code; `code - TRANSPOSE_ZERO` is the semitone offset.
pub const TRANSPOSE: u8 = 0xE0;
/// Transpose code meaning "no transpose".
pub const TRANSPOSE_ZERO: u8 = 0xF0;
/// End of song; the next byte is the restart pattern and position.
pub const END: u8 = 0xFF;

/// Which path is asking for a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkMode {
    /// Channel start: an end marker here is malformed data.
    Init,
    /// Pattern finished: an end marker jumps to the restart position.
    Advance,
}

/// Per-channel position in an orderlist, plus the state the control codes set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderCursor {
    /// Index of the current orderlist byte
    pub position: usize,
    /// Remaining repeats of the current pattern
    pub repeat: u8,
    /// Semitone offset applied to notes
    pub transpose: i8,
}

/// Result of a successful walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub pattern: u8,
    /// The walk crossed the end marker and jumped to the restart pattern.
    pub song_finished: bool,
}

impl OrderCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk forward from the current position to the next pattern number.
    ///
    /// On success `position` points at the pattern byte, or at the restart
    /// position after an end marker. Fails with `InvalidFormat` if the cursor
    /// leaves the list or if an end marker is met in `Init` mode.
    pub fn resolve(&mut self, list: &[u8], mode: WalkMode) -> Result<Resolved, SongError> {
        // Every control byte moves the cursor forward
        for _ in 0..list.len() {
            let code = *list.get(self.position).ok_or_else(|| {
                SongError::invalid(format!(
                    "orderlist position {} past end ({} bytes)",
                    self.position,
                    list.len()
                ))
            })?;

            match code {
                REPEAT..=0xDF => {
                    self.repeat = match code & 0x0F {
                        0 => 16,
                        n => n,
                    };
                    self.position += 1;
                }
                TRANSPOSE..=0xFE => {
                    self.transpose = (code as i16 - TRANSPOSE_ZERO as i16) as i8;
                    self.position += 1;
                    tracing::trace!(transpose = self.transpose, "orderlist transpose");
                }
                END => {
                    if mode == WalkMode::Init {
                        return Err(SongError::invalid("end marker before the first pattern"));
                    }
                    let restart = *list.get(self.position + 1).ok_or_else(|| {
                        SongError::invalid("end marker without a restart byte")
                    })?;
                    // The restart byte is both the pattern to play and the new
                    // position; the next advance continues after it
                    if restart as usize >= list.len() {
                        return Err(SongError::invalid(format!(
                            "restart {} past end ({} bytes)",
                            restart,
                            list.len()
                        )));
                    }
                    tracing::debug!(restart, "orderlist end, restarting");
                    self.position = restart as usize;
                    return Ok(Resolved { pattern: restart, song_finished: true });
                }
                pattern => return Ok(Resolved { pattern, song_finished: false }),
            }
        }

        Err(SongError::invalid("orderlist never reaches a pattern"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_pattern_resolves_immediately() {
        let mut cursor = OrderCursor::new();
        let r = cursor.resolve(&[3, 4, END, 0], WalkMode::Init).unwrap();
        assert_eq!(r, Resolved { pattern: 3, song_finished: false });
        assert_eq!(cursor.position, 0);
    }

    #[test]
    fn repeat_code_sets_countdown() {
        let mut cursor = OrderCursor::new();
        let r = cursor.resolve(&[0xD3, 7, END, 0], WalkMode::Init).unwrap();
        assert_eq!(r.pattern, 7);
        assert_eq!(cursor.repeat, 3);
        assert_eq!(cursor.position, 1);
    }

    #[test]
    fn repeat_zero_means_sixteen() {
        let mut cursor = OrderCursor::new();
        cursor.resolve(&[0xD0, 1, END, 0], WalkMode::Init).unwrap();
        assert_eq!(cursor.repeat, 16);
    }

    #[test]
    fn transpose_range() {
        let mut cursor = OrderCursor::new();
        cursor.resolve(&[0xE0, 0], WalkMode::Init).unwrap();
        assert_eq!(cursor.transpose, -16);

        let mut cursor = OrderCursor::new();
        cursor.resolve(&[0xFE, 0], WalkMode::Init).unwrap();
        assert_eq!(cursor.transpose, 14);

        let mut cursor = OrderCursor::new();
        cursor.resolve(&[0xF3, 0], WalkMode::Init).unwrap();
        assert_eq!(cursor.transpose, 3);
    }

    #[test]
    fn control_codes_stack() {
        let mut cursor = OrderCursor::new();
        let r = cursor.resolve(&[0xF2, 0xD2, 0xEE, 5, END, 0], WalkMode::Init).unwrap();
        assert_eq!(r.pattern, 5);
        assert_eq!(cursor.position, 3);
        assert_eq!(cursor.repeat, 2);
        assert_eq!(cursor.transpose, -2);
    }

    #[test]
    fn end_marker_jumps_to_restart() {
        let list = [0, 1, END, 1];
        let mut cursor = OrderCursor { position: 2, ..Default::default() };
        let r = cursor.resolve(&list, WalkMode::Advance).unwrap();
        assert_eq!(r, Resolved { pattern: 1, song_finished: true });
        assert_eq!(cursor.position, 1);
    }

    #[test]
    fn restart_byte_is_the_pattern() {
        // Restart 1 plays pattern 1, not the pattern stored at position 1
        let list = [0, 2, END, 1];
        let mut cursor = OrderCursor { position: 2, ..Default::default() };
        let r = cursor.resolve(&list, WalkMode::Advance).unwrap();
        assert_eq!(r, Resolved { pattern: 1, song_finished: true });
        assert_eq!(cursor.position, 1);

        // The next advance continues after the restart position
        cursor.position += 1;
        let r = cursor.resolve(&list, WalkMode::Advance).unwrap();
        assert_eq!(r, Resolved { pattern: 1, song_finished: true });
    }

    #[test]
    fn restart_keeps_transpose() {
        let list = [0xF5, 2, END, 0];
        let mut cursor = OrderCursor::new();
        cursor.resolve(&list, WalkMode::Init).unwrap();
        cursor.position += 1;
        let r = cursor.resolve(&list, WalkMode::Advance).unwrap();
        assert_eq!(r, Resolved { pattern: 0, song_finished: true });
        assert_eq!(cursor.position, 0);
        assert_eq!(cursor.transpose, 5);
    }

    #[test]
    fn end_marker_during_init_is_invalid() {
        let mut cursor = OrderCursor::new();
        assert!(matches!(
            cursor.resolve(&[END, 0], WalkMode::Init),
            Err(SongError::InvalidFormat(_))
        ));
    }

    #[test]
    fn markers_only_list_is_invalid() {
        let mut cursor = OrderCursor::new();
        assert!(cursor.resolve(&[0xD1, 0xF0, 0xE3], WalkMode::Init).is_err());
    }

    #[test]
    fn restart_past_list_is_invalid() {
        let list = [0, END, 3];
        let mut cursor = OrderCursor { position: 1, ..Default::default() };
        assert!(cursor.resolve(&list, WalkMode::Advance).is_err());
    }

    #[test]
    fn missing_restart_byte_is_invalid() {
        let list = [0, END];
        let mut cursor = OrderCursor { position: 1, ..Default::default() };
        assert!(cursor.resolve(&list, WalkMode::Advance).is_err());
    }

    #[test]
    fn iterations_bounded_by_control_run() {
        // Ten transposes then a pattern: position lands exactly after the run
        let mut list = vec![0xF1; 10];
        list.push(9);
        let mut cursor = OrderCursor::new();
        let r = cursor.resolve(&list, WalkMode::Init).unwrap();
        assert_eq!(r.pattern, 9);
        assert_eq!(cursor.position, 10);
    }
}
