//! GTS5 sequencer.
//!
//! One call to [`Sequencer::tick`] is one 50 Hz frame. Each frame runs, in
//! order, the wavetable program of every channel, the pulsetable program of
//! every channel, and then the pattern step of every channel. All state that
//! changes lives in the tracks and the chip; the song is only read.

use gs_format::{Row, Song, SongError, TableKind, WalkMode, CHANNELS, END_ROW, ROW_SIZE};

use crate::chip::{Chip, Register};
use crate::frequency::note_frequency;
use crate::track::{Track, INACTIVE};
use crate::voice::{GATE, PULSE, SAWTOOTH, TRIANGLE};

/// Pattern command that sets the tempo.
pub const CMD_TEMPO: u8 = 0x0F;

/// First and last note values that trigger a key-on.
const NOTE_FIRST: u8 = 0x60;
const NOTE_LAST: u8 = 0xBC;
/// Note value subtracted to get the key.
const NOTE_BASE: u8 = 0x68;
/// Note value that releases the gate.
const KEY_OFF: u8 = 0xBE;

/// Wavetable left-column control code: stop or jump.
const TABLE_JUMP: u8 = 0xFF;

/// Waveforms whose pitch follows the wavetable note column.
const PITCHED: u8 = SAWTOOTH | TRIANGLE | PULSE;

#[derive(Clone, Debug)]
pub struct Sequencer {
    subtune: usize,
    tracks: [Track; CHANNELS],
}

impl Sequencer {
    /// Start every channel of a subtune at its first pattern.
    pub fn new(song: &Song, subtune: usize) -> Result<Self, SongError> {
        if subtune >= song.subtune_count() {
            return Err(SongError::NoSuchSubtune { index: subtune, count: song.subtune_count() });
        }
        Ok(Self {
            subtune,
            tracks: [
                Track::start(song, subtune, 0)?,
                Track::start(song, subtune, 1)?,
                Track::start(song, subtune, 2)?,
            ],
        })
    }

    pub fn subtune(&self) -> usize {
        self.subtune
    }

    pub fn tracks(&self) -> &[Track; CHANNELS] {
        &self.tracks
    }

    /// Run one frame. Returns true if any channel reached the end of its
    /// orderlist and restarted.
    pub fn tick(&mut self, song: &Song, chip: &mut Chip) -> bool {
        for channel in 0..CHANNELS {
            run_wavetable(song, chip, &mut self.tracks[channel], channel);
        }
        for channel in 0..CHANNELS {
            run_pulsetable(song, chip, &mut self.tracks[channel], channel);
        }

        let mut finished = false;
        for channel in 0..CHANNELS {
            finished |= self.step_pattern(song, chip, channel);
        }
        finished
    }

    fn step_pattern(&mut self, song: &Song, chip: &mut Chip, channel: usize) -> bool {
        let track = &mut self.tracks[channel];
        if track.stopped {
            return false;
        }
        track.step_countdown = track.step_countdown.saturating_sub(1);
        if track.step_countdown > 0 {
            return false;
        }
        track.step_countdown = track.tempo;

        let Some(list) = song.orderlist(self.subtune, channel) else {
            return false;
        };

        let mut finished = false;
        loop {
            let track = &mut self.tracks[channel];
            let Some(row) = song.row_at(track.song_position) else {
                tracing::warn!(channel, offset = track.song_position, "row outside song data");
                track.stopped = true;
                return finished;
            };

            if row.command == CMD_TEMPO {
                self.set_tempo(channel, row.data);
            }
            let track = &mut self.tracks[channel];

            if row.note != END_ROW {
                play_note(song, chip, track, channel, &row);
                break;
            }

            if track.order.repeat > 0 {
                track.order.repeat -= 1;
                let pattern = list.get(track.order.position).copied().unwrap_or(END_ROW);
                match song.pattern_offset(pattern) {
                    Some(offset) => track.song_position = offset,
                    None => {
                        tracing::warn!(channel, pattern, "repeat of missing pattern");
                        track.stopped = true;
                        return finished;
                    }
                }
                continue;
            }

            track.order.position += 1;
            let next = track
                .order
                .resolve(list, WalkMode::Advance)
                .ok()
                .and_then(|r| Some((r, song.pattern_offset(r.pattern)?)));
            let Some((resolved, offset)) = next else {
                tracing::warn!(channel, position = track.order.position, "orderlist broken");
                track.stopped = true;
                return finished;
            };
            track.song_position = offset;
            if resolved.song_finished {
                // A second wrap in one row step means no pattern in the loop
                // has a playable row; pick up from the restart next time
                if finished {
                    return true;
                }
                tracing::debug!(channel, restart = resolved.pattern, "end of song");
                finished = true;
            }
        }

        self.tracks[channel].song_position += ROW_SIZE;
        finished
    }

    fn set_tempo(&mut self, channel: usize, data: u8) {
        if data >= 0x80 {
            let tempo = (data - 0x80).max(1);
            self.tracks[channel].tempo = tempo;
            tracing::debug!(channel, tempo, "channel tempo");
        } else {
            let tempo = data.max(1);
            for track in self.tracks.iter_mut() {
                track.tempo = tempo;
            }
            tracing::debug!(tempo, "global tempo");
        }
    }
}

fn play_note(song: &Song, chip: &mut Chip, track: &mut Track, channel: usize, row: &Row) {
    match row.note {
        NOTE_FIRST..=NOTE_LAST => {
            let key = row.note.wrapping_sub(NOTE_BASE).wrapping_add(track.order.transpose as u8);
            key_on(song, chip, track, channel, key, row.instrument);
        }
        KEY_OFF => key_off(chip, channel),
        _ => {}
    }
}

/// Load an instrument onto a channel and restart its table programs.
///
/// `instrument` is 1-based; 0 reuses the channel's current instrument. The
/// gate is left alone: the wavetable program opens it.
pub fn key_on(song: &Song, chip: &mut Chip, track: &mut Track, channel: usize, key: u8, instrument: u8) {
    let index = match instrument {
        0 => match track.instrument {
            Some(current) => current,
            None => {
                tracing::trace!(channel, "key-on without an instrument ignored");
                return;
            }
        },
        n => n - 1,
    };
    let Some(inst) = song.instrument(index as usize) else {
        tracing::warn!(channel, instrument, "key-on with missing instrument");
        return;
    };

    chip.write_register(channel, Register::AttackDecay, inst.attack_decay as u16);
    chip.write_register(channel, Register::SustainRelease, inst.sustain_release as u16);

    track.instrument = Some(index);
    track.original_note = key;
    // Pointers are 1-based; 0 becomes INACTIVE
    track.wave_cursor = inst.wave_ptr.wrapping_sub(1);
    track.pulse_cursor = inst.pulse_ptr.wrapping_sub(1);
    track.speed_cursor = inst.speed_ptr;
    track.pulse_repeat = 0;
    track.wave_delay = 0;
}

/// Clear the gate, sending the voice into release.
pub fn key_off(chip: &mut Chip, channel: usize) {
    let control = chip.read_register(channel, Register::Control);
    chip.write_register(channel, Register::Control, control & !(GATE as u16));
}

/// Note selected by a wavetable right-column value.
fn wavetable_note(right: u8, original: u8, current: u8) -> u8 {
    match right {
        0x00..=0x5F => original.wrapping_add(right),
        0x60..=0x7F => original.wrapping_sub(right - 0x60),
        0x80 => original,
        0x81..=0xDF => right - 0x81,
        _ => current,
    }
}

/// Cursor after the current entry, or INACTIVE past the end of the table.
fn next_cursor(cursor: u8, len: usize) -> u8 {
    let next = cursor as usize + 1;
    if next >= len {
        INACTIVE
    } else {
        next as u8
    }
}

/// Stop on a zero target, otherwise jump to the 1-based target.
fn jump_target(right: u8) -> u8 {
    if right == 0 {
        INACTIVE
    } else {
        right - 1
    }
}

fn run_wavetable(song: &Song, chip: &mut Chip, track: &mut Track, channel: usize) {
    if !track.has_instrument() || track.wave_cursor == INACTIVE {
        return;
    }
    if track.wave_delay > 0 {
        track.wave_delay -= 1;
        return;
    }

    let table = song.table(TableKind::Wave);
    let Some((left, right)) = table.entry(track.wave_cursor as usize) else {
        tracing::warn!(channel, cursor = track.wave_cursor, "wavetable cursor past end");
        track.wave_cursor = INACTIVE;
        return;
    };

    match left {
        0x01..=0x0F => track.wave_delay = left,
        0x00 | 0x10..=0xDF => {
            let control = if left == 0 {
                chip.read_register(channel, Register::Control) as u8
            } else {
                chip.write_register(channel, Register::Control, left as u16);
                left
            };
            if control & PITCHED != 0 {
                track.note = wavetable_note(right, track.original_note, track.note);
                // Also restarts the waveform
                chip.write_register(channel, Register::Frequency, note_frequency(track.note));
            }
        }
        TABLE_JUMP => {
            track.wave_cursor = jump_target(right);
            return;
        }
        // 0xE0..=0xFE are reserved for commands this player does not run
        _ => {}
    }

    track.wave_cursor = next_cursor(track.wave_cursor, table.len());
}

fn run_pulsetable(song: &Song, chip: &mut Chip, track: &mut Track, channel: usize) {
    if !track.has_instrument() || track.pulse_cursor == INACTIVE {
        return;
    }
    if track.pulse_repeat > 0 {
        let width = chip.read_register(channel, Register::PulseWidth);
        let width = width.wrapping_add_signed(track.pulse_delta as i16);
        chip.write_register(channel, Register::PulseWidth, width);
        track.pulse_repeat -= 1;
        return;
    }

    let table = song.table(TableKind::Pulse);
    let Some((left, right)) = table.entry(track.pulse_cursor as usize) else {
        tracing::warn!(channel, cursor = track.pulse_cursor, "pulsetable cursor past end");
        track.pulse_cursor = INACTIVE;
        return;
    };

    match left {
        TABLE_JUMP => {
            track.pulse_cursor = jump_target(right);
            return;
        }
        0x00..=0x7F => {
            track.pulse_repeat = left;
            track.pulse_delta = right as i8;
        }
        _ => {
            let width = ((left as u16 & 0x0F) << 8) | right as u16;
            chip.write_register(channel, Register::PulseWidth, width);
        }
    }

    track.pulse_cursor = next_cursor(track.pulse_cursor, table.len());
}
