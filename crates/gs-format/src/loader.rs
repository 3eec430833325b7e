//! GTS5 song loader.
//!
//! The file is consumed front to back with a [`SongReader`]; spans into the
//! buffer are recorded instead of copying tables out. After parsing, the
//! whole song is validated so that playback never has to deal with dangling
//! pattern, instrument or table references.

use crate::orderlist::{OrderCursor, WalkMode, END};
use crate::reader::SongReader;
use crate::song::{Span, TableKind, CHANNELS, END_ROW, INSTRUMENT_SIZE, MAGIC, ROW_SIZE};
use crate::{Song, SongError};

/// Upper bound on subtunes in one song.
pub const MAX_SUBTUNES: usize = 20;

/// Loader limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    /// Songs declaring more subtunes are rejected. Clamped to [`MAX_SUBTUNES`].
    pub max_subtunes: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { max_subtunes: MAX_SUBTUNES }
    }
}

/// Load a GTS5 song from bytes with default options.
pub fn load_song(data: &[u8]) -> Result<Song, SongError> {
    load_song_with(data, &LoadOptions::default())
}

/// Load a GTS5 song from bytes.
pub fn load_song_with(data: &[u8], options: &LoadOptions) -> Result<Song, SongError> {
    let mut r = SongReader::new(data);

    // 1. Magic
    let magic = r.read_bytes(MAGIC.len())?;
    if magic != MAGIC {
        return Err(SongError::invalid(format!("bad magic {:02x?}", magic)));
    }

    // 2. Header text
    let name = r.read_text::<32>()?;
    let author = r.read_text::<32>()?;
    let copyright = r.read_text::<32>()?;

    // 3. Subtunes, each with one orderlist per channel
    let count = r.read_u8()? as usize;
    let max = options.max_subtunes.min(MAX_SUBTUNES);
    if count > max {
        return Err(SongError::TooManySubtunes { count, max });
    }
    if count == 0 {
        return Err(SongError::invalid("song has no subtunes"));
    }
    let mut subtunes = heapless::Vec::new();
    for _ in 0..count {
        let mut lists = [Span::default(); CHANNELS];
        for list in lists.iter_mut() {
            // Length excludes the restart byte that follows the end marker
            let len = r.read_u8()? as usize + 1;
            *list = r.read_span(len)?;
        }
        subtunes
            .push(lists)
            .map_err(|_| SongError::TooManySubtunes { count, max })?;
    }

    // 4. Instruments
    let instrument_count = r.read_u8()? as usize;
    let instruments = r.read_span(instrument_count * INSTRUMENT_SIZE)?;

    // 5. Tables: size S, then S left bytes and S right bytes
    let mut tables = [Span::default(); 4];
    for table in tables.iter_mut() {
        let size = r.read_u8()? as usize;
        *table = r.read_span(size * 2)?;
    }

    // 6. Patterns
    let pattern_count = r.read_u8()? as usize;
    let mut patterns = Vec::with_capacity(pattern_count);
    for _ in 0..pattern_count {
        let rows = r.read_u8()? as usize;
        patterns.push(r.read_span(rows * ROW_SIZE)?);
    }

    if r.position() < data.len() {
        tracing::debug!(trailing = data.len() - r.position(), "ignoring trailing bytes");
    }

    let song = Song {
        data: data.to_vec(),
        name,
        author,
        copyright,
        subtunes,
        instruments,
        tables,
        patterns,
    };

    validate(&song)?;

    tracing::debug!(
        name = %song.name,
        subtunes = song.subtune_count(),
        instruments = song.instrument_count(),
        patterns = song.pattern_count(),
        "loaded song"
    );

    Ok(song)
}

fn validate(song: &Song) -> Result<(), SongError> {
    for subtune in 0..song.subtune_count() {
        for channel in 0..CHANNELS {
            let list = song.orderlist(subtune, channel).unwrap_or(&[]);
            validate_orderlist(song, list).map_err(|e| match e {
                SongError::InvalidFormat(reason) => SongError::InvalidFormat(format!(
                    "subtune {subtune} channel {channel}: {reason}"
                )),
                other => other,
            })?;
        }
    }

    for pattern in 0..song.pattern_count() {
        validate_pattern(song, pattern as u8)?;
    }

    for kind in [TableKind::Wave, TableKind::Pulse] {
        let table = song.table(kind);
        for (i, (&left, &right)) in table.left().iter().zip(table.right()).enumerate() {
            if left == END && right != 0 && right as usize > table.len() {
                return Err(SongError::invalid(format!(
                    "{} entry {} jumps to {} past size {}",
                    kind.name(),
                    i + 1,
                    right,
                    table.len()
                )));
            }
        }
    }

    let wave_len = song.table(TableKind::Wave).len();
    let pulse_len = song.table(TableKind::Pulse).len();
    for index in 0..song.instrument_count() {
        let Some(inst) = song.instrument(index) else {
            continue;
        };
        if inst.wave_ptr as usize > wave_len {
            return Err(SongError::invalid(format!(
                "instrument {} wavetable pointer {} past size {}",
                index + 1,
                inst.wave_ptr,
                wave_len
            )));
        }
        if inst.pulse_ptr as usize > pulse_len {
            return Err(SongError::invalid(format!(
                "instrument {} pulsetable pointer {} past size {}",
                index + 1,
                inst.pulse_ptr,
                pulse_len
            )));
        }
    }

    Ok(())
}

/// Follow an orderlist the way playback would: resolve from the start, then
/// after each pattern entry, until a position repeats.
fn validate_orderlist(song: &Song, list: &[u8]) -> Result<(), SongError> {
    let mut visited = vec![false; list.len()];
    let mut cursor = OrderCursor::new();
    let mut mode = WalkMode::Init;

    loop {
        let resolved = cursor.resolve(list, mode)?;
        if resolved.pattern as usize >= song.pattern_count() {
            return Err(SongError::invalid(format!(
                "position {} references missing pattern {}",
                cursor.position, resolved.pattern
            )));
        }
        if std::mem::replace(&mut visited[cursor.position], true) {
            return Ok(());
        }
        cursor.position += 1;
        mode = WalkMode::Advance;
    }
}

fn validate_pattern(song: &Song, pattern: u8) -> Result<(), SongError> {
    let last = song.rows(pattern).last();
    match last {
        None => return Err(SongError::invalid(format!("pattern {pattern} is empty"))),
        Some(row) if row.note != END_ROW => {
            return Err(SongError::invalid(format!(
                "pattern {pattern} does not end with an end row"
            )))
        }
        Some(_) => {}
    }

    let instruments = song.instrument_count();
    for (i, row) in song.rows(pattern).enumerate() {
        if row.instrument as usize > instruments {
            return Err(SongError::invalid(format!(
                "pattern {pattern} row {i} uses instrument {} of {instruments}",
                row.instrument
            )));
        }
    }
    Ok(())
}
