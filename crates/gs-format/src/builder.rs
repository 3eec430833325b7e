//! In-memory GTS5 writer, used to produce songs for tests and benchmarks.

use crate::orderlist::END;
use crate::song::{TableKind, CHANNELS, INSTRUMENT_SIZE, MAGIC};

/// Builds GTS5 song bytes from tables.
///
/// Nothing is validated here; malformed songs can be built on purpose and
/// are rejected by the loader. Counts and lengths are written as single
/// bytes, so anything above 255 is truncated.
#[derive(Clone, Debug, Default)]
pub struct SongBuilder {
    name: String,
    author: String,
    copyright: String,
    subtunes: Vec<[Vec<u8>; CHANNELS]>,
    instruments: Vec<[u8; INSTRUMENT_SIZE]>,
    tables: [Vec<(u8, u8)>; 4],
    patterns: Vec<Vec<[u8; 4]>>,
}

impl SongBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = author.to_owned();
        self
    }

    pub fn copyright(mut self, copyright: &str) -> Self {
        self.copyright = copyright.to_owned();
        self
    }

    /// Add a subtune. Each orderlist includes the restart byte after its end
    /// marker, e.g. `[0x00, 0xFF, 0x00]`.
    pub fn subtune(mut self, orderlists: [Vec<u8>; CHANNELS]) -> Self {
        self.subtunes.push(orderlists);
        self
    }

    /// Add an instrument: AD, SR, wave/pulse/filter/speed pointers, vibrato
    /// delay, gate-off timer, hard restart.
    pub fn instrument(mut self, name: &str, params: [u8; 9]) -> Self {
        let mut record = [0u8; INSTRUMENT_SIZE];
        record[..9].copy_from_slice(&params);
        let name = name.as_bytes();
        let n = name.len().min(INSTRUMENT_SIZE - 9);
        record[9..9 + n].copy_from_slice(&name[..n]);
        self.instruments.push(record);
        self
    }

    /// Replace a table with (left, right) entries.
    pub fn table(mut self, kind: TableKind, entries: &[(u8, u8)]) -> Self {
        self.tables[kind.index()] = entries.to_vec();
        self
    }

    /// Add a pattern of (note, instrument, command, data) rows.
    pub fn pattern(mut self, rows: Vec<[u8; 4]>) -> Self {
        self.patterns.push(rows);
        self
    }

    /// Add a pattern of rows followed by an end row.
    pub fn pattern_with_end(self, mut rows: Vec<[u8; 4]>) -> Self {
        rows.push([END, 0, 0, 0]);
        self.pattern(rows)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        for text in [&self.name, &self.author, &self.copyright] {
            write_text(&mut out, text);
        }

        out.push(self.subtunes.len() as u8);
        for lists in &self.subtunes {
            for list in lists {
                out.push(list.len().saturating_sub(1) as u8);
                out.extend_from_slice(list);
            }
        }

        out.push(self.instruments.len() as u8);
        for record in &self.instruments {
            out.extend_from_slice(record);
        }

        for table in &self.tables {
            out.push(table.len() as u8);
            out.extend(table.iter().map(|&(left, _)| left));
            out.extend(table.iter().map(|&(_, right)| right));
        }

        out.push(self.patterns.len() as u8);
        for rows in &self.patterns {
            out.push(rows.len() as u8);
            for row in rows {
                out.extend_from_slice(row);
            }
        }
        out
    }
}

fn write_text(out: &mut Vec<u8>, text: &str) {
    let mut field = [0u8; 32];
    let bytes = text.as_bytes();
    let n = bytes.len().min(field.len());
    field[..n].copy_from_slice(&bytes[..n]);
    out.extend_from_slice(&field);
}
