//! Immutable song arena and table views.
//!
//! A [`Song`] keeps the original file bytes and records where each orderlist,
//! instrument, table and pattern lives inside them. Nothing is copied out of
//! the buffer except the three text fields; every accessor is bounds-checked.

use arrayvec::ArrayString;
use core::fmt;

use crate::loader::MAX_SUBTUNES;
use crate::reader::fixed_text;

/// File magic ("GTS5" as stored on disk).
pub const MAGIC: &[u8; 4] = b"GTS5";

/// Number of sequenced channels.
pub const CHANNELS: usize = 3;

/// Bytes per pattern row: note, instrument, command, data.
pub const ROW_SIZE: usize = 4;

/// Note value marking the end of a pattern.
pub const END_ROW: u8 = 0xFF;

/// Bytes per instrument record (9 parameter bytes + 16-byte name).
pub(crate) const INSTRUMENT_SIZE: usize = 25;

/// A byte range inside the song buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// The four two-column auxiliary tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableKind {
    Wave,
    Pulse,
    Filter,
    Speed,
}

impl TableKind {
    /// Tables in file order.
    pub const ALL: [TableKind; 4] =
        [TableKind::Wave, TableKind::Pulse, TableKind::Filter, TableKind::Speed];

    pub const fn index(self) -> usize {
        match self {
            TableKind::Wave => 0,
            TableKind::Pulse => 1,
            TableKind::Filter => 2,
            TableKind::Speed => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TableKind::Wave => "wavetable",
            TableKind::Pulse => "pulsetable",
            TableKind::Filter => "filtertable",
            TableKind::Speed => "speedtable",
        }
    }
}

/// A two-column table stored as parallel left/right byte runs.
#[derive(Clone, Copy, Debug)]
pub struct PairedTable<'a> {
    left: &'a [u8],
    right: &'a [u8],
}

impl<'a> PairedTable<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        let (left, right) = bytes.split_at(bytes.len() / 2);
        Self { left, right }
    }

    /// Number of entries (rows) in the table.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// The (left, right) pair at a 0-based position.
    pub fn entry(&self, index: usize) -> Option<(u8, u8)> {
        Some((*self.left.get(index)?, *self.right.get(index)?))
    }

    pub fn left(&self) -> &'a [u8] {
        self.left
    }

    pub fn right(&self) -> &'a [u8] {
        self.right
    }
}

/// The parameter bytes of an instrument record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Instrument {
    /// Attack (high nibble) / decay (low nibble)
    pub attack_decay: u8,
    /// Sustain level (high nibble) / release (low nibble)
    pub sustain_release: u8,
    /// 1-based wavetable start, 0 = none
    pub wave_ptr: u8,
    /// 1-based pulsetable start, 0 = none
    pub pulse_ptr: u8,
    /// 1-based filtertable start, 0 = none
    pub filter_ptr: u8,
    /// 1-based speedtable start (vibrato parameters), 0 = none
    pub speed_ptr: u8,
    pub vibrato_delay: u8,
    pub gateoff_timer: u8,
    /// Hard restart / first frame waveform
    pub hard_restart: u8,
}

impl Instrument {
    pub(crate) fn from_record(raw: &[u8]) -> Self {
        Self {
            attack_decay: raw[0],
            sustain_release: raw[1],
            wave_ptr: raw[2],
            pulse_ptr: raw[3],
            filter_ptr: raw[4],
            speed_ptr: raw[5],
            vibrato_delay: raw[6],
            gateoff_timer: raw[7],
            hard_restart: raw[8],
        }
    }
}

/// One 4-byte pattern row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Row {
    pub note: u8,
    pub instrument: u8,
    pub command: u8,
    pub data: u8,
}

impl Row {
    pub fn is_end(&self) -> bool {
        self.note == END_ROW
    }
}

/// A parsed song. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    pub(crate) data: Vec<u8>,
    pub name: ArrayString<32>,
    pub author: ArrayString<32>,
    pub copyright: ArrayString<32>,
    pub(crate) subtunes: heapless::Vec<[Span; CHANNELS], MAX_SUBTUNES>,
    pub(crate) instruments: Span,
    pub(crate) tables: [Span; 4],
    pub(crate) patterns: Vec<Span>,
}

impl Song {
    /// The raw song bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn subtune_count(&self) -> usize {
        self.subtunes.len()
    }

    /// Orderlist bytes for one channel of a subtune.
    pub fn orderlist(&self, subtune: usize, channel: usize) -> Option<&[u8]> {
        let span = self.subtunes.get(subtune)?.get(channel)?;
        self.data.get(span.offset..span.end())
    }

    pub fn instrument_count(&self) -> usize {
        self.instruments.len / INSTRUMENT_SIZE
    }

    fn instrument_record(&self, index: usize) -> Option<&[u8]> {
        if index >= self.instrument_count() {
            return None;
        }
        let start = self.instruments.offset + index * INSTRUMENT_SIZE;
        self.data.get(start..start + INSTRUMENT_SIZE)
    }

    /// Parameters of the instrument at a 0-based index.
    pub fn instrument(&self, index: usize) -> Option<Instrument> {
        self.instrument_record(index).map(Instrument::from_record)
    }

    /// Name of the instrument at a 0-based index.
    pub fn instrument_name(&self, index: usize) -> Option<ArrayString<16>> {
        self.instrument_record(index).map(|raw| fixed_text(&raw[9..]))
    }

    pub fn table(&self, kind: TableKind) -> PairedTable<'_> {
        let span = self.tables[kind.index()];
        PairedTable::new(self.data.get(span.offset..span.end()).unwrap_or(&[]))
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Byte offset of the first row of a pattern.
    pub fn pattern_offset(&self, pattern: u8) -> Option<usize> {
        self.patterns.get(pattern as usize).map(|span| span.offset)
    }

    /// Number of rows in a pattern, end row included.
    pub fn pattern_rows(&self, pattern: u8) -> Option<usize> {
        self.patterns.get(pattern as usize).map(|span| span.len / ROW_SIZE)
    }

    /// Read the row stored at a byte offset.
    pub fn row_at(&self, offset: usize) -> Option<Row> {
        let raw = self.data.get(offset..offset + ROW_SIZE)?;
        Some(Row { note: raw[0], instrument: raw[1], command: raw[2], data: raw[3] })
    }

    /// Iterate the rows of a pattern.
    pub fn rows(&self, pattern: u8) -> impl Iterator<Item = Row> + '_ {
        let span = self.patterns.get(pattern as usize).copied().unwrap_or_default();
        (span.offset..span.end())
            .step_by(ROW_SIZE)
            .filter_map(move |offset| self.row_at(offset))
    }

    /// Summary of the song layout.
    pub fn info(&self) -> SongInfo {
        SongInfo {
            name: self.name,
            author: self.author,
            copyright: self.copyright,
            subtunes: self.subtune_count(),
            instruments: self.instrument_count(),
            patterns: self.pattern_count(),
            table_sizes: TableKind::ALL.map(|kind| self.table(kind).len()),
        }
    }
}

/// Song header and table sizes, for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongInfo {
    pub name: ArrayString<32>,
    pub author: ArrayString<32>,
    pub copyright: ArrayString<32>,
    pub subtunes: usize,
    pub instruments: usize,
    pub patterns: usize,
    pub table_sizes: [usize; 4],
}

impl fmt::Display for SongInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name:        {}", self.name)?;
        writeln!(f, "Author:      {}", self.author)?;
        writeln!(f, "Copyright:   {}", self.copyright)?;
        writeln!(f, "Subtunes:    {}", self.subtunes)?;
        writeln!(f, "Instruments: {}", self.instruments)?;
        writeln!(f, "Patterns:    {}", self.patterns)?;
        for (kind, size) in TableKind::ALL.iter().zip(self.table_sizes) {
            writeln!(f, "{:<12} {}", format!("{}:", kind.name()), size)?;
        }
        Ok(())
    }
}
