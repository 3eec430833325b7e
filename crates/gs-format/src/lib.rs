//! Song format support for goatsynth.
//!
//! Parses GTS5 song files into an immutable [`Song`] arena and provides the
//! orderlist walker shared by the loader and the sequencer.

mod builder;
mod error;
mod loader;
pub mod orderlist;
mod reader;
mod song;

pub use builder::SongBuilder;
pub use error::SongError;
pub use loader::{load_song, load_song_with, LoadOptions, MAX_SUBTUNES};
pub use orderlist::{OrderCursor, Resolved, WalkMode};
pub use song::{
    Instrument, PairedTable, Row, Song, SongInfo, Span, TableKind, CHANNELS, END_ROW, MAGIC,
    ROW_SIZE,
};
