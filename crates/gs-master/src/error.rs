use core::convert::Infallible;

use gs_audio::AudioError;
use gs_format::SongError;

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error(transparent)]
    Song(#[from] SongError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no song loaded")]
    NoSong,
}

impl From<Infallible> for PlayerError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
