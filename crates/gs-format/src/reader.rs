//! Bounds-checked cursor over song bytes.

use arrayvec::ArrayString;

use crate::song::Span;
use crate::SongError;

pub(crate) struct SongReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SongReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn ensure(&self, n: usize) -> Result<(), SongError> {
        if self.pos + n > self.data.len() {
            return Err(SongError::TruncatedData { offset: self.pos, needed: n });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, SongError> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], SongError> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consume `n` bytes and return where they live in the buffer.
    pub fn read_span(&mut self, n: usize) -> Result<Span, SongError> {
        self.ensure(n)?;
        let span = Span { offset: self.pos, len: n };
        self.pos += n;
        Ok(span)
    }

    /// Read a fixed-width text field. The field may not be NUL-terminated.
    pub fn read_text<const N: usize>(&mut self) -> Result<ArrayString<N>, SongError> {
        let raw = self.read_bytes(N)?;
        Ok(fixed_text(raw))
    }
}

/// Decode a NUL-padded field, keeping as many whole characters as fit.
pub(crate) fn fixed_text<const N: usize>(raw: &[u8]) -> ArrayString<N> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let decoded = String::from_utf8_lossy(&raw[..end]);
    let mut out = ArrayString::new();
    for ch in decoded.trim_end().chars() {
        if out.try_push(ch).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_sequentially() {
        let data = [1u8, 2, 3, 4, 5];
        let mut r = SongReader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(r.read_bytes(2).unwrap(), &[2, 3]);
        let span = r.read_span(2).unwrap();
        assert_eq!(span, Span { offset: 3, len: 2 });
        assert_eq!(r.position(), 5);
    }

    #[test]
    fn reports_truncation_offset() {
        let data = [1u8, 2];
        let mut r = SongReader::new(&data);
        r.read_u8().unwrap();
        assert_eq!(
            r.read_bytes(4),
            Err(SongError::TruncatedData { offset: 1, needed: 4 })
        );
        assert_eq!(r.read_u8().unwrap(), 2);
        assert_eq!(
            r.read_u8(),
            Err(SongError::TruncatedData { offset: 2, needed: 1 })
        );
    }

    #[test]
    fn text_stops_at_nul() {
        let mut raw = [0u8; 32];
        raw[..5].copy_from_slice(b"Hello");
        let s: ArrayString<32> = fixed_text(&raw);
        assert_eq!(s.as_str(), "Hello");
    }

    #[test]
    fn text_without_terminator_uses_full_width() {
        let raw = [b'A'; 32];
        let s: ArrayString<32> = fixed_text(&raw);
        assert_eq!(s.len(), 32);
    }

    #[test]
    fn invalid_utf8_never_overflows() {
        let raw = [0xFFu8; 32];
        let s: ArrayString<32> = fixed_text(&raw);
        // Each replacement char takes 3 bytes; only whole chars are kept
        assert_eq!(s.len(), 30);
    }
}
