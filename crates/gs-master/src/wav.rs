//! WAV encoding for 8-bit unsigned mono PCM.

use gs_engine::{SampleSink, SAMPLE_RATE};
use std::io::{self, Seek, SeekFrom, Write};

const HEADER_SIZE: u32 = 44;
const RIFF_SIZE_OFFSET: u64 = 4;
const DATA_SIZE_OFFSET: u64 = 40;

/// Streaming WAV writer. Sizes are written as zero and patched by
/// [`WavWriter::finish`] once the sample count is known.
pub struct WavWriter<W: Write + Seek> {
    inner: W,
    samples: u32,
}

impl<W: Write + Seek> WavWriter<W> {
    pub fn new(mut inner: W) -> io::Result<Self> {
        write_header(&mut inner, 0)?;
        Ok(Self { inner, samples: 0 })
    }

    pub fn samples_written(&self) -> u32 {
        self.samples
    }

    pub fn write_sample(&mut self, sample: u8) -> io::Result<()> {
        // RIFF size must still fit in 32 bits
        if self.samples >= u32::MAX - (HEADER_SIZE - 8) {
            return Err(io::Error::other("wav data too large"));
        }
        self.inner.write_all(&[sample])?;
        self.samples += 1;
        Ok(())
    }

    /// Patch the RIFF and data sizes and hand back the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
        self.inner.write_all(&(HEADER_SIZE - 8 + self.samples).to_le_bytes())?;
        self.inner.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
        self.inner.write_all(&self.samples.to_le_bytes())?;
        self.inner.seek(SeekFrom::End(0))?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write + Seek> SampleSink for WavWriter<W> {
    type Error = io::Error;

    fn emit(&mut self, sample: u8) -> io::Result<()> {
        self.write_sample(sample)
    }
}

fn write_header(w: &mut impl Write, data_size: u32) -> io::Result<()> {
    write_riff_header(w, data_size)?;
    write_fmt_chunk(w)?;
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(HEADER_SIZE - 8 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(w: &mut impl Write) -> io::Result<()> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 8;
    let block_align = num_channels * (bits_per_sample / 8);

    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&num_channels.to_le_bytes())?;
    w.write_all(&SAMPLE_RATE.to_le_bytes())?;
    w.write_all(&(SAMPLE_RATE * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&bits_per_sample.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(buf: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(buf[offset..offset + 2].try_into().unwrap())
    }

    /// Header and data written in one pass, for comparison.
    fn samples_to_wav(samples: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE as usize + samples.len());
        write_header(&mut buf, samples.len() as u32).unwrap();
        buf.extend_from_slice(samples);
        buf
    }

    #[test]
    fn header_layout() {
        let wav = samples_to_wav(&[128; 10]);
        assert_eq!(wav.len(), 54);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 46);
        assert_eq!(&wav[8..16], b"WAVEfmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1);
        assert_eq!(u16_at(&wav, 22), 1);
        assert_eq!(u32_at(&wav, 24), 16_000);
        assert_eq!(u32_at(&wav, 28), 16_000);
        assert_eq!(u16_at(&wav, 32), 1);
        assert_eq!(u16_at(&wav, 34), 8);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 10);
    }

    #[test]
    fn streaming_matches_one_pass() {
        let samples: Vec<u8> = (0..=255).collect();
        let mut writer = WavWriter::new(Cursor::new(Vec::new())).unwrap();
        for &s in &samples {
            writer.emit(s).unwrap();
        }
        assert_eq!(writer.samples_written(), 256);
        let streamed = writer.finish().unwrap().into_inner();
        assert_eq!(streamed, samples_to_wav(&samples));
        assert_eq!(&streamed[44..], &samples[..]);
    }

    #[test]
    fn empty_file_is_header_only() {
        let writer = WavWriter::new(Cursor::new(Vec::new())).unwrap();
        let wav = writer.finish().unwrap().into_inner();
        assert_eq!(wav.len(), 44);
        assert_eq!(u32_at(&wav, 4), 36);
        assert_eq!(u32_at(&wav, 40), 0);
    }
}
