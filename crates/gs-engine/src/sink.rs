//! Output side of the sample clock.

use core::convert::Infallible;

/// Receives one unsigned 8-bit sample per sample tick.
pub trait SampleSink {
    type Error;

    fn emit(&mut self, sample: u8) -> Result<(), Self::Error>;
}

impl SampleSink for Vec<u8> {
    type Error = Infallible;

    fn emit(&mut self, sample: u8) -> Result<(), Self::Error> {
        self.push(sample);
        Ok(())
    }
}

impl<S: SampleSink + ?Sized> SampleSink for &mut S {
    type Error = S::Error;

    fn emit(&mut self, sample: u8) -> Result<(), Self::Error> {
        (**self).emit(sample)
    }
}
