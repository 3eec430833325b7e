//! CPAL-based audio output backend.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use gs_engine::{SampleSink, SAMPLE_RATE};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::traits::{AudioError, AudioOutput};

/// Convert an unsigned 8-bit sample to `-1.0..1.0`.
fn to_f32(sample: u8) -> f32 {
    (sample as f32 - 128.0) / 128.0
}

/// Sample-and-hold rate conversion from the engine rate to the device rate.
#[derive(Clone, Debug)]
pub struct Resampler {
    source_rate: u32,
    target_rate: u32,
    acc: u32,
    current: f32,
}

impl Resampler {
    pub fn new(source_rate: u32, target_rate: u32) -> Self {
        Self {
            source_rate,
            target_rate: target_rate.max(1),
            // First output frame pulls the first source sample
            acc: target_rate.saturating_sub(source_rate),
            current: 0.0,
        }
    }

    /// Next output value, pulling as many source samples as the rate ratio
    /// calls for. An empty source fades to silence rather than holding.
    pub fn next(&mut self, mut pull: impl FnMut() -> Option<u8>) -> f32 {
        self.acc += self.source_rate;
        while self.acc >= self.target_rate {
            self.acc -= self.target_rate;
            self.current = pull().map_or(0.0, to_f32);
        }
        self.current
    }
}

/// CPAL-based audio output.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    producer: HeapProd<u8>,
    running: Arc<AtomicBool>,
}

impl CpalOutput {
    /// Create a new CPAL output with default device.
    pub fn new() -> Result<(Self, HeapCons<u8>), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;
        let config: StreamConfig = config.into();

        // About 100ms of engine samples
        let rb = HeapRb::<u8>::new(SAMPLE_RATE as usize / 10);
        let (producer, consumer) = rb.split();

        tracing::debug!(
            device = %device.name().unwrap_or_default(),
            rate = config.sample_rate.0,
            channels = config.channels,
            "audio device opened"
        );

        let output = Self {
            device,
            config,
            stream: None,
            producer,
            running: Arc::new(AtomicBool::new(false)),
        };

        Ok((output, consumer))
    }

    /// Build and start the audio stream.
    pub fn build_stream(&mut self, mut consumer: HeapCons<u8>) -> Result<(), AudioError> {
        let running = self.running.clone();
        let channels = self.config.channels as usize;
        let mut resampler = Resampler::new(SAMPLE_RATE, self.config.sample_rate.0);

        let stream = self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }

                    // Mono source: the same value on every device channel
                    for frame in data.chunks_mut(channels) {
                        let value = resampler.next(|| consumer.try_pop());
                        frame.fill(value);
                    }
                },
                |err| tracing::error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        self.stream = Some(stream);
        self.running.store(true, Ordering::Relaxed);

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Write a single sample, spinning until the ring buffer has room.
    ///
    /// Returns false without writing if the output was stopped.
    pub fn write_spin(&mut self, sample: u8) -> bool {
        while self.producer.try_push(sample).is_err() {
            if !self.is_running() {
                return false;
            }
            std::hint::spin_loop();
        }
        true
    }
}

impl SampleSink for CpalOutput {
    type Error = AudioError;

    fn emit(&mut self, sample: u8) -> Result<(), AudioError> {
        if self.write_spin(sample) {
            Ok(())
        } else {
            Err(AudioError::Stopped)
        }
    }
}

impl AudioOutput for CpalOutput {
    fn stop(&mut self) -> Result<(), AudioError> {
        self.running.store(false, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}
