//! Four-voice sound chip with a register interface.
//!
//! Only the first [`MIXED_VOICES`] voices are mixed into the output; the
//! fourth exists so register writes from a four-voice layout are accepted.

use crate::voice::{Voice, PULSE_WIDTH_MASK};

pub const VOICES: usize = 4;
pub const MIXED_VOICES: usize = 3;

/// Noise register value after reset.
pub const NOISE_SEED: u16 = 0x42;

/// Output value for silence.
pub const SILENCE: u8 = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    /// 16-bit SID frequency
    Frequency,
    /// 12-bit pulse width
    PulseWidth,
    Control,
    AttackDecay,
    SustainRelease,
}

#[derive(Clone, Debug)]
pub struct Chip {
    voices: [Voice; VOICES],
    noise: u16,
}

impl Default for Chip {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip {
    pub const fn new() -> Self {
        Self {
            voices: [Voice::new(), Voice::new(), Voice::new(), Voice::new()],
            noise: NOISE_SEED,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn noise(&self) -> u16 {
        self.noise
    }

    /// Write a register. Values wider than the register are truncated.
    pub fn write_register(&mut self, voice: usize, register: Register, value: u16) {
        let Some(voice) = self.voices.get_mut(voice) else {
            tracing::warn!(voice, ?register, "write to missing voice ignored");
            return;
        };
        match register {
            Register::Frequency => voice.set_frequency(value),
            Register::PulseWidth => voice.set_pulse_width(value),
            Register::Control => voice.set_control(value as u8),
            Register::AttackDecay => voice.set_attack_decay(value as u8),
            Register::SustainRelease => voice.set_sustain_release(value as u8),
        }
    }

    pub fn read_register(&self, voice: usize, register: Register) -> u16 {
        let Some(voice) = self.voices.get(voice) else {
            return 0;
        };
        match register {
            Register::Frequency => voice.frequency(),
            Register::PulseWidth => voice.pulse_width() & PULSE_WIDTH_MASK,
            Register::Control => voice.control() as u16,
            Register::AttackDecay => voice.envelope().attack_decay() as u16,
            Register::SustainRelease => voice.envelope().sustain_release() as u16,
        }
    }

    fn clock_noise(&mut self) {
        let n = self.noise;
        let bit = (n ^ (n >> 2) ^ (n >> 3) ^ (n >> 5)) & 1;
        self.noise = (n >> 1) | (bit << 15);
    }

    /// Compute the next unsigned 8-bit output sample.
    pub fn next_sample(&mut self) -> u8 {
        let mut mix: i16 = 0;
        for index in 0..MIXED_VOICES {
            // The noise register runs once per mixed voice, even for silent voices
            self.clock_noise();
            mix += self.voices[index].sample(self.noise);
        }
        (mix + SILENCE as i16).clamp(0, 255) as u8
    }
}
