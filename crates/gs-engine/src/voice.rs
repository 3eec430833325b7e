//! Single oscillator voice.
//!
//! The phase accumulator is 16 bits with the waveform period in the low 14:
//! the high byte is a position in `0..64`, the low byte accumulated error.

use crate::envelope::{Envelope, EnvelopePhase, FADE_SILENT};
use crate::frequency::frequency_to_steps;

pub const GATE: u8 = 0x01;
/// Accepted but not emulated.
pub const SYNC: u8 = 0x02;
/// Accepted but not emulated.
pub const RING_MOD: u8 = 0x04;
/// Accepted but not emulated.
pub const TEST: u8 = 0x08;
pub const TRIANGLE: u8 = 0x10;
pub const SAWTOOTH: u8 = 0x20;
pub const PULSE: u8 = 0x40;
pub const NOISE: u8 = 0x80;

/// Waveform positions per period.
const POSITIONS: u16 = 64;

/// Pulse width registers are 12 bits.
pub const PULSE_WIDTH_MASK: u16 = 0x0FFF;

#[derive(Clone, Debug, Default)]
pub struct Voice {
    /// SID frequency register
    frequency: u16,
    /// Phase steps per sample
    steps: u16,
    phase: u16,
    control: u8,
    /// 12-bit pulse width
    pulse_width: u16,
    envelope: Envelope,
}

impl Voice {
    pub const fn new() -> Self {
        Self {
            frequency: 0,
            steps: 0,
            phase: 0,
            control: 0,
            pulse_width: 0,
            envelope: Envelope::new(),
        }
    }

    pub fn frequency(&self) -> u16 {
        self.frequency
    }

    pub fn steps(&self) -> u16 {
        self.steps
    }

    pub fn phase(&self) -> u16 {
        self.phase
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    pub fn pulse_width(&self) -> u16 {
        self.pulse_width
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Set the frequency register. Restarts the waveform.
    pub fn set_frequency(&mut self, frequency: u16) {
        self.frequency = frequency;
        self.steps = frequency_to_steps(frequency);
        self.phase = 0;
    }

    pub fn set_pulse_width(&mut self, width: u16) {
        self.pulse_width = width & PULSE_WIDTH_MASK;
    }

    /// Set the control register, driving the envelope on gate edges.
    pub fn set_control(&mut self, value: u8) {
        let was_gated = self.control & GATE != 0;
        let gated = value & GATE != 0;
        self.control = value;

        if gated && !was_gated {
            if self.envelope.gate_on() {
                self.phase = 0;
            }
        } else if was_gated && !gated {
            self.envelope.gate_off();
        }
    }

    pub fn set_attack_decay(&mut self, value: u8) {
        self.envelope.set_attack_decay(value);
    }

    pub fn set_sustain_release(&mut self, value: u8) {
        self.envelope.set_sustain_release(value);
    }

    /// Produce one enveloped sample in `-32..=32` and advance.
    ///
    /// `noise` is the current noise register value.
    pub fn sample(&mut self, noise: u16) -> i16 {
        if self.envelope.phase() == EnvelopePhase::Off {
            return 0;
        }

        let mut position = self.phase >> 8;
        let wrapped = position >= POSITIONS;
        if wrapped {
            position -= POSITIONS;
            self.phase = (position << 8) | (self.phase & 0xFF);
        }

        let wave = self.waveform(position as i16, wrapped, noise);
        let fade = FADE_SILENT.saturating_sub(self.envelope.fade()) as i16;
        let faded = wave * fade / FADE_SILENT as i16;

        self.envelope.clock();
        self.phase = self.phase.wrapping_add(self.steps);
        faded
    }

    fn waveform(&self, position: i16, wrapped: bool, noise: u16) -> i16 {
        if self.control & SAWTOOTH != 0 {
            position - 32
        } else if self.control & TRIANGLE != 0 {
            let v = position * 2;
            let v = if v >= 64 { 128 - v } else { v };
            v - 32
        } else if self.control & PULSE != 0 {
            // The 12-bit width spans the whole 14-bit period (64 positions
            // of 256 sub-steps), so width << 2 is the compare point in phase
            // units and 0x800 gives a square wave
            if wrapped || self.phase < self.pulse_width << 2 {
                31
            } else {
                -32
            }
        } else if self.control & NOISE != 0 {
            (noise & 0x3F) as i16 - 32
        } else {
            0
        }
    }
}
