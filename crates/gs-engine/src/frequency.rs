//! Note-to-step conversion.
//!
//! Notes index the SID frequency table (PAL clock). A SID frequency value is
//! converted to a phase step for the 16 kHz, 14-bit waveform accumulator:
//!
//! `steps = F * 985248 * 16384 / (2^24 * 16000)`

use crate::SAMPLE_RATE;

/// PAL SID master clock in Hz.
pub const PAL_CLOCK: u64 = 985_248;

/// Number of notes in the frequency table.
pub const NOTE_COUNT: usize = 96;

/// Waveform period in accumulator units (64 positions of 256 sub-steps).
const PHASE_PERIOD: u64 = 1 << 14;

/// SID oscillator resolution.
const SID_ACCUMULATOR: u64 = 1 << 24;

/// SID frequency register values, lowest C upwards.
#[rustfmt::skip]
pub const NOTE_FREQUENCIES: [u16; NOTE_COUNT] = [
    0x0117, 0x0127, 0x0139, 0x014b, 0x015f, 0x0174, 0x018a, 0x01a1, 0x01ba, 0x01d4, 0x01f0, 0x020e,
    0x022d, 0x024e, 0x0271, 0x0296, 0x02be, 0x02e8, 0x0314, 0x0343, 0x0374, 0x03a9, 0x03e1, 0x041c,
    0x045a, 0x049c, 0x04e2, 0x052d, 0x057c, 0x05cf, 0x0628, 0x0685, 0x06e8, 0x0752, 0x07c1, 0x0837,
    0x08b4, 0x0939, 0x09c5, 0x0a5a, 0x0af7, 0x0b9e, 0x0c4f, 0x0d0a, 0x0dd1, 0x0ea3, 0x0f82, 0x106e,
    0x1168, 0x1271, 0x138a, 0x14b3, 0x15ee, 0x173c, 0x189e, 0x1a15, 0x1ba2, 0x1d46, 0x1f04, 0x20dc,
    0x22d0, 0x24e2, 0x2714, 0x2967, 0x2bdd, 0x2e79, 0x313c, 0x3429, 0x3744, 0x3a8d, 0x3e08, 0x41b8,
    0x45a1, 0x49c5, 0x4e28, 0x52cd, 0x57ba, 0x5cf1, 0x6278, 0x6853, 0x6e87, 0x751a, 0x7c10, 0x8371,
    0x8b42, 0x9389, 0x9c4f, 0xa59b, 0xaf74, 0xb9e2, 0xc4f0, 0xd0a6, 0xdd0e, 0xea33, 0xf820, 0xffff,
];

/// Phase steps per sample for each note.
pub const NOTE_STEPS: [u16; NOTE_COUNT] = {
    let mut steps = [0u16; NOTE_COUNT];
    let mut i = 0;
    while i < NOTE_COUNT {
        steps[i] = frequency_to_steps(NOTE_FREQUENCIES[i]);
        i += 1;
    }
    steps
};

/// Convert a SID frequency register value to phase steps per sample.
pub const fn frequency_to_steps(frequency: u16) -> u16 {
    (frequency as u64 * PAL_CLOCK * PHASE_PERIOD / (SID_ACCUMULATOR * SAMPLE_RATE as u64)) as u16
}

/// SID frequency for a note; notes past the table give 0.
pub fn note_frequency(note: u8) -> u16 {
    NOTE_FREQUENCIES.get(note as usize).copied().unwrap_or(0)
}

/// Phase steps for a note; notes past the table give 0.
pub fn note_steps(note: u8) -> u16 {
    NOTE_STEPS.get(note as usize).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_table_values() {
        assert_eq!(note_steps(0), 16);
        assert_eq!(note_steps(12), 33);
        assert_eq!(note_steps(24), 66);
        assert_eq!(note_steps(57), 450);
        assert_eq!(note_steps(69), 901);
        assert_eq!(note_steps(95), 3940);
    }

    #[test]
    fn notes_past_table_are_silent() {
        assert_eq!(note_steps(96), 0);
        assert_eq!(note_steps(0xFF), 0);
        assert_eq!(note_frequency(96), 0);
    }

    #[test]
    fn steps_increase_monotonically() {
        for pair in NOTE_STEPS.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn octave_roughly_doubles() {
        // The top entry is clamped to 0xFFFF and falls short of the octave
        for note in 12..NOTE_COUNT as u8 - 1 {
            let lower = note_steps(note - 12) as i32;
            let upper = note_steps(note) as i32;
            assert!((upper - 2 * lower).abs() <= 2, "note {note}: {lower} -> {upper}");
        }
    }
}
