//! ADSR envelope generator.
//!
//! The envelope is expressed as a fade amount: 0 is full volume, 32 is
//! silence. A countdown in samples paces each one-unit step of the fade.

/// Samples between fade steps during attack, indexed by the attack nibble.
pub const ATTACK_CYCLES: [u16; 16] =
    [1, 4, 8, 12, 19, 28, 34, 40, 50, 125, 250, 400, 500, 1500, 2500, 4000];

/// Samples between fade steps during decay and release.
pub const DECAY_RELEASE_CYCLES: [u16; 16] =
    [3, 12, 24, 36, 57, 84, 102, 120, 150, 375, 750, 1200, 1500, 4500, 7500, 12000];

/// Fade amount of a silent voice.
pub const FADE_SILENT: u8 = 32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopePhase {
    #[default]
    Off,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Clone, Debug)]
pub struct Envelope {
    phase: EnvelopePhase,
    attack_decay: u8,
    sustain_release: u8,
    fade: u8,
    countdown: u16,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

impl Envelope {
    pub const fn new() -> Self {
        Self {
            phase: EnvelopePhase::Off,
            attack_decay: 0,
            sustain_release: 0,
            fade: FADE_SILENT,
            countdown: 0,
        }
    }

    pub fn phase(&self) -> EnvelopePhase {
        self.phase
    }

    /// Current fade amount, `0..=32`.
    pub fn fade(&self) -> u8 {
        self.fade
    }

    pub fn attack_decay(&self) -> u8 {
        self.attack_decay
    }

    pub fn sustain_release(&self) -> u8 {
        self.sustain_release
    }

    /// Store AD and restart the countdown at the attack rate.
    pub fn set_attack_decay(&mut self, value: u8) {
        self.attack_decay = value;
        self.countdown = ATTACK_CYCLES[self.attack_rate()];
    }

    pub fn set_sustain_release(&mut self, value: u8) {
        self.sustain_release = value;
    }

    /// Rising gate. Returns true when a new attack started.
    pub fn gate_on(&mut self) -> bool {
        if self.phase != EnvelopePhase::Off {
            return false;
        }
        self.phase = EnvelopePhase::Attack;
        true
    }

    /// Falling gate.
    pub fn gate_off(&mut self) {
        if self.phase == EnvelopePhase::Off {
            return;
        }
        self.phase = EnvelopePhase::Release;
        self.countdown = DECAY_RELEASE_CYCLES[self.release_rate()];
    }

    /// Fade level the decay stops at.
    pub fn sustain_fade(&self) -> u8 {
        (0x0F - (self.sustain_release >> 4)) << 1
    }

    fn attack_rate(&self) -> usize {
        (self.attack_decay >> 4) as usize
    }

    fn decay_rate(&self) -> usize {
        (self.attack_decay & 0x0F) as usize
    }

    fn release_rate(&self) -> usize {
        (self.sustain_release & 0x0F) as usize
    }

    /// Advance one sample.
    pub fn clock(&mut self) {
        self.countdown = self.countdown.wrapping_sub(1);
        if self.countdown != 0 {
            return;
        }

        match self.phase {
            EnvelopePhase::Attack => {
                if self.fade > 0 {
                    self.fade -= 1;
                    self.countdown = ATTACK_CYCLES[self.attack_rate()];
                } else if self.sustain_fade() > 0 {
                    self.phase = EnvelopePhase::Decay;
                    self.countdown = DECAY_RELEASE_CYCLES[self.decay_rate()];
                } else {
                    self.phase = EnvelopePhase::Sustain;
                }
            }
            EnvelopePhase::Decay => {
                if self.fade >= self.sustain_fade() {
                    self.phase = EnvelopePhase::Sustain;
                } else {
                    self.fade += 1;
                    self.countdown = DECAY_RELEASE_CYCLES[self.decay_rate()];
                }
            }
            EnvelopePhase::Release => {
                self.fade = (self.fade + 1).min(FADE_SILENT);
                if self.fade >= FADE_SILENT {
                    self.phase = EnvelopePhase::Off;
                } else {
                    self.countdown = DECAY_RELEASE_CYCLES[self.release_rate()];
                }
            }
            // Sustain holds; the countdown keeps wrapping
            EnvelopePhase::Sustain | EnvelopePhase::Off => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_until(env: &mut Envelope, phase: EnvelopePhase, limit: usize) -> usize {
        for n in 1..=limit {
            env.clock();
            if env.phase() == phase {
                return n;
            }
        }
        panic!("envelope never reached {phase:?}; stuck in {:?}", env.phase());
    }

    #[test]
    fn starts_silent_and_off() {
        let env = Envelope::new();
        assert_eq!(env.phase(), EnvelopePhase::Off);
        assert_eq!(env.fade(), FADE_SILENT);
    }

    #[test]
    fn sustain_fade_from_level() {
        let mut env = Envelope::new();
        env.set_sustain_release(0xF0);
        assert_eq!(env.sustain_fade(), 0);
        env.set_sustain_release(0x80);
        assert_eq!(env.sustain_fade(), 14);
        env.set_sustain_release(0x00);
        assert_eq!(env.sustain_fade(), 30);
    }

    #[test]
    fn full_sustain_skips_decay() {
        let mut env = Envelope::new();
        env.set_attack_decay(0x00);
        env.set_sustain_release(0xF0);
        assert!(env.gate_on());
        // 32 fade steps of one sample each, then one more to leave attack
        let n = clock_until(&mut env, EnvelopePhase::Sustain, 100);
        assert_eq!(n, 33);
        assert_eq!(env.fade(), 0);
    }

    #[test]
    fn decays_to_sustain_level() {
        let mut env = Envelope::new();
        env.set_attack_decay(0x00);
        env.set_sustain_release(0x80);
        env.gate_on();
        clock_until(&mut env, EnvelopePhase::Decay, 100);
        assert_eq!(env.fade(), 0);
        clock_until(&mut env, EnvelopePhase::Sustain, 1000);
        assert_eq!(env.fade(), 14);
    }

    #[test]
    fn release_fades_to_off() {
        let mut env = Envelope::new();
        env.set_attack_decay(0x00);
        env.set_sustain_release(0xF0);
        env.gate_on();
        clock_until(&mut env, EnvelopePhase::Sustain, 100);
        env.gate_off();
        assert_eq!(env.phase(), EnvelopePhase::Release);
        // Release rate 0: 3 samples per step, 32 steps
        let n = clock_until(&mut env, EnvelopePhase::Off, 1000);
        assert_eq!(n, 32 * 3);
        assert_eq!(env.fade(), FADE_SILENT);
    }

    #[test]
    fn gate_on_only_from_off() {
        let mut env = Envelope::new();
        env.set_attack_decay(0x00);
        env.set_sustain_release(0xF0);
        assert!(env.gate_on());
        env.clock();
        assert!(!env.gate_on());
        assert_eq!(env.phase(), EnvelopePhase::Attack);
    }

    #[test]
    fn gate_off_while_off_is_ignored() {
        let mut env = Envelope::new();
        env.gate_off();
        assert_eq!(env.phase(), EnvelopePhase::Off);
    }

    #[test]
    fn fade_stays_in_range() {
        let mut env = Envelope::new();
        env.set_attack_decay(0x31);
        env.set_sustain_release(0x42);
        env.gate_on();
        for n in 0..20_000 {
            if n == 5_000 {
                env.gate_off();
            }
            env.clock();
            assert!(env.fade() <= FADE_SILENT);
        }
        assert_eq!(env.phase(), EnvelopePhase::Off);
    }
}
