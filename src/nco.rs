//! Numerically controlled oscillator
//!
//! Phase-accumulator oscillator used by the export path to translate a
//! band of interest down to baseband before low-pass filtering. The phase
//! accumulates in f64 and wraps to ±π so long blocks stay drift-free.

use std::f64::consts::PI;

use crate::types::Complex32;

/// Complex oscillator with exact phase tracking.
#[derive(Debug, Clone)]
pub struct Nco {
    phase: f64,
    phase_inc: f64,
}

impl Nco {
    /// Create an oscillator at `frequency` Hz for the given sample rate,
    /// starting at phase 0.
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        Self {
            phase: 0.0,
            phase_inc: 2.0 * PI * frequency / sample_rate,
        }
    }

    /// Generate one sample of `exp(jφ)` and advance the phase.
    pub fn step(&mut self) -> Complex32 {
        let sample = Complex32::new(self.phase.cos() as f32, self.phase.sin() as f32);
        self.phase += self.phase_inc;
        if self.phase > PI {
            self.phase -= 2.0 * PI;
        } else if self.phase < -PI {
            self.phase += 2.0 * PI;
        }
        sample
    }

    /// Mix a block down to baseband in place: each sample is multiplied by
    /// `exp(−jφ)`, shifting the oscillator frequency to DC.
    pub fn mix_down_inplace(&mut self, samples: &mut [Complex32]) {
        for s in samples.iter_mut() {
            let lo = self.step();
            *s *= lo.conj();
        }
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f64 {
        self.phase
    }
}
