//! Bandpass extraction for the export path
//!
//! Extracts a band of interest from a wideband block by mixing its center
//! to baseband and applying a Kaiser-windowed low-pass FIR:
//!
//! ```text
//! input → [×exp(−j2πf_c·n)] → [Kaiser FIR lowpass] → output
//! ```
//!
//! One output sample is emitted per input sample; the filter's leading
//! transient is accepted. The FIR targets 60 dB stop-band attenuation,
//! with the tap count estimated from the transition width (capped at 0.05
//! normalized) and floored at 4 taps.

use crate::nco::Nco;
use crate::types::Complex32;
use crate::windows::{kaiser_beta_from_attenuation, kaiser_order, kaiser_window};

/// Stop-band attenuation target for the export filter.
const STOPBAND_DB: f64 = 60.0;

/// Design a Kaiser-windowed sinc low-pass filter.
///
/// `cutoff` is the normalized cutoff (cycles/sample, 0..0.5). Taps are
/// normalized to unit DC gain.
pub fn design_kaiser_lowpass(num_taps: usize, cutoff: f64, attenuation_db: f64) -> Vec<f32> {
    let num_taps = num_taps.max(1);
    let beta = kaiser_beta_from_attenuation(attenuation_db);
    let window = kaiser_window(num_taps, beta);
    let mid = (num_taps - 1) as f64 / 2.0;

    let mut taps: Vec<f64> = (0..num_taps)
        .map(|i| {
            let n = i as f64 - mid;
            let sinc = if n.abs() < 1e-10 {
                2.0 * cutoff
            } else {
                (2.0 * std::f64::consts::PI * cutoff * n).sin() / (std::f64::consts::PI * n)
            };
            sinc * window[i] as f64
        })
        .collect();

    let sum: f64 = taps.iter().sum();
    if sum.abs() > 1e-10 {
        for t in &mut taps {
            *t /= sum;
        }
    }
    taps.into_iter().map(|t| t as f32).collect()
}

/// Streaming complex FIR filter over a delay line.
#[derive(Debug, Clone)]
pub struct FirFilter {
    taps: Vec<f32>,
    delay_line: Vec<Complex32>,
    write_idx: usize,
}

impl FirFilter {
    /// Create a filter from designed taps.
    pub fn new(taps: Vec<f32>) -> Self {
        let n = taps.len().max(1);
        Self {
            taps,
            delay_line: vec![Complex32::default(); n],
            write_idx: 0,
        }
    }

    /// Number of taps.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Whether the filter has no taps.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Push one sample and produce one output sample.
    pub fn process_sample(&mut self, sample: Complex32) -> Complex32 {
        let n = self.taps.len();
        self.delay_line[self.write_idx] = sample;
        self.write_idx = (self.write_idx + 1) % n;

        let mut acc = Complex32::default();
        for (k, &tap) in self.taps.iter().enumerate() {
            let idx = (self.write_idx + n - 1 - k) % n;
            acc += self.delay_line[idx] * tap;
        }
        acc
    }
}

/// Mix a block to baseband and band-limit it.
///
/// `center_freq` is the band center in Hz relative to the recording's
/// baseband, `bandwidth` the two-sided width in Hz. The normalized cutoff
/// `bandwidth / (2·sample_rate)` is clamped to 0.49.
pub fn bandpass_filter(
    input: &[Complex32],
    center_freq: f64,
    bandwidth: f64,
    sample_rate: f64,
) -> Vec<Complex32> {
    let cutoff = (bandwidth / (2.0 * sample_rate)).min(0.49);
    let transition = cutoff.min(0.05);
    let num_taps = kaiser_order(transition, STOPBAND_DB).max(4);
    let taps = design_kaiser_lowpass(num_taps, cutoff, STOPBAND_DB);

    let mut mixed = input.to_vec();
    let mut nco = Nco::new(center_freq, sample_rate);
    nco.mix_down_inplace(&mut mixed);

    let mut filter = FirFilter::new(taps);
    mixed.iter().map(|&s| filter.process_sample(s)).collect()
}
