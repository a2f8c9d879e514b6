//! Correlation engines for pattern search and timing discovery
//!
//! Two estimators back the interactive correlation pane:
//!
//! - [`cross_correlate`]: FFT-based normalized matched filtering of a
//!   template against a signal window. O((M+L)·log(M+L)).
//! - [`self_correlate`]: sliding cyclic-prefix autocorrelation
//!   (Schmidl & Cox style) for OFDM symbol/timing discovery. O(M).
//!
//! Both produce dense `f32` magnitude arrays normalized to [0, 1]: a value
//! of 1.0 means the overlapping regions are identical up to a complex
//! scale factor.

use num_complex::Complex;

use crate::fft_engine::{plan_forward, plan_inverse};
use crate::types::{Complex32, EngineError, EngineResult};

/// Denominator guard: energies below this yield 0.0 instead of dividing.
const ENERGY_EPSILON: f64 = 1e-12;

/// Normalized cross-correlation of `template` against `signal`.
///
/// Output length is `M + L − 1` where M and L are the (post-swap) signal
/// and template lengths; output index `i` corresponds to lag
/// `k = i − (L − 1)`, so the template aligned at the start of the signal
/// peaks at index `L − 1`. Each magnitude is divided by the square root of
/// the product of the overlapping energies, which bounds the output to
/// [0, 1] and makes a perfect match read exactly 1.0.
///
/// If the caller's template is longer than the signal the operands are
/// transposed so the shorter sequence always slides through the longer
/// one; the magnitude output is symmetric under this swap.
pub fn cross_correlate(signal: &[Complex32], template: &[Complex32]) -> Vec<f32> {
    if signal.is_empty() || template.is_empty() {
        return Vec::new();
    }

    // The shorter sequence slides through the longer one.
    let (signal, template) = if template.len() > signal.len() {
        (template, signal)
    } else {
        (signal, template)
    };
    let m = signal.len();
    let l = template.len();

    let fft_len = (m + l - 1).next_power_of_two();
    let forward = plan_forward(fft_len);
    let inverse = plan_inverse(fft_len);
    let mut scratch =
        vec![Complex32::default(); forward.get_inplace_scratch_len().max(inverse.get_inplace_scratch_len())];

    let mut sig_fft = vec![Complex32::default(); fft_len];
    sig_fft[..m].copy_from_slice(signal);
    forward.process_with_scratch(&mut sig_fft, &mut scratch);

    let mut tmpl_fft = vec![Complex32::default(); fft_len];
    tmpl_fft[..l].copy_from_slice(template);
    forward.process_with_scratch(&mut tmpl_fft, &mut scratch);

    // Pointwise Signal · conj(Template), then back to the lag domain.
    for (s, t) in sig_fft.iter_mut().zip(tmpl_fft.iter()) {
        *s *= t.conj();
    }
    inverse.process_with_scratch(&mut sig_fft, &mut scratch);

    // Prefix sums of |x|² for O(1) overlap energies at every lag.
    let sig_energy = cumulative_energy(signal);
    let tmpl_energy = cumulative_energy(template);

    let out_len = m + l - 1;
    let inv_n = 1.0 / fft_len as f32;
    let mut output = vec![0.0f32; out_len];

    for (i, out) in output.iter_mut().enumerate() {
        // Lag k runs from -(L-1) to M-1; negative lags wrap circularly.
        let k = i as isize - (l as isize - 1);
        let fft_idx = if k >= 0 {
            k as usize
        } else {
            (fft_len as isize + k) as usize
        };
        let mag = sig_fft[fft_idx].norm() as f64 * inv_n as f64;

        let sig_lo = k.max(0) as usize;
        let sig_hi = (k + l as isize).min(m as isize) as usize;
        let e_sig = sig_energy[sig_hi] - sig_energy[sig_lo];

        let tmpl_lo = (-k).max(0) as usize;
        let tmpl_hi = (m as isize - k).min(l as isize) as usize;
        let e_tmpl = tmpl_energy[tmpl_hi] - tmpl_energy[tmpl_lo];

        let denom = (e_sig * e_tmpl).sqrt();
        *out = if denom > ENERGY_EPSILON {
            (mag / denom) as f32
        } else {
            0.0
        };
    }

    output
}

/// Sliding cyclic-prefix self-correlation.
///
/// For each window position `j`, correlates `cp_len` samples at `j` with
/// the `cp_len` samples at `j + tu` and normalizes by the energies of the
/// two windows. A cyclic-prefixed OFDM symbol produces a plateau of 1.0
/// over the prefix region. Output length is `M − tu − cp_len + 1`; a
/// signal shorter than `tu + cp_len` yields an empty output.
///
/// The three accumulators (product sum and both window energies) are
/// updated incrementally, one add and one subtract per step.
pub fn self_correlate(signal: &[Complex32], tu: usize, cp_len: usize) -> EngineResult<Vec<f32>> {
    if cp_len == 0 {
        return Err(EngineError::InvalidArgument(
            "cp_len must be at least 1".into(),
        ));
    }
    let m = signal.len();
    if m < tu + cp_len {
        return Ok(Vec::new());
    }

    let out_len = m - tu - cp_len + 1;
    let mut output = vec![0.0f32; out_len];

    // f64 accumulators keep the running sums stable over long windows.
    let mut product_sum = Complex::<f64>::new(0.0, 0.0);
    let mut energy_a = 0.0f64;
    let mut energy_b = 0.0f64;

    for i in 0..cp_len {
        let a = widen(signal[i]);
        let b = widen(signal[i + tu]);
        product_sum += a * b.conj();
        energy_a += a.norm_sqr();
        energy_b += b.norm_sqr();
    }
    output[0] = normalized_magnitude(product_sum, energy_a, energy_b);

    for j in 1..out_len {
        let leaving = j - 1;
        let entering = j + cp_len - 1;

        let a_out = widen(signal[leaving]);
        let b_out = widen(signal[leaving + tu]);
        let a_in = widen(signal[entering]);
        let b_in = widen(signal[entering + tu]);

        product_sum += a_in * b_in.conj() - a_out * b_out.conj();
        energy_a += a_in.norm_sqr() - a_out.norm_sqr();
        energy_b += b_in.norm_sqr() - b_out.norm_sqr();

        output[j] = normalized_magnitude(product_sum, energy_a, energy_b);
    }

    Ok(output)
}

fn cumulative_energy(samples: &[Complex32]) -> Vec<f64> {
    let mut cum = Vec::with_capacity(samples.len() + 1);
    let mut acc = 0.0f64;
    cum.push(0.0);
    for s in samples {
        acc += s.norm_sqr() as f64;
        cum.push(acc);
    }
    cum
}

#[inline]
fn widen(s: Complex32) -> Complex<f64> {
    Complex::new(s.re as f64, s.im as f64)
}

#[inline]
fn normalized_magnitude(product_sum: Complex<f64>, energy_a: f64, energy_b: f64) -> f32 {
    let denom = (energy_a * energy_b).sqrt();
    if denom > ENERGY_EPSILON {
        (product_sum.norm() / denom) as f32
    } else {
        0.0
    }
}
