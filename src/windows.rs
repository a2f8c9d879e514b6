//! Window functions for spectral analysis and FIR design
//!
//! | Window     | Sidelobe Level | Use here                          |
//! |------------|----------------|-----------------------------------|
//! | Hann       | -32 dB         | Spectrogram lines (default)       |
//! | Hamming    | -43 dB         | Alternative analysis window       |
//! | Blackman   | -58 dB         | High dynamic range analysis       |
//! | Kaiser(β)  | adjustable     | Bandpass FIR design               |
//!
//! Coefficients are computed in f64 and narrowed to f32 once, matching the
//! engine's single-precision sample path.

use std::f64::consts::PI;

/// Window function type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Window {
    /// Rectangular window (no shaping).
    Rectangular,
    /// Hann window: 0.5·(1 − cos(2πn/(N−1))).
    Hann,
    /// Hamming window: 0.54 − 0.46·cos(2πn/(N−1)).
    Hamming,
    /// Blackman window: 0.42 − 0.5·cos(2πn/(N−1)) + 0.08·cos(4πn/(N−1)).
    Blackman,
    /// Kaiser window with shape parameter β.
    Kaiser(f64),
}

impl Default for Window {
    fn default() -> Self {
        Window::Hann
    }
}

impl Window {
    /// Generate window coefficients for the given length.
    pub fn generate(&self, length: usize) -> Vec<f32> {
        match self {
            Window::Rectangular => vec![1.0; length],
            Window::Hann => hann_window(length),
            Window::Hamming => hamming_window(length),
            Window::Blackman => blackman_window(length),
            Window::Kaiser(beta) => kaiser_window(length, *beta),
        }
    }
}

/// Generate a Hann window.
pub fn hann_window(length: usize) -> Vec<f32> {
    cosine_window(length, |x| 0.5 * (1.0 - x.cos()))
}

/// Generate a Hamming window.
pub fn hamming_window(length: usize) -> Vec<f32> {
    cosine_window(length, |x| 0.54 - 0.46 * x.cos())
}

/// Generate a Blackman window.
pub fn blackman_window(length: usize) -> Vec<f32> {
    cosine_window(length, |x| 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos())
}

fn cosine_window(length: usize, f: impl Fn(f64) -> f64) -> Vec<f32> {
    if length == 0 {
        return vec![];
    }
    if length == 1 {
        return vec![1.0];
    }
    let n_minus_1 = (length - 1) as f64;
    (0..length)
        .map(|n| f(2.0 * PI * n as f64 / n_minus_1) as f32)
        .collect()
}

/// Generate a Kaiser window with shape parameter β.
///
/// β controls the sidelobe/main-lobe trade-off: 0 is rectangular, ~5.65
/// gives 60 dB stop-band attenuation when used for FIR design.
pub fn kaiser_window(length: usize, beta: f64) -> Vec<f32> {
    if length == 0 {
        return vec![];
    }
    if length == 1 {
        return vec![1.0];
    }
    let half = (length - 1) as f64 / 2.0;
    let i0_beta = bessel_i0(beta);
    (0..length)
        .map(|n| {
            let x = (n as f64 - half) / half;
            (bessel_i0(beta * (1.0 - x * x).sqrt()) / i0_beta) as f32
        })
        .collect()
}

/// Kaiser β parameter for a desired stop-band attenuation in dB.
pub fn kaiser_beta_from_attenuation(attenuation_db: f64) -> f64 {
    if attenuation_db > 50.0 {
        0.1102 * (attenuation_db - 8.7)
    } else if attenuation_db >= 21.0 {
        0.5842 * (attenuation_db - 21.0).powf(0.4) + 0.07886 * (attenuation_db - 21.0)
    } else {
        0.0
    }
}

/// Estimated Kaiser filter order for a normalized transition width and
/// stop-band attenuation.
pub fn kaiser_order(transition_width: f64, attenuation_db: f64) -> usize {
    let num = attenuation_db - 7.95;
    let denom = 14.36 * transition_width;
    ((num / denom).ceil() as usize).max(1)
}

/// Modified Bessel function of the first kind, order 0.
fn bessel_i0(x: f64) -> f64 {
    if x.abs() < 1e-10 {
        return 1.0;
    }
    let ax = x.abs();
    if ax < 3.75 {
        let t = (x / 3.75).powi(2);
        1.0 + t
            * (3.5156229
                + t * (3.0899424
                    + t * (1.2067492 + t * (0.2659732 + t * (0.0360768 + t * 0.0045813)))))
    } else {
        let t = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.39894228
                + t * (0.01328592
                    + t * (0.00225319
                        + t * (-0.00157565
                            + t * (0.00916281
                                + t * (-0.02057706
                                    + t * (0.02635537 + t * (-0.01647633 + t * 0.00392377))))))))
    }
}
