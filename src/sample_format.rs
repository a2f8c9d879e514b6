//! Sample format handling
//!
//! A recording on disk is a flat stream of numeric samples in one of
//! several encodings. [`SampleFormat`] is the single source of truth for
//! those encodings: bytes per sample, the decode rule to [`Complex32`],
//! and the name/extension/SigMF-datatype mappings used when opening files.
//!
//! # Supported formats
//!
//! | Format | Bytes/Sample | Description |
//! |--------|--------------|-------------|
//! | Cf32   | 8            | Complex float32, GNU Radio / USRP native |
//! | Cf64   | 16           | Complex float64, narrowed to f32 on read |
//! | Cs32   | 8            | Complex signed int32 |
//! | Cs16   | 4            | Complex signed int16 |
//! | Cs8    | 2            | Complex signed int8 |
//! | Cu8    | 2            | Complex unsigned int8, RTL-SDR native |
//! | Rf32   | 4            | Real float32 |
//! | Rf64   | 8            | Real float64 |
//! | Rs16   | 2            | Real signed int16 |
//! | Rs8    | 1            | Real signed int8 |
//! | Ru8    | 1            | Real unsigned int8 |
//!
//! # Scaling conventions
//!
//! Signed N-bit integer components are scaled by `1/2^(N-1)` so full scale
//! maps to [-1.0, 1.0). Unsigned 8-bit components are offset by 127.4
//! before scaling; the 0.4 fractional offset matches the DC bias of
//! common 8-bit tuner pipelines and is part of the on-disk contract.
//! Real formats decode a single scalar per sample with a zero imaginary
//! part. All multi-byte values are little-endian; big-endian SigMF
//! datatypes are accepted but decoded as little-endian.

use crate::types::Complex32;

const S8_SCALE: f32 = 1.0 / 128.0;
const S16_SCALE: f32 = 1.0 / 32768.0;
const S32_SCALE: f32 = 1.0 / 2147483648.0;
const U8_OFFSET: f32 = 127.4;

/// On-disk sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleFormat {
    /// Complex float32 (8 bytes/sample). The default for unknown inputs.
    #[default]
    Cf32,
    /// Complex float64 (16 bytes/sample), narrowed to f32.
    Cf64,
    /// Complex signed int32 (8 bytes/sample).
    Cs32,
    /// Complex signed int16 (4 bytes/sample).
    Cs16,
    /// Complex signed int8 (2 bytes/sample).
    Cs8,
    /// Complex unsigned int8 (2 bytes/sample), offset-binary.
    Cu8,
    /// Real float32 (4 bytes/sample).
    Rf32,
    /// Real float64 (8 bytes/sample), narrowed to f32.
    Rf64,
    /// Real signed int16 (2 bytes/sample).
    Rs16,
    /// Real signed int8 (1 byte/sample).
    Rs8,
    /// Real unsigned int8 (1 byte/sample), offset-binary.
    Ru8,
}

impl SampleFormat {
    /// Size of one sample in bytes (both components for complex formats).
    #[inline]
    pub const fn sample_size(&self) -> usize {
        match self {
            SampleFormat::Cf32 => 8,
            SampleFormat::Cf64 => 16,
            SampleFormat::Cs32 => 8,
            SampleFormat::Cs16 => 4,
            SampleFormat::Cs8 => 2,
            SampleFormat::Cu8 => 2,
            SampleFormat::Rf32 => 4,
            SampleFormat::Rf64 => 8,
            SampleFormat::Rs16 => 2,
            SampleFormat::Rs8 => 1,
            SampleFormat::Ru8 => 1,
        }
    }

    /// Whether the format carries an imaginary component.
    #[inline]
    pub const fn is_complex(&self) -> bool {
        matches!(
            self,
            SampleFormat::Cf32
                | SampleFormat::Cf64
                | SampleFormat::Cs32
                | SampleFormat::Cs16
                | SampleFormat::Cs8
                | SampleFormat::Cu8
        )
    }

    /// Short format code (`cf32`, `cs16`, …) as used in override strings.
    pub const fn short_name(&self) -> &'static str {
        match self {
            SampleFormat::Cf32 => "cf32",
            SampleFormat::Cf64 => "cf64",
            SampleFormat::Cs32 => "cs32",
            SampleFormat::Cs16 => "cs16",
            SampleFormat::Cs8 => "cs8",
            SampleFormat::Cu8 => "cu8",
            SampleFormat::Rf32 => "rf32",
            SampleFormat::Rf64 => "rf64",
            SampleFormat::Rs16 => "rs16",
            SampleFormat::Rs8 => "rs8",
            SampleFormat::Ru8 => "ru8",
        }
    }

    /// SigMF `core:datatype` string emitted for this format.
    pub const fn sigmf_datatype(&self) -> &'static str {
        match self {
            SampleFormat::Cf32 => "cf32_le",
            SampleFormat::Cf64 => "cf64_le",
            SampleFormat::Cs32 => "ci32_le",
            SampleFormat::Cs16 => "ci16_le",
            SampleFormat::Cs8 => "ci8",
            SampleFormat::Cu8 => "cu8",
            SampleFormat::Rf32 => "rf32_le",
            SampleFormat::Rf64 => "rf64_le",
            SampleFormat::Rs16 => "ri16_le",
            SampleFormat::Rs8 => "ri8",
            SampleFormat::Ru8 => "ru8",
        }
    }

    /// Parse a short format code (case-insensitive).
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cf32" => Some(SampleFormat::Cf32),
            "cf64" => Some(SampleFormat::Cf64),
            "cs32" => Some(SampleFormat::Cs32),
            "cs16" => Some(SampleFormat::Cs16),
            "cs8" => Some(SampleFormat::Cs8),
            "cu8" => Some(SampleFormat::Cu8),
            "rf32" => Some(SampleFormat::Rf32),
            "rf64" => Some(SampleFormat::Rf64),
            "rs16" => Some(SampleFormat::Rs16),
            "rs8" => Some(SampleFormat::Rs8),
            "ru8" => Some(SampleFormat::Ru8),
            _ => None,
        }
    }

    /// Detect the format from a filename extension (case-insensitive).
    ///
    /// The table covers the extensions conventional SDR tools emit; SigMF
    /// extensions map to `cf32` and are expected to be overridden by the
    /// parsed `core:datatype`. Unknown extensions return `None` and callers
    /// fall back to [`SampleFormat::Cf32`].
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "cfile" | "cf32" | "fc32" | "raw" | "iq" => Some(SampleFormat::Cf32),
            "cf64" | "fc64" => Some(SampleFormat::Cf64),
            "cs32" | "sc32" | "c32" => Some(SampleFormat::Cs32),
            "cs16" | "sc16" | "c16" => Some(SampleFormat::Cs16),
            "cs8" | "sc8" | "c8" => Some(SampleFormat::Cs8),
            "cu8" | "uc8" => Some(SampleFormat::Cu8),
            "sigmf-data" | "sigmf-meta" => Some(SampleFormat::Cf32),
            "f32" => Some(SampleFormat::Rf32),
            "f64" => Some(SampleFormat::Rf64),
            "s16" => Some(SampleFormat::Rs16),
            "s8" => Some(SampleFormat::Rs8),
            "u8" => Some(SampleFormat::Ru8),
            _ => None,
        }
    }

    /// Parse a SigMF `core:datatype` string.
    ///
    /// The endianness suffix is stripped: `_be` types decode as
    /// little-endian, an accepted limitation. Both SigMF integer names
    /// (`ci16`, `ri8`) and this engine's own codes (`cs16`, `rs8`) are
    /// accepted.
    pub fn from_sigmf_datatype(datatype: &str) -> Option<Self> {
        let base = datatype
            .strip_suffix("_le")
            .or_else(|| datatype.strip_suffix("_be"))
            .unwrap_or(datatype);
        Self::from_name(base).or(match base {
            "ci32" => Some(SampleFormat::Cs32),
            "ci16" => Some(SampleFormat::Cs16),
            "ci8" => Some(SampleFormat::Cs8),
            "ri16" => Some(SampleFormat::Rs16),
            "ri8" => Some(SampleFormat::Rs8),
            _ => None,
        })
    }

    /// Decode `count` samples starting at sample index `start` from raw
    /// file bytes into `dest`.
    ///
    /// The caller guarantees that `src` holds at least
    /// `(start + count) * sample_size()` bytes and that `dest` holds
    /// `count` slots; real formats produce an exactly-zero imaginary part.
    pub fn decode_range(&self, src: &[u8], start: usize, count: usize, dest: &mut [Complex32]) {
        debug_assert!(src.len() >= (start + count) * self.sample_size());
        debug_assert!(dest.len() >= count);
        let base = start * self.sample_size();
        let bytes = &src[base..base + count * self.sample_size()];

        match self {
            SampleFormat::Cf32 => {
                for (pair, d) in bytes.chunks_exact(8).zip(dest.iter_mut()) {
                    *d = Complex32::new(le_f32(&pair[0..4]), le_f32(&pair[4..8]));
                }
            }
            SampleFormat::Cf64 => {
                for (pair, d) in bytes.chunks_exact(16).zip(dest.iter_mut()) {
                    *d = Complex32::new(le_f64(&pair[0..8]) as f32, le_f64(&pair[8..16]) as f32);
                }
            }
            SampleFormat::Cs32 => {
                for (pair, d) in bytes.chunks_exact(8).zip(dest.iter_mut()) {
                    *d = Complex32::new(
                        le_i32(&pair[0..4]) as f32 * S32_SCALE,
                        le_i32(&pair[4..8]) as f32 * S32_SCALE,
                    );
                }
            }
            SampleFormat::Cs16 => {
                for (pair, d) in bytes.chunks_exact(4).zip(dest.iter_mut()) {
                    *d = Complex32::new(
                        le_i16(&pair[0..2]) as f32 * S16_SCALE,
                        le_i16(&pair[2..4]) as f32 * S16_SCALE,
                    );
                }
            }
            SampleFormat::Cs8 => {
                for (pair, d) in bytes.chunks_exact(2).zip(dest.iter_mut()) {
                    *d = Complex32::new(
                        pair[0] as i8 as f32 * S8_SCALE,
                        pair[1] as i8 as f32 * S8_SCALE,
                    );
                }
            }
            SampleFormat::Cu8 => {
                for (pair, d) in bytes.chunks_exact(2).zip(dest.iter_mut()) {
                    *d = Complex32::new(
                        (pair[0] as f32 - U8_OFFSET) * S8_SCALE,
                        (pair[1] as f32 - U8_OFFSET) * S8_SCALE,
                    );
                }
            }
            SampleFormat::Rf32 => {
                for (b, d) in bytes.chunks_exact(4).zip(dest.iter_mut()) {
                    *d = Complex32::new(le_f32(b), 0.0);
                }
            }
            SampleFormat::Rf64 => {
                for (b, d) in bytes.chunks_exact(8).zip(dest.iter_mut()) {
                    *d = Complex32::new(le_f64(b) as f32, 0.0);
                }
            }
            SampleFormat::Rs16 => {
                for (b, d) in bytes.chunks_exact(2).zip(dest.iter_mut()) {
                    *d = Complex32::new(le_i16(b) as f32 * S16_SCALE, 0.0);
                }
            }
            SampleFormat::Rs8 => {
                for (&b, d) in bytes.iter().zip(dest.iter_mut()) {
                    *d = Complex32::new(b as i8 as f32 * S8_SCALE, 0.0);
                }
            }
            SampleFormat::Ru8 => {
                for (&b, d) in bytes.iter().zip(dest.iter_mut()) {
                    *d = Complex32::new((b as f32 - U8_OFFSET) * S8_SCALE, 0.0);
                }
            }
        }
    }

    /// Encode complex samples into this format's on-disk byte layout.
    ///
    /// Used by the SigMF export path; full-scale clamping matches the
    /// decode-side scaling.
    pub fn encode(&self, samples: &[Complex32]) -> Vec<u8> {
        let mut out = Vec::with_capacity(samples.len() * self.sample_size());
        for s in samples {
            match self {
                SampleFormat::Cf32 => {
                    out.extend_from_slice(&s.re.to_le_bytes());
                    out.extend_from_slice(&s.im.to_le_bytes());
                }
                SampleFormat::Cf64 => {
                    out.extend_from_slice(&(s.re as f64).to_le_bytes());
                    out.extend_from_slice(&(s.im as f64).to_le_bytes());
                }
                SampleFormat::Cs16 => {
                    let re = (s.re * 32767.0).clamp(-32768.0, 32767.0) as i16;
                    let im = (s.im * 32767.0).clamp(-32768.0, 32767.0) as i16;
                    out.extend_from_slice(&re.to_le_bytes());
                    out.extend_from_slice(&im.to_le_bytes());
                }
                SampleFormat::Cs8 => {
                    let re = (s.re * 127.0).clamp(-128.0, 127.0) as i8;
                    let im = (s.im * 127.0).clamp(-128.0, 127.0) as i8;
                    out.push(re as u8);
                    out.push(im as u8);
                }
                _ => {
                    // Export only targets the complex formats above.
                    out.extend_from_slice(&s.re.to_le_bytes());
                    out.extend_from_slice(&s.im.to_le_bytes());
                }
            }
        }
        out
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

impl std::str::FromStr for SampleFormat {
    type Err = crate::types::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleFormat::from_name(s).ok_or_else(|| crate::types::EngineError::Format(s.to_string()))
    }
}

#[inline]
fn le_f32(b: &[u8]) -> f32 {
    f32::from_le_bytes(b.try_into().unwrap())
}

#[inline]
fn le_f64(b: &[u8]) -> f64 {
    f64::from_le_bytes(b.try_into().unwrap())
}

#[inline]
fn le_i16(b: &[u8]) -> i16 {
    i16::from_le_bytes(b.try_into().unwrap())
}

#[inline]
fn le_i32(b: &[u8]) -> i32 {
    i32::from_le_bytes(b.try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sample_sizes() {
        assert_eq!(SampleFormat::Cf32.sample_size(), 8);
        assert_eq!(SampleFormat::Cf64.sample_size(), 16);
        assert_eq!(SampleFormat::Cs32.sample_size(), 8);
        assert_eq!(SampleFormat::Cs16.sample_size(), 4);
        assert_eq!(SampleFormat::Cs8.sample_size(), 2);
        assert_eq!(SampleFormat::Cu8.sample_size(), 2);
        assert_eq!(SampleFormat::Rf32.sample_size(), 4);
        assert_eq!(SampleFormat::Rf64.sample_size(), 8);
        assert_eq!(SampleFormat::Rs16.sample_size(), 2);
        assert_eq!(SampleFormat::Rs8.sample_size(), 1);
        assert_eq!(SampleFormat::Ru8.sample_size(), 1);
    }

    #[test]
    fn test_extension_table() {
        for ext in ["cfile", "cf32", "fc32", "raw", "iq"] {
            assert_eq!(SampleFormat::from_extension(ext), Some(SampleFormat::Cf32));
        }
        assert_eq!(SampleFormat::from_extension("SC16"), Some(SampleFormat::Cs16));
        assert_eq!(SampleFormat::from_extension("uc8"), Some(SampleFormat::Cu8));
        assert_eq!(SampleFormat::from_extension("f32"), Some(SampleFormat::Rf32));
        assert_eq!(SampleFormat::from_extension("u8"), Some(SampleFormat::Ru8));
        assert_eq!(
            SampleFormat::from_extension("sigmf-data"),
            Some(SampleFormat::Cf32)
        );
        assert_eq!(SampleFormat::from_extension("wav"), None);
    }

    #[test]
    fn test_sigmf_datatype_mapping() {
        assert_eq!(
            SampleFormat::from_sigmf_datatype("cf32_le"),
            Some(SampleFormat::Cf32)
        );
        assert_eq!(
            SampleFormat::from_sigmf_datatype("ci16_le"),
            Some(SampleFormat::Cs16)
        );
        // Big-endian decodes as little-endian (accepted limitation).
        assert_eq!(
            SampleFormat::from_sigmf_datatype("ci32_be"),
            Some(SampleFormat::Cs32)
        );
        assert_eq!(
            SampleFormat::from_sigmf_datatype("ci8"),
            Some(SampleFormat::Cs8)
        );
        assert_eq!(
            SampleFormat::from_sigmf_datatype("ru8"),
            Some(SampleFormat::Ru8)
        );
        assert_eq!(SampleFormat::from_sigmf_datatype("nf7"), None);
    }

    #[test]
    fn test_decode_cf32() {
        let samples = [Complex32::new(0.5, -0.25), Complex32::new(1.0, 2.0)];
        let mut bytes = Vec::new();
        for s in &samples {
            bytes.extend_from_slice(&s.re.to_le_bytes());
            bytes.extend_from_slice(&s.im.to_le_bytes());
        }
        let mut out = vec![Complex32::default(); 2];
        SampleFormat::Cf32.decode_range(&bytes, 0, 2, &mut out);
        assert_eq!(out[0], samples[0]);
        assert_eq!(out[1], samples[1]);
    }

    #[test]
    fn test_decode_cs16_full_scale() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&i16::MIN.to_le_bytes());
        bytes.extend_from_slice(&16384i16.to_le_bytes());
        let mut out = vec![Complex32::default(); 1];
        SampleFormat::Cs16.decode_range(&bytes, 0, 1, &mut out);
        assert_eq!(out[0].re, -1.0);
        assert_eq!(out[0].im, 0.5);
    }

    #[test]
    fn test_decode_cu8_offset() {
        let bytes = [127u8, 128u8];
        let mut out = vec![Complex32::default(); 1];
        SampleFormat::Cu8.decode_range(&bytes, 0, 1, &mut out);
        // (127 - 127.4) / 128 and (128 - 127.4) / 128
        assert_abs_diff_eq!(out[0].re, -0.003125, epsilon = 1e-6);
        assert_abs_diff_eq!(out[0].im, 0.0046875, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_real_has_zero_imag() {
        let bytes = 0.75f32.to_le_bytes();
        let mut out = vec![Complex32::new(9.0, 9.0); 1];
        SampleFormat::Rf32.decode_range(&bytes, 0, 1, &mut out);
        assert_eq!(out[0].re, 0.75);
        assert_eq!(out[0].im, 0.0);
    }

    #[test]
    fn test_decode_with_sample_offset() {
        let mut bytes = Vec::new();
        for v in [10i8, 20, 30, 40, 50, 60] {
            bytes.push(v as u8);
        }
        let mut out = vec![Complex32::default(); 1];
        // Sample index 2 of a cs8 stream starts at byte 4.
        SampleFormat::Cs8.decode_range(&bytes, 2, 1, &mut out);
        assert_abs_diff_eq!(out[0].re, 50.0 / 128.0, epsilon = 1e-7);
        assert_abs_diff_eq!(out[0].im, 60.0 / 128.0, epsilon = 1e-7);
    }

    #[test]
    fn test_encode_cf32_roundtrip() {
        let samples = vec![Complex32::new(0.1, -0.9), Complex32::new(-0.5, 0.5)];
        let bytes = SampleFormat::Cf32.encode(&samples);
        assert_eq!(bytes.len(), 16);
        let mut out = vec![Complex32::default(); 2];
        SampleFormat::Cf32.decode_range(&bytes, 0, 2, &mut out);
        assert_eq!(out, samples);
    }

    #[test]
    fn test_format_parse_and_display() {
        assert_eq!(SampleFormat::from_name("CS16"), Some(SampleFormat::Cs16));
        assert_eq!(SampleFormat::from_name("bogus"), None);
        assert_eq!(format!("{}", SampleFormat::Cu8), "cu8");
        assert_eq!("cf64".parse::<SampleFormat>().unwrap(), SampleFormat::Cf64);
        assert!("x99".parse::<SampleFormat>().is_err());
        assert_eq!(SampleFormat::default(), SampleFormat::Cf32);
    }
}
