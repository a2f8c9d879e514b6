//! Spectrogram tiler
//!
//! A tile is the unit of asynchronous spectrogram work: up to
//! [`TILE_LINES`] consecutive FFT lines starting at a given sample, with
//! the hop between lines derived from the zoom level
//! (`stride = fft_size / zoom_level`). Lines are only emitted where the
//! full FFT window fits inside the file; partial tail windows are
//! suppressed rather than zero-padded, which would smear edge artifacts
//! into the display.

use tracing::debug;

use crate::fft_engine::FftEngine;
use crate::input_source::InputSource;
use crate::types::{Complex32, EngineError, EngineResult};
use crate::windows::Window;

/// Maximum FFT lines per tile.
pub const TILE_LINES: usize = 256;

/// Parameters of one tile request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRequest {
    /// First sample of the first line.
    pub start_sample: usize,
    /// FFT size N (power of two).
    pub fft_size: usize,
    /// Zoom level Z ≥ 1; the hop between lines is `N / Z`.
    pub zoom_level: usize,
}

/// A dense row-major tile of log-power FFT lines.
#[derive(Debug, Clone)]
pub struct SpectrogramTile {
    /// First sample of the first line.
    pub start_sample: usize,
    /// Bins per line.
    pub fft_size: usize,
    /// Hop between consecutive lines in samples.
    pub stride: usize,
    /// Number of lines actually produced (≤ [`TILE_LINES`]).
    pub lines: usize,
    /// `lines × fft_size` log-power values, DC-centered per row.
    pub power: Vec<f32>,
}

/// Compute one spectrogram tile from the source.
///
/// Fails with `InvalidArgument` for a non-power-of-two FFT size or a zoom
/// level outside `[1, fft_size]`, and with `EmptyTile` when not even one
/// full window fits past `start_sample`.
pub fn compute_tile(source: &InputSource, request: TileRequest) -> EngineResult<SpectrogramTile> {
    let TileRequest {
        start_sample,
        fft_size,
        zoom_level,
    } = request;

    if zoom_level < 1 || zoom_level > fft_size {
        return Err(EngineError::InvalidArgument(format!(
            "zoom_level must be in [1, {fft_size}], got {zoom_level}"
        )));
    }
    let mut engine = FftEngine::new(fft_size, Window::Hann)?;
    let stride = fft_size / zoom_level;

    let total = source.total_samples();
    let max_lines = if start_sample + fft_size <= total {
        (total - start_sample - fft_size) / stride + 1
    } else {
        0
    };
    let lines = TILE_LINES.min(max_lines);
    if lines == 0 {
        return Err(EngineError::EmptyTile);
    }

    let mut power = vec![0.0f32; lines * fft_size];
    let mut window_buf = vec![Complex32::default(); fft_size];

    for (line, row) in power.chunks_exact_mut(fft_size).enumerate() {
        let offset = start_sample + line * stride;
        let read = source.read_into(offset, fft_size, &mut window_buf);
        debug_assert_eq!(read, fft_size);
        engine.compute_power_spectrum(&window_buf, row);
    }

    debug!(start_sample, fft_size, stride, lines, "computed spectrogram tile");

    Ok(SpectrogramTile {
        start_sample,
        fft_size,
        stride,
        lines,
        power,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_format::SampleFormat;
    use std::io::Write;
    use tempfile::TempDir;

    fn tone_source(dir: &TempDir, n: usize, bin_freq: f32) -> std::sync::Arc<InputSource> {
        let samples: Vec<Complex32> = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * bin_freq * i as f32;
                Complex32::new(phase.cos(), phase.sin())
            })
            .collect();
        let path = dir.path().join("tone.cf32");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&SampleFormat::Cf32.encode(&samples))
            .unwrap();
        InputSource::open(&path, None).unwrap()
    }

    #[test]
    fn test_full_tile_line_count() {
        let dir = TempDir::new().unwrap();
        let source = tone_source(&dir, 200_000, 0.125);

        let tile = compute_tile(
            &source,
            TileRequest {
                start_sample: 0,
                fft_size: 256,
                zoom_level: 1,
            },
        )
        .unwrap();

        assert_eq!(tile.lines, 256);
        assert_eq!(tile.stride, 256);
        assert_eq!(tile.power.len(), 256 * 256);
    }

    #[test]
    fn test_partial_tile_near_eof() {
        let dir = TempDir::new().unwrap();
        // 1000 samples, N=256, stride=256: windows at 0, 256, 512, 744 is
        // out -> (1000-256)/256 + 1 = 3 lines.
        let source = tone_source(&dir, 1000, 0.125);

        let tile = compute_tile(
            &source,
            TileRequest {
                start_sample: 0,
                fft_size: 256,
                zoom_level: 1,
            },
        )
        .unwrap();
        assert_eq!(tile.lines, 3);
    }

    #[test]
    fn test_zoom_shrinks_stride() {
        let dir = TempDir::new().unwrap();
        let source = tone_source(&dir, 4096, 0.125);

        let tile = compute_tile(
            &source,
            TileRequest {
                start_sample: 0,
                fft_size: 256,
                zoom_level: 4,
            },
        )
        .unwrap();
        assert_eq!(tile.stride, 64);
        // (4096 - 256)/64 + 1 = 61 lines
        assert_eq!(tile.lines, 61);
    }

    #[test]
    fn test_empty_tile_past_eof() {
        let dir = TempDir::new().unwrap();
        let source = tone_source(&dir, 512, 0.125);

        let err = compute_tile(
            &source,
            TileRequest {
                start_sample: 400,
                fft_size: 256,
                zoom_level: 1,
            },
        )
        .unwrap_err();
        assert_eq!(err, EngineError::EmptyTile);
    }

    #[test]
    fn test_invalid_arguments() {
        let dir = TempDir::new().unwrap();
        let source = tone_source(&dir, 1024, 0.125);

        assert!(matches!(
            compute_tile(
                &source,
                TileRequest {
                    start_sample: 0,
                    fft_size: 100,
                    zoom_level: 1
                }
            ),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            compute_tile(
                &source,
                TileRequest {
                    start_sample: 0,
                    fft_size: 256,
                    zoom_level: 0
                }
            ),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            compute_tile(
                &source,
                TileRequest {
                    start_sample: 0,
                    fft_size: 256,
                    zoom_level: 512
                }
            ),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_tone_peaks_in_every_line() {
        let dir = TempDir::new().unwrap();
        let n = 64;
        // Tone at bin 16 of a 64-bin FFT: bin_freq = 16/64.
        let source = tone_source(&dir, 8192, 16.0 / 64.0);

        let tile = compute_tile(
            &source,
            TileRequest {
                start_sample: 0,
                fft_size: n,
                zoom_level: 1,
            },
        )
        .unwrap();

        for row in tile.power.chunks_exact(n) {
            let (peak, _) = row
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                .unwrap();
            assert_eq!(peak, n / 2 + 16);
        }
    }
}
