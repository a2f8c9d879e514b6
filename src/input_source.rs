//! Memory-mapped input source
//!
//! [`InputSource`] owns one open recording: a read-only private memory
//! map, the detected (or overridden) sample format, and the metadata that
//! came with the file. Sample reads decode straight out of the mapping,
//! with no copy until the decode into the caller's buffer, which keeps
//! random access over multi-gigabyte captures cheap.
//!
//! The source is immutable after open, so it is shared read-only across
//! worker threads (`Arc<InputSource>`) without further synchronization.
//!
//! ## Format selection
//!
//! 1. An explicit override wins.
//! 2. Otherwise the filename extension is looked up in a fixed table
//!    (`.cf32`, `.cs16`, `.cu8`, …); unknown extensions fall back to
//!    `cf32`.
//! 3. A SigMF sidecar, when present, overrides both with its
//!    `core:datatype`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use tracing::debug;

use crate::sample_format::SampleFormat;
use crate::sigmf::SigMfMeta;
use crate::types::{Complex32, EngineError, EngineResult};

/// Sample rate assumed when no metadata supplies one.
pub const DEFAULT_SAMPLE_RATE: f64 = 1_000_000.0;

/// One open, memory-mapped recording.
#[derive(Debug)]
pub struct InputSource {
    mmap: Mmap,
    path: PathBuf,
    format: SampleFormat,
    sample_rate: f64,
    center_frequency: f64,
    file_size: u64,
    total_samples: usize,
    sigmf_meta_json: Option<String>,
    sigmf_meta: Option<SigMfMeta>,
}

impl InputSource {
    /// Open a recording and map it into memory.
    ///
    /// `path` may point at a raw sample file, a `.sigmf-data` file (a
    /// sibling `.sigmf-meta` is picked up when present), or a
    /// `.sigmf-meta` file (the paired `.sigmf-data` is mapped). Trailing
    /// bytes that do not fill a whole sample are ignored.
    pub fn open(
        path: impl AsRef<Path>,
        override_format: Option<SampleFormat>,
    ) -> EngineResult<Arc<Self>> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let mut format = override_format
            .or_else(|| SampleFormat::from_extension(&ext))
            .unwrap_or_default();

        // Locate the data file and any sidecar metadata.
        let (data_path, meta_path) = match ext.as_str() {
            "sigmf-meta" => (path.with_extension("sigmf-data"), Some(path.to_path_buf())),
            "sigmf-data" => {
                let sibling = path.with_extension("sigmf-meta");
                let meta = sibling.exists().then_some(sibling);
                (path.to_path_buf(), meta)
            }
            _ => (path.to_path_buf(), None),
        };

        let mut sample_rate = DEFAULT_SAMPLE_RATE;
        let mut center_frequency = 0.0;
        let mut sigmf_meta_json = None;
        let mut sigmf_meta = None;

        if let Some(meta_path) = meta_path {
            // A missing or malformed sidecar is not fatal; the recording
            // opens with defaults.
            if let Ok(json) = std::fs::read_to_string(&meta_path) {
                if let Some(meta) = SigMfMeta::parse(&json) {
                    if let Some(fmt) = meta.datatype_format() {
                        format = fmt;
                    }
                    if let Some(rate) = meta.sample_rate() {
                        sample_rate = rate;
                    }
                    if let Some(freq) = meta.frequency() {
                        center_frequency = freq;
                    }
                    sigmf_meta = Some(meta);
                }
                sigmf_meta_json = Some(json);
            }
        }

        let file = File::open(&data_path).map_err(|e| EngineError::io(&data_path, &e))?;
        let file_size = file
            .metadata()
            .map_err(|e| EngineError::io(&data_path, &e))?
            .len();
        let mmap =
            unsafe { Mmap::map(&file).map_err(|e| EngineError::io(&data_path, &e))? };

        let total_samples = (file_size as usize) / format.sample_size();
        debug!(
            path = %data_path.display(),
            format = %format,
            total_samples,
            "opened input source"
        );

        Ok(Arc::new(Self {
            mmap,
            path: data_path,
            format,
            sample_rate,
            center_frequency,
            file_size,
            total_samples,
            sigmf_meta_json,
            sigmf_meta,
        }))
    }

    /// Path of the mapped data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Active sample format.
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Sample rate in Hz (1 MHz when no metadata supplied one).
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Center frequency in Hz (0 when unknown).
    pub fn center_frequency(&self) -> f64 {
        self.center_frequency
    }

    /// File size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of whole samples in the file.
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    /// Raw SigMF metadata JSON, when a sidecar was read.
    pub fn sigmf_meta_json(&self) -> Option<&str> {
        self.sigmf_meta_json.as_deref()
    }

    /// Parsed SigMF metadata, when a sidecar was read.
    pub fn sigmf_meta(&self) -> Option<&SigMfMeta> {
        self.sigmf_meta.as_ref()
    }

    /// Annotations from the sidecar (empty without one).
    pub fn annotations(&self) -> &[crate::sigmf::SigMfAnnotation] {
        self.sigmf_meta
            .as_ref()
            .map(|m| m.annotations.as_slice())
            .unwrap_or(&[])
    }

    /// Decode samples `[start, start+length)` into `dest`, clamping the
    /// range to the file. Returns the number of samples written.
    pub fn read_into(&self, start: usize, length: usize, dest: &mut [Complex32]) -> usize {
        if start >= self.total_samples {
            return 0;
        }
        let length = length.min(self.total_samples - start).min(dest.len());
        self.format
            .decode_range(&self.mmap, start, length, &mut dest[..length]);
        length
    }

    /// Decode samples `[start, start+length)`, clamped to the file.
    pub fn read(&self, start: usize, length: usize) -> Vec<Complex32> {
        if start >= self.total_samples {
            return Vec::new();
        }
        let length = length.min(self.total_samples - start);
        let mut out = vec![Complex32::default(); length];
        self.format.decode_range(&self.mmap, start, length, &mut out);
        out
    }

    /// Decode `length` samples at indices `start + i·stride`.
    ///
    /// `stride == 1` is a contiguous read. For larger strides every
    /// stride-th sample is picked with no anti-alias step; the length is
    /// clamped so the last picked index stays inside the file.
    pub fn read_strided(&self, start: usize, length: usize, stride: usize) -> Vec<Complex32> {
        let stride = stride.max(1);
        if stride == 1 {
            return self.read(start, length);
        }
        if start >= self.total_samples {
            return Vec::new();
        }
        let max_len = (self.total_samples - start + stride - 1) / stride;
        let length = length.min(max_len);
        let mut out = vec![Complex32::default(); length];
        for (i, slot) in out.iter_mut().enumerate() {
            let mut one = [Complex32::default()];
            self.format
                .decode_range(&self.mmap, start + i * stride, 1, &mut one);
            *slot = one[0];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_cf32(dir: &TempDir, name: &str, samples: &[Complex32]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(&SampleFormat::Cf32.encode(samples)).unwrap();
        path
    }

    fn ramp(n: usize) -> Vec<Complex32> {
        (0..n)
            .map(|i| Complex32::new(i as f32, -(i as f32)))
            .collect()
    }

    #[test]
    fn test_open_detects_format_from_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capture.cs16");
        let mut f = File::create(&path).unwrap();
        // 1024 cs16 samples = 4096 bytes
        f.write_all(&vec![0u8; 4096]).unwrap();

        let src = InputSource::open(&path, None).unwrap();
        assert_eq!(src.format(), SampleFormat::Cs16);
        assert_eq!(src.total_samples(), 1024);
        assert_eq!(src.file_size(), 4096);
        assert_eq!(src.sample_rate(), DEFAULT_SAMPLE_RATE);
        assert!(src.sigmf_meta_json().is_none());
    }

    #[test]
    fn test_open_unknown_extension_defaults_cf32() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capture.bin");
        File::create(&path)
            .unwrap()
            .write_all(&vec![0u8; 80])
            .unwrap();

        let src = InputSource::open(&path, None).unwrap();
        assert_eq!(src.format(), SampleFormat::Cf32);
        assert_eq!(src.total_samples(), 10);
    }

    #[test]
    fn test_override_beats_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capture.cs16");
        File::create(&path)
            .unwrap()
            .write_all(&vec![0u8; 64])
            .unwrap();

        let src = InputSource::open(&path, Some(SampleFormat::Cu8)).unwrap();
        assert_eq!(src.format(), SampleFormat::Cu8);
        assert_eq!(src.total_samples(), 32);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capture.cf32");
        // 3 whole samples plus 5 stray bytes.
        File::create(&path)
            .unwrap()
            .write_all(&vec![0u8; 3 * 8 + 5])
            .unwrap();

        let src = InputSource::open(&path, None).unwrap();
        assert_eq!(src.total_samples(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = InputSource::open("/nonexistent/capture.cf32", None).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[test]
    fn test_read_roundtrip_and_clamp() {
        let dir = TempDir::new().unwrap();
        let samples = ramp(100);
        let path = write_cf32(&dir, "ramp.cf32", &samples);

        let src = InputSource::open(&path, None).unwrap();
        assert_eq!(src.read(0, 100), samples);
        assert_eq!(src.read(90, 50).len(), 10);
        // One sample left at the end.
        assert_eq!(src.read(99, 10), vec![samples[99]]);
        assert!(src.read(100, 10).is_empty());
        assert!(src.read(1000, 1).is_empty());
    }

    #[test]
    fn test_read_into_reports_count() {
        let dir = TempDir::new().unwrap();
        let samples = ramp(16);
        let path = write_cf32(&dir, "short.cf32", &samples);
        let src = InputSource::open(&path, None).unwrap();

        let mut buf = vec![Complex32::default(); 32];
        assert_eq!(src.read_into(8, 32, &mut buf), 8);
        assert_eq!(buf[0], samples[8]);
        assert_eq!(src.read_into(16, 4, &mut buf), 0);
    }

    #[test]
    fn test_read_strided_picks_every_nth() {
        let dir = TempDir::new().unwrap();
        let samples = ramp(100);
        let path = write_cf32(&dir, "ramp.cf32", &samples);
        let src = InputSource::open(&path, None).unwrap();

        let out = src.read_strided(10, 5, 4);
        assert_eq!(out.len(), 5);
        for (i, s) in out.iter().enumerate() {
            assert_eq!(*s, samples[10 + i * 4]);
        }
    }

    #[test]
    fn test_read_strided_clamps_to_ceiling() {
        let dir = TempDir::new().unwrap();
        let path = write_cf32(&dir, "ramp.cf32", &ramp(100));
        let src = InputSource::open(&path, None).unwrap();

        // From 90 with stride 4: indices 90, 94, 98 fit -> ceil(10/4) = 3.
        let out = src.read_strided(90, 100, 4);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].re, 98.0);
    }

    #[test]
    fn test_sigmf_meta_overrides_format_and_rate() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("rec");
        // Data: 8 cs8 samples = 16 bytes.
        File::create(base.with_extension("sigmf-data"))
            .unwrap()
            .write_all(&vec![0u8; 16])
            .unwrap();
        std::fs::write(
            base.with_extension("sigmf-meta"),
            r#"{
                "global": {"core:datatype": "ci8", "core:sample_rate": 2000000.0},
                "captures": [{"core:sample_start": 0, "core:frequency": 100000000.0}],
                "annotations": []
            }"#,
        )
        .unwrap();

        // Opening the meta file maps the paired data file.
        let src = InputSource::open(base.with_extension("sigmf-meta"), None).unwrap();
        assert_eq!(src.format(), SampleFormat::Cs8);
        assert_eq!(src.sample_rate(), 2e6);
        assert_eq!(src.center_frequency(), 1e8);
        assert_eq!(src.total_samples(), 8);
        assert!(src.sigmf_meta_json().is_some());

        // Opening the data file picks up the sibling metadata.
        let src = InputSource::open(base.with_extension("sigmf-data"), None).unwrap();
        assert_eq!(src.format(), SampleFormat::Cs8);
        assert_eq!(src.sample_rate(), 2e6);
    }

    #[test]
    fn test_malformed_sigmf_meta_opens_with_defaults() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("rec");
        File::create(base.with_extension("sigmf-data"))
            .unwrap()
            .write_all(&vec![0u8; 64])
            .unwrap();
        std::fs::write(base.with_extension("sigmf-meta"), "{ broken").unwrap();

        let src = InputSource::open(base.with_extension("sigmf-data"), None).unwrap();
        assert_eq!(src.format(), SampleFormat::Cf32);
        assert_eq!(src.sample_rate(), DEFAULT_SAMPLE_RATE);
        // The raw (broken) JSON is still surfaced to the caller.
        assert!(src.sigmf_meta_json().is_some());
        assert!(src.sigmf_meta().is_none());
        assert!(src.annotations().is_empty());
    }
}
