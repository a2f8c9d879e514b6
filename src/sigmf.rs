//! SigMF sidecar metadata
//!
//! SigMF (Signal Metadata Format) pairs a raw sample file
//! (`.sigmf-data`) with a JSON description (`.sigmf-meta`). This module
//! holds the serde data model for the fields the engine consumes, a
//! lenient parser (malformed or partial metadata never prevents a file
//! from opening), and the writer used by the export path.
//!
//! ## Example
//!
//! ```rust,ignore
//! use iqscope::sigmf::{SigMfMeta, SigMfWriteConfig, write_recording};
//!
//! let meta = SigMfMeta::parse(&json)?;
//! println!("rate: {:?} Hz", meta.sample_rate());
//!
//! write_recording("capture", &SigMfWriteConfig::default(), &samples)?;
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sample_format::SampleFormat;
use crate::types::{Complex32, EngineError, EngineResult};

/// SigMF specification version emitted by the writer.
const SIGMF_VERSION: &str = "1.0.0";

/// SigMF `global` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigMfGlobal {
    /// Sample datatype, e.g. `cf32_le`.
    #[serde(rename = "core:datatype", default, skip_serializing_if = "String::is_empty")]
    pub datatype: String,

    /// Sample rate in Hz.
    #[serde(rename = "core:sample_rate", default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,

    /// SigMF spec version.
    #[serde(rename = "core:version", default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Free-form description.
    #[serde(rename = "core:description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Recording author.
    #[serde(rename = "core:author", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Creation time, RFC 3339.
    #[serde(rename = "core:datetime", default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Fields from other namespaces, preserved verbatim.
    #[serde(flatten)]
    pub extensions: HashMap<String, serde_json::Value>,
}

/// SigMF capture segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigMfCapture {
    /// Sample index where this capture starts.
    #[serde(rename = "core:sample_start", default)]
    pub sample_start: u64,

    /// Center frequency in Hz.
    #[serde(rename = "core:frequency", default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,

    #[serde(flatten)]
    pub extensions: HashMap<String, serde_json::Value>,
}

/// SigMF annotation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigMfAnnotation {
    /// Sample index where the annotation starts.
    #[serde(rename = "core:sample_start", default)]
    pub sample_start: u64,

    /// Number of annotated samples.
    #[serde(rename = "core:sample_count", default)]
    pub sample_count: u64,

    /// Lower frequency edge in Hz.
    #[serde(rename = "core:freq_lower_edge", default, skip_serializing_if = "Option::is_none")]
    pub freq_lower_edge: Option<f64>,

    /// Upper frequency edge in Hz.
    #[serde(rename = "core:freq_upper_edge", default, skip_serializing_if = "Option::is_none")]
    pub freq_upper_edge: Option<f64>,

    /// Short label.
    #[serde(rename = "core:label", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Longer comment.
    #[serde(rename = "core:comment", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(flatten)]
    pub extensions: HashMap<String, serde_json::Value>,
}

impl SigMfAnnotation {
    /// Label text, empty when absent.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    /// Comment text, empty when absent.
    pub fn comment(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }

    /// Frequency edges, zero when absent.
    pub fn freq_edges(&self) -> (f64, f64) {
        (
            self.freq_lower_edge.unwrap_or(0.0),
            self.freq_upper_edge.unwrap_or(0.0),
        )
    }
}

/// Complete SigMF metadata document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigMfMeta {
    #[serde(default)]
    pub global: SigMfGlobal,
    #[serde(default)]
    pub captures: Vec<SigMfCapture>,
    #[serde(default)]
    pub annotations: Vec<SigMfAnnotation>,
}

impl SigMfMeta {
    /// Parse a metadata document.
    ///
    /// Returns `None` on malformed JSON; callers open the recording with
    /// defaults in that case, so a broken sidecar never blocks a file.
    pub fn parse(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!("ignoring malformed SigMF metadata: {e}");
                None
            }
        }
    }

    /// Sample rate from `global`, if present.
    pub fn sample_rate(&self) -> Option<f64> {
        self.global.sample_rate
    }

    /// Center frequency of the first capture, if present.
    pub fn frequency(&self) -> Option<f64> {
        self.captures.first().and_then(|c| c.frequency)
    }

    /// Engine sample format for `global.core:datatype`, if recognized.
    pub fn datatype_format(&self) -> Option<SampleFormat> {
        if self.global.datatype.is_empty() {
            return None;
        }
        SampleFormat::from_sigmf_datatype(&self.global.datatype)
    }
}

/// Parameters for [`write_recording`].
#[derive(Debug, Clone)]
pub struct SigMfWriteConfig {
    /// Datatype recorded in `global`; the data payload is always
    /// interleaved complex f32.
    pub datatype: String,
    /// Sample rate in Hz; omitted from the metadata when zero.
    pub sample_rate: f64,
    /// Center frequency in Hz; omitted when zero.
    pub center_frequency: f64,
    /// Optional description.
    pub description: Option<String>,
    /// Optional author.
    pub author: Option<String>,
    /// Annotation start, relative to the written file.
    pub sample_start: u64,
    /// Annotation length; no annotation is emitted when zero.
    pub sample_count: u64,
}

impl Default for SigMfWriteConfig {
    fn default() -> Self {
        Self {
            datatype: SampleFormat::Cf32.sigmf_datatype().to_string(),
            sample_rate: 0.0,
            center_frequency: 0.0,
            description: None,
            author: None,
            sample_start: 0,
            sample_count: 0,
        }
    }
}

/// Write a paired `.sigmf-data` / `.sigmf-meta` recording.
///
/// `base_path` is the output path without extension; returns the two paths
/// written. The data file is the interleaved complex-f32 sample stream,
/// the meta file a pretty-printed SigMF 1.0.0 document with a single
/// capture at sample 0.
pub fn write_recording(
    base_path: &Path,
    config: &SigMfWriteConfig,
    samples: &[Complex32],
) -> EngineResult<(PathBuf, PathBuf)> {
    let data_path = with_appended_extension(base_path, "sigmf-data");
    let meta_path = with_appended_extension(base_path, "sigmf-meta");

    let data_file =
        File::create(&data_path).map_err(|e| EngineError::io(&data_path, &e))?;
    let mut writer = BufWriter::new(data_file);
    writer
        .write_all(&SampleFormat::Cf32.encode(samples))
        .and_then(|_| writer.flush())
        .map_err(|e| EngineError::io(&data_path, &e))?;

    let mut meta = SigMfMeta {
        global: SigMfGlobal {
            datatype: if config.datatype.is_empty() {
                SampleFormat::Cf32.sigmf_datatype().to_string()
            } else {
                config.datatype.clone()
            },
            version: SIGMF_VERSION.to_string(),
            datetime: Some(chrono::Utc::now().to_rfc3339()),
            description: config.description.clone(),
            author: config.author.clone(),
            sample_rate: (config.sample_rate > 0.0).then_some(config.sample_rate),
            extensions: HashMap::new(),
        },
        captures: vec![SigMfCapture {
            sample_start: 0,
            frequency: (config.center_frequency != 0.0).then_some(config.center_frequency),
            extensions: HashMap::new(),
        }],
        annotations: Vec::new(),
    };
    if config.sample_count > 0 {
        meta.annotations.push(SigMfAnnotation {
            sample_start: config.sample_start,
            sample_count: config.sample_count,
            ..Default::default()
        });
    }

    let meta_file =
        File::create(&meta_path).map_err(|e| EngineError::io(&meta_path, &e))?;
    serde_json::to_writer_pretty(BufWriter::new(meta_file), &meta).map_err(|e| {
        EngineError::Io {
            path: meta_path.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok((data_path, meta_path))
}

/// Append a SigMF extension without clobbering dots in the base name.
fn with_appended_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
