use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use schemars::JsonSchema;
use seam::{Pipeline, PipelineConfig, ProbabilityMask, SeamError, Segment};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    Seam(#[from] SeamError),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("No mask sets found in {0}")]
    NoMasks(PathBuf),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// How the seam is drawn onto the source image
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AnnotationStyle {
    pub color: [u8; 3],
    /// Line width in pixels
    pub thickness: u32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: [0, 255, 0],
            thickness: 3,
        }
    }
}

/// Host configuration file: pipeline parameters plus output styling
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SeamConfig {
    pub pipeline: PipelineConfig,
    pub annotation: AnnotationStyle,
}

impl SeamConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, HostError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, HostError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, HostError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, HostError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, HostError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(HostError::UnsupportedFileFormat),
        }
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> Result<String, HostError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert configuration to JSON string
    pub fn to_json(&self) -> Result<String, HostError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SeamConfig)
    }
}

/// Interpret an 8-bit mask image as probabilities (`value / 255`)
pub fn probability_mask_from_luma(image: &GrayImage) -> ProbabilityMask {
    ProbabilityMask::from_fn(image.width(), image.height(), |x, y| {
        Luma([f32::from(image.get_pixel(x, y)[0]) / 255.0])
    })
}

pub fn load_probability_mask<P: AsRef<Path>>(path: P) -> Result<ProbabilityMask, HostError> {
    let image = image::open(path)?.to_luma8();
    Ok(probability_mask_from_luma(&image))
}

/// PNG files directly inside `dir`, sorted by file name
pub fn mask_files_in_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, HostError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if path.is_file() && is_png {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// One invocation's worth of candidate masks
pub struct MaskSet {
    pub name: String,
    pub masks: Vec<ProbabilityMask>,
}

impl MaskSet {
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, HostError> {
        let dir = dir.as_ref();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        let masks = mask_files_in_dir(dir)?
            .iter()
            .map(load_probability_mask)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, masks })
    }
}

/// Every sub-directory of `root` is one mask set, ordered by name
pub fn discover_mask_sets<P: AsRef<Path>>(root: P) -> Result<Vec<MaskSet>, HostError> {
    let root = root.as_ref();
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    if dirs.is_empty() {
        return Err(HostError::NoMasks(root.to_path_buf()));
    }
    dirs.sort();
    dirs.iter().map(MaskSet::load_dir).collect()
}

/// Coordinates in the block output format; an empty string when there is no line
pub fn coordinates_json(segment: Option<&Segment>) -> Result<String, HostError> {
    match segment {
        Some(segment) => Ok(serde_json::to_string(segment)?),
        None => Ok(String::new()),
    }
}

/// Draw `segment` onto `image` as a line `style.thickness` pixels wide
pub fn annotate(image: &mut RgbImage, segment: &Segment, style: &AnnotationStyle) {
    let color = Rgb(style.color);
    let thickness = style.thickness.max(1);

    if segment.is_degenerate() {
        let radius = (thickness / 2) as i32;
        draw_filled_circle_mut(image, (segment.x1, segment.y1), radius, color);
        return;
    }

    let (sx, sy) = (segment.x1 as f32, segment.y1 as f32);
    let (ex, ey) = (segment.x2 as f32, segment.y2 as f32);
    let length = segment.length() as f32;
    let normal = (-(ey - sy) / length, (ex - sx) / length);

    let center = (thickness - 1) as f32 / 2.0;
    for k in 0..thickness {
        let offset = k as f32 - center;
        let (ox, oy) = (normal.0 * offset, normal.1 * offset);
        draw_line_segment_mut(image, (sx + ox, sy + oy), (ex + ox, ey + oy), color);
    }
}

/// Outcome of one mask set in a batch run
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BatchEntry {
    pub name: String,
    pub segment: Option<Segment>,
    pub error: Option<String>,
}

fn evaluate(pipeline: &Pipeline, set: MaskSet) -> BatchEntry {
    match pipeline.detect(&set.masks) {
        Ok(segment) => BatchEntry {
            name: set.name,
            segment,
            error: None,
        },
        Err(err) => {
            warn!(name = %set.name, %err, "mask set rejected");
            BatchEntry {
                name: set.name,
                segment: None,
                error: Some(err.to_string()),
            }
        }
    }
}

impl BatchEntry {
    fn failed(name: String, error: String) -> Self {
        Self {
            name,
            segment: None,
            error: Some(error),
        }
    }
}

/// Run every mask set on the blocking pool; there is one entry per set, in input order
pub async fn run_batch(pipeline: Arc<Pipeline>, sets: Vec<MaskSet>) -> Vec<BatchEntry> {
    let names: Vec<String> = sets.iter().map(|set| set.name.clone()).collect();
    let mut slots: Vec<Option<BatchEntry>> = vec![None; names.len()];

    let mut tasks = JoinSet::new();
    for (order, set) in sets.into_iter().enumerate() {
        let pipeline = Arc::clone(&pipeline);
        tasks.spawn_blocking(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| evaluate(&pipeline, set)));
            (order, outcome.map_err(|payload| panic_message(payload.as_ref())))
        });
    }

    let mut join_failure = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((order, Ok(entry))) => slots[order] = Some(entry),
            Ok((order, Err(message))) => {
                error!(name = %names[order], %message, "pipeline panicked");
                slots[order] = Some(BatchEntry::failed(
                    names[order].clone(),
                    format!("pipeline panicked: {message}"),
                ));
            }
            Err(err) => {
                error!(%err, "batch task failed");
                join_failure = Some(err.to_string());
            }
        }
    }

    slots
        .into_iter()
        .zip(names)
        .map(|(slot, name)| {
            slot.unwrap_or_else(|| {
                let reason = join_failure.as_deref().unwrap_or("task did not complete");
                BatchEntry::failed(name, format!("batch task failed: {reason}"))
            })
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
