use std::path::PathBuf;

/// Errors raised while locating, planning, decoding or writing acquisitions
#[derive(Debug, thiserror::Error)]
pub enum MbtError {
    /// No bin/json pair survived discovery and `include` filtering
    #[error("No viable bin files were found in {}", .dir.display())]
    NotFound { dir: PathBuf },

    /// Global panel requested on a descriptor without `fov.panel.conjugates`
    #[error(
        "'panel' field not found in {}. If this is a moly point, you must manually supply a panel",
        .json.display()
    )]
    MissingPanel { json: PathBuf },

    /// Explicit panel table lacks required columns
    #[error("panel is missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("mass calibration field '{field}' not found in {}", .json.display())]
    MissingCalibration { json: PathBuf, field: &'static str },

    /// Channel filtering left nothing to extract
    #[error("no channels left to extract for fov '{fov}'")]
    EmptyPanel { fov: String },

    #[error("target '{target}' appears more than once in the panel for fov '{fov}'")]
    DuplicateTarget { fov: String, target: String },

    #[error("channel '{channel}' not found in the panel for fov '{fov}'")]
    ChannelNotFound { fov: String, channel: String },

    #[error("cannot convert negative mass {0} to time of flight")]
    NegativeMass(f64),

    #[error("integration window {index} resolves to lower tof {lower} above upper tof {upper}")]
    InvalidWindow { index: usize, lower: u16, upper: u16 },

    #[error("time resolution must be finite and positive, got {0}")]
    InvalidTimeResolution(f64),

    #[error("integration window {index} maps to tof {tof} outside 0..=65535")]
    TofOutOfRange { index: usize, tof: f64 },

    #[error("invalid extraction arguments: {0}")]
    InvalidArgument(String),

    #[error("corrupt bin file {}: {reason}", .path.display())]
    CorruptBin { path: PathBuf, reason: String },

    #[error("unable to parse descriptor {}: {reason}", .path.display())]
    Descriptor { path: PathBuf, reason: String },

    /// Median of a histogram with no counts is undefined
    #[error("histogram is empty; median pulse height is undefined")]
    EmptyHistogram,

    #[error("image stacks cannot be concatenated: {0}")]
    InconsistentImages(String),

    /// Failure while processing a single field of view
    #[error("fov '{fov}' failed: {source}")]
    Acquisition {
        fov: String,
        #[source]
        source: Box<MbtError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl MbtError {
    /// Tag an error with the field of view it came from
    pub fn for_fov(self, fov: &str) -> Self {
        match self {
            already @ MbtError::Acquisition { .. } => already,
            other => MbtError::Acquisition {
                fov: fov.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, unwrapping any per-fov wrapper
    pub fn root(&self) -> &MbtError {
        match self {
            MbtError::Acquisition { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, MbtError>;
