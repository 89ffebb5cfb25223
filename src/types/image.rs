//! Extracted image stacks and their labeled, multi-fov assembly

use std::fmt;

use ndarray::{Array1, Array4, Array5, ArrayView2, Axis, s};

use crate::error::{MbtError, Result};

/// Layers of an extracted stack, in stack order
///
/// `IntensityWidth` never survives condensation into a [`FovImage`]; it only names the
/// intensity times width images of the TIFF tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Pulse,
    Intensity,
    IntensityWidth,
}

impl LayerType {
    /// Label used for the `type` coordinate and the output subdirectories
    pub const fn label(&self) -> &'static str {
        match self {
            LayerType::Pulse => "pulse",
            LayerType::Intensity => "intensities",
            LayerType::IntensityWidth => "intensity_times_width",
        }
    }

    /// Layer labels for a condensed stack with `n` leading layers, at most pulse then intensity
    pub fn leading(n: usize) -> Vec<LayerType> {
        [LayerType::Pulse, LayerType::Intensity]
            .into_iter()
            .take(n)
            .collect()
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Condensed stack of a single fov, `[type, row, col, channel]`
#[derive(Debug, Clone, PartialEq)]
pub struct FovImage {
    pub fov: String,
    pub layer_types: Vec<LayerType>,
    pub channels: Vec<String>,
    pub data: Array4<u32>,
}

impl FovImage {
    pub fn new(fov: impl Into<String>, channels: Vec<String>, data: Array4<u32>) -> Self {
        let layer_types = LayerType::leading(data.len_of(Axis(0)));
        Self {
            fov: fov.into(),
            layer_types,
            channels,
            data,
        }
    }
}

/// Labeled image data for several fovs, `[fov, type, row, col, channel]`
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImageSet {
    fovs: Vec<String>,
    layer_types: Vec<LayerType>,
    channels: Vec<String>,
    data: Array5<u32>,
}

impl LabeledImageSet {
    /// Concatenate per-fov stacks along a new leading fov axis, keeping the given order.
    ///
    /// All stacks must share layer types, channels and raster size.
    pub fn concat(images: Vec<FovImage>) -> Result<Self> {
        let first = images
            .first()
            .ok_or_else(|| MbtError::InconsistentImages("no fov images to concatenate".into()))?;

        for image in &images[1..] {
            if image.channels != first.channels {
                return Err(MbtError::InconsistentImages(format!(
                    "fov '{}' has channels {:?}, fov '{}' has {:?}",
                    image.fov, image.channels, first.fov, first.channels
                )));
            }
            if image.layer_types != first.layer_types {
                return Err(MbtError::InconsistentImages(format!(
                    "fov '{}' has layers {:?}, fov '{}' has {:?}",
                    image.fov, image.layer_types, first.fov, first.layer_types
                )));
            }
            if image.data.shape() != first.data.shape() {
                return Err(MbtError::InconsistentImages(format!(
                    "fov '{}' has shape {:?}, fov '{}' has {:?}",
                    image.fov,
                    image.data.shape(),
                    first.fov,
                    first.data.shape()
                )));
            }
        }

        let views: Vec<_> = images.iter().map(|image| image.data.view()).collect();
        let data = ndarray::stack(Axis(0), &views)?;

        let layer_types = first.layer_types.clone();
        let channels = first.channels.clone();
        let fovs = images.into_iter().map(|image| image.fov).collect();

        Ok(Self {
            fovs,
            layer_types,
            channels,
            data,
        })
    }

    pub fn fovs(&self) -> &[String] {
        &self.fovs
    }

    pub fn layer_types(&self) -> &[LayerType] {
        &self.layer_types
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn data(&self) -> &Array5<u32> {
        &self.data
    }

    pub fn into_data(self) -> Array5<u32> {
        self.data
    }

    /// Select one `[row, col]` image by coordinate labels
    pub fn image(&self, fov: &str, layer: LayerType, channel: &str) -> Option<ArrayView2<'_, u32>> {
        let f = self.fovs.iter().position(|name| name == fov)?;
        let t = self.layer_types.iter().position(|&l| l == layer)?;
        let c = self.channels.iter().position(|name| name == channel)?;
        Some(self.data.slice(s![f, t, .., .., c]))
    }
}

/// Pulse statistics for one tof window
#[derive(Debug, Clone, PartialEq)]
pub struct PulseHistograms {
    /// Pulse counts indexed by pulse width
    pub widths: Array1<u64>,
    /// Pulse counts indexed by pulse intensity
    pub intensities: Array1<u64>,
    /// Trigger counts indexed by the number of in-window pulses in the trigger
    pub pulses: Array1<u64>,
}

impl PulseHistograms {
    pub const WIDTH_BINS: usize = u8::MAX as usize + 1;
    pub const INTENSITY_BINS: usize = u16::MAX as usize + 1;
    pub const PULSE_BINS: usize = u16::MAX as usize + 1;

    pub fn zeros() -> Self {
        Self {
            widths: Array1::zeros(Self::WIDTH_BINS),
            intensities: Array1::zeros(Self::INTENSITY_BINS),
            pulses: Array1::zeros(Self::PULSE_BINS),
        }
    }
}
