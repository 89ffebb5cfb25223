//! Per-acquisition records: located files, calibration and the resolved extraction plan

use std::path::PathBuf;

use crate::error::{MbtError, Result};
use crate::types::MibiDescriptor;

/// A bin/json pair sharing one base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    pub name: String,
    pub bin_path: PathBuf,
    pub json_path: PathBuf,
}

/// Parabolic mass calibration of one acquisition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub mass_gain: f64,
    pub mass_offset: f64,
}

impl Calibration {
    /// Read `fov.fullTiming.massCalibration.{massGain,massOffset}`
    pub fn from_descriptor(
        descriptor: &MibiDescriptor,
        json_path: &std::path::Path,
    ) -> Result<Self> {
        let missing = |field| MbtError::MissingCalibration {
            json: json_path.to_path_buf(),
            field,
        };
        let calibration = descriptor
            .mass_calibration()
            .ok_or_else(|| missing("fov.fullTiming.massCalibration"))?;

        Ok(Self {
            mass_gain: calibration
                .mass_gain
                .ok_or_else(|| missing("fov.fullTiming.massCalibration.massGain"))?,
            mass_offset: calibration
                .mass_offset
                .ok_or_else(|| missing("fov.fullTiming.massCalibration.massOffset"))?,
        })
    }
}

/// A named target with its integer tof integration window
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelWindow {
    pub target: String,
    pub mass: f64,
    pub lower_tof: u16,
    pub upper_tof: u16,
}

/// A channel window together with its intensity extraction flag
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub target: String,
    pub mass: f64,
    pub lower_tof: u16,
    pub upper_tof: u16,
    pub calc_intensity: bool,
}

/// Everything needed to extract one acquisition. Channel order is the layer order of the
/// extracted stack.
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    pub acquisition: Acquisition,
    pub calibration: Calibration,
    pub channels: Vec<ChannelSpec>,
}

impl ExtractionPlan {
    pub fn new(
        acquisition: Acquisition,
        calibration: Calibration,
        windows: Vec<ChannelWindow>,
        flags: &[bool],
    ) -> Self {
        let channels = windows
            .into_iter()
            .zip(flags.iter().copied())
            .map(|(window, calc_intensity)| ChannelSpec {
                target: window.target,
                mass: window.mass,
                lower_tof: window.lower_tof,
                upper_tof: window.upper_tof,
                calc_intensity,
            })
            .collect();

        Self {
            acquisition,
            calibration,
            channels,
        }
    }

    pub fn name(&self) -> &str {
        &self.acquisition.name
    }

    pub fn targets(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.target.clone()).collect()
    }

    pub fn lower_tofs(&self) -> Vec<u16> {
        self.channels.iter().map(|c| c.lower_tof).collect()
    }

    pub fn upper_tofs(&self) -> Vec<u16> {
        self.channels.iter().map(|c| c.upper_tof).collect()
    }

    pub fn intensity_flags(&self) -> Vec<bool> {
        self.channels.iter().map(|c| c.calc_intensity).collect()
    }

    pub fn any_intensity(&self) -> bool {
        self.channels.iter().any(|c| c.calc_intensity)
    }
}
