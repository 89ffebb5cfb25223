//! Mass calibration, pulse decoding and stack condensation

pub mod calibration;
pub mod condense;
pub mod extract;

use std::path::Path;

use ndarray::Array4;

use crate::error::Result;
use crate::mibi_file::MibiFile;
use crate::types::PulseHistograms;

pub use calibration::{DEFAULT_TIME_RES, compute_tof_bounds, mass2tof};
pub use condense::condense_img_data;

/// Decoder turning a bin file into images and pulse statistics.
///
/// Implementations are shared across worker threads and called concurrently on different
/// files.
pub trait PulseExtractor: Sync {
    /// `[type, row, col, channel]` stack; one layer when no flag is set, three otherwise
    fn extract_image(
        &self,
        bin_path: &Path,
        lower_tof: &[u16],
        upper_tof: &[u16],
        calc_intensity: &[bool],
    ) -> Result<Array4<u32>>;

    fn extract_histograms(
        &self,
        bin_path: &Path,
        lower_tof: u16,
        upper_tof: u16,
    ) -> Result<PulseHistograms>;

    fn total_counts(&self, bin_path: &Path) -> Result<u64>;
}

/// Memory-mapped decoder for MIBIscope bin files
#[derive(Debug, Default, Clone, Copy)]
pub struct BinExtractor;

impl PulseExtractor for BinExtractor {
    fn extract_image(
        &self,
        bin_path: &Path,
        lower_tof: &[u16],
        upper_tof: &[u16],
        calc_intensity: &[bool],
    ) -> Result<Array4<u32>> {
        MibiFile::open(bin_path)?.extract_image(lower_tof, upper_tof, calc_intensity)
    }

    fn extract_histograms(
        &self,
        bin_path: &Path,
        lower_tof: u16,
        upper_tof: u16,
    ) -> Result<PulseHistograms> {
        MibiFile::open(bin_path)?.extract_histograms(lower_tof, upper_tof)
    }

    fn total_counts(&self, bin_path: &Path) -> Result<u64> {
        MibiFile::open(bin_path)?.total_counts()
    }
}
