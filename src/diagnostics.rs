//! Per-channel pulse statistics and whole-file counts for quality control

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use ndarray::Array1;
use rayon::prelude::*;

use crate::error::{MbtError, Result};
use crate::extraction::{ExtractOptions, build_pool, plan_acquisition};
use crate::processing::{BinExtractor, PulseExtractor};
use crate::types::{ExtractionPlan, PanelSpec, PulseHistograms};
use crate::utils::file_utils::find_bin_files;

/// Plan a single fov restricted to one channel
fn channel_plan(
    data_dir: &Path,
    fov: &str,
    channel: &str,
    panel: &PanelSpec,
    time_res: f64,
) -> Result<ExtractionPlan> {
    let include = [fov.to_string()];
    let mut fov_files = find_bin_files(data_dir, Some(&include[..]))?;
    let acquisition = fov_files.remove(fov).ok_or_else(|| MbtError::NotFound {
        dir: data_dir.to_path_buf(),
    })?;

    let opts = ExtractOptions::builder()
        .panel(panel.clone())
        .channels(vec![channel.to_string()])
        .time_res(time_res)
        .build();

    plan_acquisition(acquisition, &opts).map_err(|e| match e {
        MbtError::EmptyPanel { fov } => MbtError::ChannelNotFound {
            fov,
            channel: channel.to_string(),
        },
        other => other,
    })
}

/// Width, intensity and pulse histograms of one channel of one fov
pub fn histogram_for_channel<E: PulseExtractor>(
    extractor: &E,
    data_dir: &Path,
    fov: &str,
    channel: &str,
    panel: &PanelSpec,
    time_res: f64,
) -> Result<PulseHistograms> {
    let plan = channel_plan(data_dir, fov, channel, panel, time_res)?;
    let spec = &plan.channels[0];
    debug!(
        "Histograms for {}/{} over tof [{}, {}]",
        fov, channel, spec.lower_tof, spec.upper_tof
    );

    extractor.extract_histograms(&plan.acquisition.bin_path, spec.lower_tof, spec.upper_tof)
}

/// [`histogram_for_channel`] with the memory-mapped decoder
pub fn get_histograms_per_tof(
    data_dir: &Path,
    fov: &str,
    channel: &str,
    panel: &PanelSpec,
    time_res: f64,
) -> Result<PulseHistograms> {
    histogram_for_channel(&BinExtractor, data_dir, fov, channel, panel, time_res)
}

/// Bin index where the normalized cumulative intensity histogram is closest to one half.
///
/// Ties resolve to the lowest bin.
pub fn median_pulse_height(intensities: &Array1<u64>) -> Result<usize> {
    let total = intensities.sum();
    if total == 0 {
        return Err(MbtError::EmptyHistogram);
    }

    let mut cumulative = 0u64;
    let mut best = (0usize, f64::INFINITY);
    for (bin, &count) in intensities.iter().enumerate() {
        cumulative += count;
        let distance = (cumulative as f64 / total as f64 - 0.5).abs();
        if distance < best.1 {
            best = (bin, distance);
        }
    }
    Ok(best.0)
}

/// Mean number of in-window pulses per trigger
pub fn mean_pulses_per_trigger(pulses: &Array1<u64>) -> Result<f64> {
    let triggers = pulses.sum();
    if triggers == 0 {
        return Err(MbtError::EmptyHistogram);
    }
    let weighted: f64 = pulses
        .iter()
        .enumerate()
        .map(|(n, &count)| n as f64 * count as f64)
        .sum();
    Ok(weighted / triggers as f64)
}

pub fn get_median_pulse_height(
    data_dir: &Path,
    fov: &str,
    channel: &str,
    panel: &PanelSpec,
    time_res: f64,
) -> Result<usize> {
    let histograms = get_histograms_per_tof(data_dir, fov, channel, panel, time_res)?;
    median_pulse_height(&histograms.intensities)
}

/// Median pulse height and mean pulses per trigger of one channel
pub fn median_height_vs_mean_pp(
    data_dir: &Path,
    fov: &str,
    channel: &str,
    panel: &PanelSpec,
    time_res: f64,
) -> Result<(usize, f64)> {
    let histograms = get_histograms_per_tof(data_dir, fov, channel, panel, time_res)?;
    Ok((
        median_pulse_height(&histograms.intensities)?,
        mean_pulses_per_trigger(&histograms.pulses)?,
    ))
}

/// Total pulse count of every located fov, keyed by name
pub fn total_counts_with<E: PulseExtractor>(
    extractor: &E,
    data_dir: &Path,
    include_fovs: Option<&[String]>,
    threads: Option<usize>,
) -> Result<BTreeMap<String, u64>> {
    let fov_files = find_bin_files(data_dir, include_fovs)?;
    let pool = build_pool(threads)?;

    pool.install(|| {
        fov_files
            .par_iter()
            .map(|(name, acquisition)| {
                extractor
                    .total_counts(&acquisition.bin_path)
                    .map(|count| (name.clone(), count))
                    .map_err(|e| e.for_fov(name))
            })
            .collect()
    })
}

pub fn total_counts(
    data_dir: &Path,
    include_fovs: Option<&[String]>,
) -> Result<BTreeMap<String, u64>> {
    total_counts_with(&BinExtractor, data_dir, include_fovs, None)
}
