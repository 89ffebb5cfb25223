//! Multi-fov extraction: plan every acquisition, extract in parallel, then write or assemble

use std::path::Path;

use bon::Builder;
use log::{debug, info};
use ndarray::{Array4, Axis};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::error::{MbtError, Result};
use crate::parser::read_descriptor;
use crate::processing::{BinExtractor, DEFAULT_TIME_RES, PulseExtractor, condense_img_data};
use crate::types::{
    Acquisition, Calibration, ExtractionPlan, FovImage, IntensityPolicy, LabeledImageSet,
    PanelSpec,
};
use crate::utils::channel_manager::resolve_panel;
use crate::utils::file_utils::find_bin_files;
use crate::writer::write_out;

/// Options shared by every acquisition of an extraction run
#[derive(Debug, Clone, Builder)]
pub struct ExtractOptions {
    /// Global window around the descriptor panel, or an explicit table
    #[builder(default)]
    pub panel: PanelSpec,
    #[builder(default)]
    pub intensities: IntensityPolicy,
    /// Flagged channels take their intensity image in place of their pulse count image
    #[builder(default = true)]
    pub replace: bool,
    /// Time resolution of the tof axis, in seconds
    #[builder(default = DEFAULT_TIME_RES)]
    pub time_res: f64,
    /// Fov names to extract; all discovered fovs when unset
    pub include: Option<Vec<String>>,
    /// Targets to keep from each resolved panel; all when unset
    pub channels: Option<Vec<String>>,
    /// Also write `intensity_times_width/` images (only without `replace`)
    #[builder(default)]
    pub intensity_width: bool,
    /// Worker threads; rayon's default when unset
    pub threads: Option<usize>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Build the bounded worker pool for one run
pub(crate) fn build_pool(threads: Option<usize>) -> Result<ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(threads.unwrap_or(0))
        .build()?)
}

/// Resolve calibration, tof windows and intensity flags of a single acquisition
pub fn plan_acquisition(acquisition: Acquisition, opts: &ExtractOptions) -> Result<ExtractionPlan> {
    let descriptor = read_descriptor(&acquisition.json_path)?;
    let calibration = Calibration::from_descriptor(&descriptor, &acquisition.json_path)?;

    let windows = resolve_panel(
        &acquisition.name,
        &descriptor,
        &acquisition.json_path,
        &calibration,
        &opts.panel,
        opts.channels.as_deref(),
        opts.time_res,
    )?;
    let targets: Vec<&str> = windows.iter().map(|w| w.target.as_str()).collect();
    let flags = opts.intensities.flags(&targets);

    debug!(
        "Planned {}: {} channels, {} with intensities",
        acquisition.name,
        windows.len(),
        flags.iter().filter(|&&f| f).count()
    );

    Ok(ExtractionPlan::new(acquisition, calibration, windows, &flags))
}

/// Locate the acquisitions in `data_dir` and plan each of them, in name order.
///
/// Planning finishes for every fov before any extraction starts.
pub fn plan_extraction(data_dir: &Path, opts: &ExtractOptions) -> Result<Vec<ExtractionPlan>> {
    let fov_files = find_bin_files(data_dir, opts.include.as_deref())?;
    info!("Found {} acquisitions in {}", fov_files.len(), data_dir.display());

    fov_files
        .into_values()
        .map(|acquisition| {
            let name = acquisition.name.clone();
            plan_acquisition(acquisition, opts).map_err(|e| e.for_fov(&name))
        })
        .collect()
}

/// Extract the bin files of `data_dir` with the default memory-mapped decoder.
///
/// With `out_dir`, images are written as a TIFF tree and `None` is returned. Otherwise all
/// fovs are returned as one labeled image set.
pub fn extract_bin_files(
    data_dir: &Path,
    out_dir: Option<&Path>,
    opts: &ExtractOptions,
) -> Result<Option<LabeledImageSet>> {
    extract_bin_files_with(&BinExtractor, data_dir, out_dir, opts)
}

/// Same as [`extract_bin_files`] with a caller supplied decoder
pub fn extract_bin_files_with<E: PulseExtractor>(
    extractor: &E,
    data_dir: &Path,
    out_dir: Option<&Path>,
    opts: &ExtractOptions,
) -> Result<Option<LabeledImageSet>> {
    let plans = plan_extraction(data_dir, opts)?;
    let pool = build_pool(opts.threads)?;

    info!(
        "Extracting {} fovs on {} threads",
        plans.len(),
        pool.current_num_threads()
    );

    let images = pool.install(|| {
        plans
            .par_iter()
            .map(|plan| {
                extract_fov(extractor, plan, out_dir, opts).map_err(|e| e.for_fov(plan.name()))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    match out_dir {
        Some(out_dir) => {
            info!("Wrote {} fovs to {}", plans.len(), out_dir.display());
            Ok(None)
        }
        None => LabeledImageSet::concat(images.into_iter().flatten().collect()).map(Some),
    }
}

/// Extract, condense and either write or return one fov
fn extract_fov<E: PulseExtractor>(
    extractor: &E,
    plan: &ExtractionPlan,
    out_dir: Option<&Path>,
    opts: &ExtractOptions,
) -> Result<Option<FovImage>> {
    let flags = plan.intensity_flags();
    let targets = plan.targets();

    let img_data = extractor.extract_image(
        &plan.acquisition.bin_path,
        &plan.lower_tofs(),
        &plan.upper_tofs(),
        &flags,
    )?;
    check_stack(&img_data, targets.len())?;

    let int_width = (opts.intensity_width
        && !opts.replace
        && plan.any_intensity()
        && img_data.len_of(Axis(0)) > 2)
        .then(|| img_data.index_axis(Axis(0), 2).to_owned());

    let condensed = condense_img_data(img_data, &flags, opts.replace);
    debug!("{}: condensed stack {:?}", plan.name(), condensed.shape());

    match out_dir {
        Some(out_dir) => {
            write_out(&condensed, int_width.as_ref(), out_dir, plan.name(), &targets, &flags)?;
            Ok(None)
        }
        None => Ok(Some(FovImage::new(plan.name(), targets, condensed))),
    }
}

fn check_stack(img_data: &Array4<u32>, channels: usize) -> Result<()> {
    if img_data.len_of(Axis(0)) == 0 || img_data.len_of(Axis(3)) != channels {
        return Err(MbtError::InconsistentImages(format!(
            "extractor returned shape {:?} for {} channels",
            img_data.shape(),
            channels
        )));
    }
    Ok(())
}
