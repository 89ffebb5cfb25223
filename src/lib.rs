pub mod diagnostics;
pub mod error;
pub mod extraction;
pub mod mibi_file;
pub mod parser;
pub mod processing;
pub mod types;
pub mod utils;
pub mod writer;

#[cfg(test)]
mod test_support;

pub use diagnostics::{
    get_histograms_per_tof, get_median_pulse_height, histogram_for_channel,
    median_height_vs_mean_pp, median_pulse_height, total_counts,
};
pub use error::{MbtError, Result};
pub use extraction::{ExtractOptions, extract_bin_files, extract_bin_files_with};
pub use mibi_file::MibiFile;
pub use processing::{BinExtractor, PulseExtractor, compute_tof_bounds, mass2tof};
pub use types::{
    FovImage, IntensityPolicy, LabeledImageSet, LayerType, MibiDescriptor, PanelSpec,
    PulseHistograms, header::Header, offset_table::OffsetLookupTable,
};
pub use utils::channel_manager::{make_panel, read_panel_csv};
