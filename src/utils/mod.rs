//! Acquisition discovery, panel resolution and layout helpers

pub mod channel_manager;
pub mod file_utils;
pub mod misc;

// Re-export commonly used utility functions for convenience
pub use channel_manager::{make_panel, read_panel_csv, resolve_panel};
pub use file_utils::find_bin_files;
pub use misc::data_start_offset;
