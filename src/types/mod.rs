//! Type definitions for bin files, descriptors and extraction plans

pub mod acquisition;
pub mod descriptor;
pub mod header;
pub mod image;
pub mod offset_table;
pub mod panel;
pub mod pixel_data;

// Re-export the main types for convenience
pub use acquisition::{Acquisition, Calibration, ChannelSpec, ChannelWindow, ExtractionPlan};
pub use descriptor::{Channel, MibiDescriptor};
pub use header::Header;
pub use image::{FovImage, LabeledImageSet, LayerType, PulseHistograms};
pub use offset_table::OffsetLookupTable;
pub use panel::{IntensityPolicy, PanelSpec, resolve_intensity_policy};
pub use pixel_data::{PulseEvent, TriggerEvent};
