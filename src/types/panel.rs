//! How the caller describes which channels to extract and which of them get intensities

use polars::prelude::DataFrame;

/// Default integration window around every panel mass, `[mass - 0.3, mass]`
pub const DEFAULT_GLOBAL_WINDOW: (f64, f64) = (-0.3, 0.0);

/// Source of the mass panel for an acquisition
#[derive(Debug, Clone)]
pub enum PanelSpec {
    /// Integrate `[mass + low, mass + high]` around every conjugate in the acquisition's own
    /// descriptor
    Global { low: f64, high: f64 },
    /// Explicit table with `Mass`, `Target`, `Start` and `Stop` columns
    Explicit(DataFrame),
}

impl PanelSpec {
    pub fn global(low: f64, high: f64) -> Self {
        PanelSpec::Global { low, high }
    }
}

impl Default for PanelSpec {
    fn default() -> Self {
        let (low, high) = DEFAULT_GLOBAL_WINDOW;
        PanelSpec::Global { low, high }
    }
}

impl From<DataFrame> for PanelSpec {
    fn from(df: DataFrame) -> Self {
        PanelSpec::Explicit(df)
    }
}

/// Which channels get intensity and intensity * width images
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IntensityPolicy {
    #[default]
    Off,
    All,
    Subset(Vec<String>),
}

impl IntensityPolicy {
    /// Positional flags aligned with `targets`.
    ///
    /// Subset names that are not among `targets` never match.
    pub fn flags<S: AsRef<str>>(&self, targets: &[S]) -> Vec<bool> {
        match self {
            IntensityPolicy::Off => vec![false; targets.len()],
            IntensityPolicy::All => vec![true; targets.len()],
            IntensityPolicy::Subset(names) => targets
                .iter()
                .map(|target| names.iter().any(|name| name == target.as_ref()))
                .collect(),
        }
    }
}

/// Resolve an intensity policy against an ordered channel list
pub fn resolve_intensity_policy<S: AsRef<str>>(
    channel_names: &[S],
    policy: &IntensityPolicy,
) -> Vec<bool> {
    policy.flags(channel_names)
}
