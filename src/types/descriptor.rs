//! Serde model of the json sidecar written next to every bin file.
//!
//! Only the parts the pipeline reads are typed; everything else lands in `extra`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

type Extra = HashMap<String, serde_json::Value>;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MibiDescriptor {
    pub fov_name: Option<String>,
    pub id: Option<String>,
    pub run_name: Option<String>,
    pub fov: Option<FovInfo>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FovInfo {
    pub name: Option<String>,
    pub run_order: Option<i32>,
    pub full_timing: Option<TimingInfo>,
    pub panel: Option<Panel>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingInfo {
    pub mass_calibration: Option<MassCalibration>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Parabolic calibration `tof = gain * sqrt(mass) + offset`, in tof bins after scaling
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MassCalibration {
    pub mass_gain: Option<f64>,
    pub mass_offset: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One conjugate (target and its mass) of the acquisition panel
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Channel {
    pub mass: Option<f64>,
    pub target: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Panel {
    pub name: Option<String>,
    pub conjugates: Option<Vec<Channel>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl MibiDescriptor {
    pub fn mass_calibration(&self) -> Option<&MassCalibration> {
        self.fov.as_ref()?.full_timing.as_ref()?.mass_calibration.as_ref()
    }

    /// Conjugates of the assigned panel; `None` for acquisitions without one (moly points)
    pub fn conjugates(&self) -> Option<&[Channel]> {
        self.fov.as_ref()?.panel.as_ref()?.conjugates.as_deref()
    }

    /// Human readable fov label, e.g. `R1C1`
    pub fn fov_label(&self) -> Option<&str> {
        self.fov
            .as_ref()
            .and_then(|fov| fov.name.as_deref())
            .or(self.fov_name.as_deref())
    }
}
