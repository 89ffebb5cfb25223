//! Panel resolution: turn a descriptor panel or an explicit table into tof integration windows

use std::collections::HashSet;
use std::path::Path;

use log::warn;
use ndarray::Array1;
use polars::prelude::*;

use crate::error::{MbtError, Result};
use crate::processing::compute_tof_bounds;
use crate::types::{Calibration, ChannelWindow, MibiDescriptor, PanelSpec};

pub const MASS_COL: &str = "Mass";
pub const TARGET_COL: &str = "Target";
pub const START_COL: &str = "Start";
pub const STOP_COL: &str = "Stop";

/// Columns an explicit panel table must provide
pub const PANEL_COLUMNS: [&str; 4] = [MASS_COL, TARGET_COL, START_COL, STOP_COL];

/// One row of a panel table
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub target: String,
    pub mass: f64,
    pub start: f64,
    pub stop: f64,
}

/// Creates a single mass panel; `Start = mass - low_range`, `Stop = mass + high_range`
pub fn make_panel(
    mass: f64,
    target_name: Option<&str>,
    low_range: f64,
    high_range: f64,
) -> Result<DataFrame> {
    Ok(df!(
        MASS_COL => [mass],
        TARGET_COL => [target_name.unwrap_or("Target")],
        START_COL => [mass - low_range],
        STOP_COL => [mass + high_range],
    )?)
}

/// Reads an explicit panel table from a CSV file with a header row
pub fn read_panel_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Build a panel table from the conjugates of a descriptor, windowed by `[low, high]`
/// around each mass.
///
/// Only conjugates whose target is in `channels` are kept. A conjugate without a mass or target
/// is an error when it would be kept and is skipped otherwise.
///
/// Fails with [`MbtError::MissingPanel`] when the descriptor has no panel (moly points).
pub fn descriptor_panel(
    descriptor: &MibiDescriptor,
    json_path: &Path,
    low: f64,
    high: f64,
    channels: Option<&[String]>,
) -> Result<DataFrame> {
    let conjugates = descriptor.conjugates().ok_or_else(|| MbtError::MissingPanel {
        json: json_path.to_path_buf(),
    })?;

    let mut masses = Vec::with_capacity(conjugates.len());
    let mut targets = Vec::with_capacity(conjugates.len());
    for (idx, conjugate) in conjugates.iter().enumerate() {
        let kept = match (&conjugate.target, channels) {
            (_, None) => true,
            (Some(target), Some(keep)) => keep.contains(target),
            (None, Some(_)) => false,
        };
        let (Some(mass), Some(target)) = (conjugate.mass, conjugate.target.as_ref()) else {
            if !kept {
                warn!(
                    "Skipping incomplete panel conjugate {idx} in {}",
                    json_path.display()
                );
                continue;
            }
            return Err(MbtError::Descriptor {
                path: json_path.to_path_buf(),
                reason: format!("panel conjugate {idx} lacks a mass or target"),
            });
        };
        if !kept {
            continue;
        }
        masses.push(mass);
        targets.push(target.clone());
    }
    let starts: Vec<f64> = masses.iter().map(|m| m + low).collect();
    let stops: Vec<f64> = masses.iter().map(|m| m + high).collect();

    Ok(DataFrame::new(vec![
        Series::new(MASS_COL.into(), &masses).into(),
        Series::new(TARGET_COL.into(), &targets).into(),
        Series::new(START_COL.into(), &starts).into(),
        Series::new(STOP_COL.into(), &stops).into(),
    ])?)
}

/// Checks that all required panel columns are present
pub fn validate_panel_schema(df: &DataFrame) -> Result<()> {
    let names = df.get_column_names();
    let missing: Vec<String> = PANEL_COLUMNS
        .iter()
        .filter(|col| !names.iter().any(|name| name.as_str() == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MbtError::Schema { missing })
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    column
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                MbtError::InvalidArgument(format!("panel column '{name}' is null in row {row}"))
            })
        })
        .collect()
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    column
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(str::to_string).ok_or_else(|| {
                MbtError::InvalidArgument(format!("panel column '{name}' is null in row {row}"))
            })
        })
        .collect()
}

/// Extract the rows of a panel table, optionally keeping only targets named in `channels`.
///
/// Row order is preserved.
pub fn panel_rows(df: &DataFrame, channels: Option<&[String]>) -> Result<Vec<PanelRow>> {
    validate_panel_schema(df)?;

    let masses = float_column(df, MASS_COL)?;
    let targets = string_column(df, TARGET_COL)?;
    let starts = float_column(df, START_COL)?;
    let stops = float_column(df, STOP_COL)?;

    let rows = targets
        .into_iter()
        .zip(masses)
        .zip(starts.into_iter().zip(stops))
        .map(|((target, mass), (start, stop))| PanelRow {
            target,
            mass,
            start,
            stop,
        })
        .filter(|row| channels.is_none_or(|keep| keep.contains(&row.target)))
        .collect();

    Ok(rows)
}

/// Resolve the channels of one acquisition into tof windows using its own calibration.
///
/// Channels come from the descriptor panel (`PanelSpec::Global`) or from the explicit table,
/// filtered by `channels`. The result must be non-empty with unique targets.
pub fn resolve_panel(
    fov: &str,
    descriptor: &MibiDescriptor,
    json_path: &Path,
    calibration: &Calibration,
    panel: &PanelSpec,
    channels: Option<&[String]>,
    time_res: f64,
) -> Result<Vec<ChannelWindow>> {
    let rows = match panel {
        PanelSpec::Global { low, high } => {
            let df = descriptor_panel(descriptor, json_path, *low, *high, channels)?;
            panel_rows(&df, channels)?
        }
        PanelSpec::Explicit(df) => panel_rows(df, channels)?,
    };

    if rows.is_empty() {
        return Err(MbtError::EmptyPanel {
            fov: fov.to_string(),
        });
    }

    let mut seen = HashSet::with_capacity(rows.len());
    if let Some(duplicate) = rows.iter().find(|row| !seen.insert(row.target.as_str())) {
        return Err(MbtError::DuplicateTarget {
            fov: fov.to_string(),
            target: duplicate.target.clone(),
        });
    }

    let stops: Array1<f64> = rows.iter().map(|row| row.stop).collect();
    let starts: Array1<f64> = rows.iter().map(|row| row.start).collect();
    let (upper_tof, lower_tof) = compute_tof_bounds(
        stops.view(),
        starts.view(),
        calibration.mass_offset,
        calibration.mass_gain,
        time_res,
    )?;

    Ok(rows
        .into_iter()
        .zip(lower_tof.iter().zip(upper_tof.iter()))
        .map(|(row, (&lower_tof, &upper_tof))| ChannelWindow {
            target: row.target,
            mass: row.mass,
            lower_tof,
            upper_tof,
        })
        .collect())
}
