//! Layered TIFF output tree for extracted fovs
//!
//! ```text
//! <out>/<fov>/<target>.tiff
//! <out>/<fov>/intensities/<target>_intensity.tiff
//! <out>/<fov>/intensity_times_width/<target>_int_width.tiff
//! ```

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::debug;
use ndarray::{Array3, Array4, ArrayView2, Axis};
use tiff::encoder::{TiffEncoder, colortype, compression::Deflate};

use crate::error::Result;
use crate::types::LayerType;

pub const INTENSITY_DIR: &str = LayerType::Intensity.label();
pub const INTENSITY_WIDTH_DIR: &str = LayerType::IntensityWidth.label();

/// Write one `[row, col]` image as a deflate-compressed 32-bit greyscale TIFF
pub fn write_tiff(path: &Path, image: ArrayView2<'_, u32>) -> Result<()> {
    let (rows, cols) = image.dim();
    let data: Vec<u32> = image.iter().copied().collect();

    let mut writer = BufWriter::new(File::create(path)?);
    let mut encoder = TiffEncoder::new(&mut writer)?;
    encoder.write_image_with_compression::<colortype::Gray32, _>(
        cols as u32,
        rows as u32,
        Deflate::default(),
        &data,
    )?;
    Ok(())
}

/// Write a condensed `[type, row, col, channel]` stack of one fov below `out_dir`.
///
/// Layer 0 is written for every target. A second layer, when present, holds intensities and
/// is written only for flagged targets. `int_width` is the `[row, col, channel]` intensity *
/// width layer, written only for flagged targets.
pub fn write_out(
    img_data: &Array4<u32>,
    int_width: Option<&Array3<u32>>,
    out_dir: &Path,
    fov: &str,
    targets: &[String],
    calc_intensity: &[bool],
) -> Result<Vec<PathBuf>> {
    let fov_dir = out_dir.join(fov);
    fs::create_dir_all(&fov_dir)?;

    let mut written = Vec::new();
    let pulse = img_data.index_axis(Axis(0), 0);
    for (j, target) in targets.iter().enumerate() {
        let path = fov_dir.join(format!("{target}.tiff"));
        write_tiff(&path, pulse.index_axis(Axis(2), j))?;
        written.push(path);
    }

    let flagged = || {
        targets
            .iter()
            .enumerate()
            .filter(|&(j, _)| calc_intensity.get(j).copied().unwrap_or(false))
    };

    if img_data.len_of(Axis(0)) > 1 {
        let dir = fov_dir.join(INTENSITY_DIR);
        fs::create_dir_all(&dir)?;
        let intensity = img_data.index_axis(Axis(0), 1);
        for (j, target) in flagged() {
            let path = dir.join(format!("{target}_intensity.tiff"));
            write_tiff(&path, intensity.index_axis(Axis(2), j))?;
            written.push(path);
        }
    }

    if let Some(int_width) = int_width {
        let dir = fov_dir.join(INTENSITY_WIDTH_DIR);
        fs::create_dir_all(&dir)?;
        for (j, target) in flagged() {
            let path = dir.join(format!("{target}_int_width.tiff"));
            write_tiff(&path, int_width.index_axis(Axis(2), j))?;
            written.push(path);
        }
    }

    debug!("Wrote {} tiffs for fov {}", written.len(), fov);
    Ok(written)
}
