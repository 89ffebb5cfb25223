//! Synthetic bin/json fixtures shared by the unit tests

use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde_json::json;
use tiff::decoder::{Decoder, DecodingResult};

use crate::types::MibiDescriptor;

pub const FOV: &str = "fov-1-scan-1";

/// Calibration used by the synthetic fixtures: `tof = 0.1 * sqrt(mass) / 500e-6`
pub const MASS_GAIN: f64 = 0.1;
pub const MASS_OFFSET: f64 = 0.0;

/// Tof bins inside the SMA window `[88.7, 89.0]` (bins 1883..=1887)
pub const SMA_TOF: u16 = 1885;
/// Tof bin inside the HH3 window `[97.7, 98.0]` (bins 1976..=1980)
pub const HH3_TOF: u16 = 1978;
/// Tof bin outside every window
pub const NOISE_TOF: u16 = 1500;

pub fn descriptor_json(panel: Option<&[(f64, &str)]>) -> serde_json::Value {
    let mut fov = json!({
        "name": "R1C1",
        "fullTiming": {
            "massCalibration": {"massGain": MASS_GAIN, "massOffset": MASS_OFFSET}
        }
    });
    if let Some(panel) = panel {
        let conjugates: Vec<_> = panel
            .iter()
            .map(|(mass, target)| json!({"mass": mass, "target": target}))
            .collect();
        fov["panel"] = json!({"name": "synthetic", "conjugates": conjugates});
    }
    json!({ "fov": fov })
}

pub const TISSUE_PANEL: [(f64, &str); 2] = [(89.0, "SMA"), (98.0, "HH3")];

pub fn tissue_descriptor() -> MibiDescriptor {
    serde_json::from_value(descriptor_json(Some(&TISSUE_PANEL[..]))).unwrap()
}

pub fn moly_descriptor() -> MibiDescriptor {
    serde_json::from_value(descriptor_json(None)).unwrap()
}

/// A pulse as `(time, width, intensity)`
pub type Pulse = (u16, u8, u16);

/// Write a bin file whose pixel `(row, col)` and trigger `t` hold `pulses(row, col, t)` in
/// every frame
pub fn write_bin<F>(
    path: &Path,
    (size_x, size_y): (u16, u16),
    frames: u16,
    triggers_per_pixel: u16,
    pulses: F,
) where
    F: Fn(usize, usize, usize) -> Vec<Pulse>,
{
    let descriptor = br#"{"embedded": true}"#;
    let total = size_x as usize * size_y as usize * frames as usize;

    let mut bytes = b"MIBI01".to_vec();
    for v in [size_x, size_y, triggers_per_pixel, frames, 0, descriptor.len() as u16] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes.extend_from_slice(descriptor);

    let mut pixel_data = Vec::new();
    let mut offsets = Vec::with_capacity(total);
    let data_start = bytes.len() + total * 8;
    let rows = 0..size_y as usize;
    let cols = 0..size_x as usize;
    for (_, row, col) in itertools::iproduct!(0..frames, rows, cols) {
        offsets.push((data_start + pixel_data.len()) as u64);
        for trigger in 0..triggers_per_pixel as usize {
            let pulses = pulses(row, col, trigger);
            pixel_data.extend_from_slice(&[0u8; 6]);
            pixel_data.extend_from_slice(&(pulses.len() as u16).to_le_bytes());
            for (time, width, intensity) in pulses {
                pixel_data.extend_from_slice(&time.to_le_bytes());
                pixel_data.push(width);
                pixel_data.extend_from_slice(&intensity.to_le_bytes());
            }
        }
    }
    for offset in offsets {
        bytes.extend_from_slice(&offset.to_le_bytes());
    }
    bytes.extend_from_slice(&pixel_data);

    fs::write(path, bytes).unwrap();
}

/// Pixel `(row, col)` gets `row + 1` SMA pulses of intensity `10 * (row + 1)` (width 1),
/// `col + 1` HH3 pulses of intensity 20 (width 2) and one noise pulse, all in its first
/// trigger; the second trigger is empty
pub fn tissue_pulses(row: usize, col: usize, trigger: usize) -> Vec<Pulse> {
    if trigger > 0 {
        return Vec::new();
    }
    let mut pulses = vec![(SMA_TOF, 1, 10 * (row as u16 + 1)); row + 1];
    pulses.extend(vec![(HH3_TOF, 2, 20); col + 1]);
    pulses.push((NOISE_TOF, 3, 99));
    pulses
}

/// Write `<name>.bin` and `<name>.json` into `dir`
pub fn write_fov(dir: &Path, name: &str, panel: Option<&[(f64, &str)]>, size: (u16, u16)) {
    write_bin(&dir.join(format!("{name}.bin")), size, 1, 2, tissue_pulses);
    fs::write(
        dir.join(format!("{name}.json")),
        serde_json::to_vec_pretty(&descriptor_json(panel)).unwrap(),
    )
    .unwrap();
}

/// Write the default tissue fov (4 columns x 3 rows) into `dir`
pub fn write_tissue_fov(dir: &Path, name: &str) {
    write_fov(dir, name, Some(&TISSUE_PANEL[..]), (4, 3));
}

/// Decode a 32-bit greyscale TIFF into a `[row, col]` array
pub fn read_tiff(path: &Path) -> Array2<u32> {
    let mut decoder = Decoder::new(fs::File::open(path).unwrap()).unwrap();
    let (width, height) = decoder.dimensions().unwrap();
    match decoder.read_image().unwrap() {
        DecodingResult::U32(data) => {
            Array2::from_shape_vec((height as usize, width as usize), data).unwrap()
        }
        _ => panic!("{} is not a 32-bit tiff", path.display()),
    }
}
