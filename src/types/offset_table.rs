use bon::bon;
use ndarray::Array3;

use crate::error::Result;

/// Absolute file offsets of every pixel, indexed by `[frame, row, column]`
#[derive(Debug, PartialEq)]
pub struct OffsetLookupTable {
    pub offsets: Array3<u64>,
    pub size_y_pixels: usize,
    pub size_x_pixels: usize,
    pub frames: usize,
}

#[bon]
impl OffsetLookupTable {
    #[builder]
    pub fn new(
        offsets: Vec<u64>,
        size_x_pixels: usize,
        size_y_pixels: usize,
        frames: usize,
    ) -> Result<Self> {
        let offsets = Array3::from_shape_vec((frames, size_y_pixels, size_x_pixels), offsets)?;

        Ok(Self {
            offsets,
            size_y_pixels,
            size_x_pixels,
            frames,
        })
    }

    /// Convert the table into `[start, end)` byte ranges, one per pixel in file order.
    ///
    /// A pixel ends where the next one starts; the last pixel ends at `data_len`.
    /// Offsets outside `[data_start, data_len]` or running backwards are rejected.
    pub fn as_pixel_offsets(
        &self,
        data_start: u64,
        data_len: u64,
    ) -> std::result::Result<Vec<[u64; 2]>, String> {
        let flat: Vec<u64> = self.offsets.iter().copied().collect();
        let mut result = Vec::with_capacity(flat.len());

        for (idx, &start) in flat.iter().enumerate() {
            let end = flat.get(idx + 1).copied().unwrap_or(data_len);
            if start < data_start || end > data_len || start > end {
                return Err(format!(
                    "pixel {idx} spans [{start}, {end}) outside data section \
                     [{data_start}, {data_len})"
                ));
            }
            result.push([start, end]);
        }

        Ok(result)
    }
}
