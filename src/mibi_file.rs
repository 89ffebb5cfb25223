use crate::error::{MbtError, Result};
use crate::parser::{parse_header, parse_offset_table, skip_embedded_descriptor};
use crate::processing::extract;
use crate::types::{Header, OffsetLookupTable, PulseHistograms};
use crate::utils::file_utils::read_binary_file_mmap;
use crate::utils::misc::data_start_offset;
use log::debug;
use ndarray::Array4;
use std::path::{Path, PathBuf};

/// A memory-mapped bin file with its header and pixel layout decoded
pub struct MibiFile {
    pub path: PathBuf,
    pub header: Header,
    pub offset_table: OffsetLookupTable,
    pixel_offsets: Vec<[u64; 2]>,
    mmap_data: memmap2::Mmap,
}

impl MibiFile {
    /// Open a bin file, parsing the header and offset table
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let corrupt = |reason: String| MbtError::CorruptBin {
            path: path.to_path_buf(),
            reason,
        };

        let mmap_data = read_binary_file_mmap(path)?;
        let mut input: &[u8] = &mmap_data;

        let header = parse_header(&mut input)
            .map_err(|e| corrupt(format!("Failed to parse header: {:?}", e)))?;
        skip_embedded_descriptor(&mut input, &header)
            .map_err(|e| corrupt(format!("Failed to skip descriptor: {:?}", e)))?;
        let offsets = parse_offset_table(&mut input, &header)
            .map_err(|e| corrupt(format!("Failed to parse offset table: {:?}", e)))?;

        let offset_table = OffsetLookupTable::builder()
            .offsets(offsets)
            .size_x_pixels(header.size_x_pixels as usize)
            .size_y_pixels(header.size_y_pixels as usize)
            .frames(header.frame_count as usize)
            .build()?;
        let pixel_offsets = offset_table
            .as_pixel_offsets(data_start_offset(&header) as u64, mmap_data.len() as u64)
            .map_err(corrupt)?;

        debug!(
            "Opened {} ({}x{} pixels, {} triggers/pixel, {} frames)",
            path.display(),
            header.size_x_pixels,
            header.size_y_pixels,
            header.triggers_per_pixel,
            header.frame_count
        );

        Ok(Self {
            path: path.to_path_buf(),
            header,
            offset_table,
            pixel_offsets,
            mmap_data,
        })
    }

    /// Get a summary of the file contents
    pub fn get_summary(&self) -> String {
        let mut result = String::new();

        result.push_str(&format!("File: {}\n", self.path.display()));
        result.push_str(&format!(
            "  Frame size: {}x{}\n",
            self.header.size_x_pixels, self.header.size_y_pixels
        ));
        result.push_str(&format!("  Frames: {}\n", self.header.frame_count));
        result.push_str(&format!(
            "  Triggers per pixel: {}\n",
            self.header.triggers_per_pixel
        ));
        result.push_str(&format!("  Data bytes: {}\n", self.mmap_data.len()));

        result
    }

    fn corrupt(&self, reason: String) -> MbtError {
        MbtError::CorruptBin {
            path: self.path.clone(),
            reason,
        }
    }

    /// Pulse count, intensity and intensity * width images for the given tof windows
    pub fn extract_image(
        &self,
        low_range: &[u16],
        high_range: &[u16],
        calc_intensity: &[bool],
    ) -> Result<Array4<u32>> {
        if low_range.len() != high_range.len() || low_range.len() != calc_intensity.len() {
            return Err(MbtError::InvalidArgument(format!(
                "{} lower bounds, {} upper bounds and {} intensity flags",
                low_range.len(),
                high_range.len(),
                calc_intensity.len()
            )));
        }

        extract::extract_bin(
            &self.mmap_data,
            &self.header,
            &self.pixel_offsets,
            low_range,
            high_range,
            calc_intensity,
        )
        .map_err(|reason| self.corrupt(reason))
    }

    /// Width, intensity and pulse histograms for a single tof window
    pub fn extract_histograms(&self, low: u16, high: u16) -> Result<PulseHistograms> {
        extract::extract_histograms(&self.mmap_data, &self.header, &self.pixel_offsets, low, high)
            .map_err(|reason| self.corrupt(reason))
    }

    /// Total number of recorded pulses
    pub fn total_counts(&self) -> Result<u64> {
        extract::extract_total_counts(&self.mmap_data, &self.header, &self.pixel_offsets)
            .map_err(|reason| self.corrupt(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FOV, HH3_TOF, SMA_TOF, write_bin, write_tissue_fov};
    use ndarray::s;
    use std::fs;
    use tempfile::tempdir;

    const SMA: (u16, u16) = (1883, 1887);
    const HH3: (u16, u16) = (1976, 1980);

    fn tissue_file(dir: &Path) -> MibiFile {
        write_tissue_fov(dir, FOV);
        MibiFile::open(dir.join(format!("{FOV}.bin"))).unwrap()
    }

    #[test]
    fn test_open_reads_header_and_layout() {
        let dir = tempdir().unwrap();
        let file = tissue_file(dir.path());
        assert_eq!(file.header.size_x_pixels, 4);
        assert_eq!(file.header.size_y_pixels, 3);
        assert_eq!(file.header.triggers_per_pixel, 2);
        assert_eq!(file.header.frame_count, 1);
        assert!(file.get_summary().contains("Frame size: 4x3"));
    }

    #[test]
    fn test_extract_image_layers() {
        let dir = tempdir().unwrap();
        let file = tissue_file(dir.path());
        let img = file
            .extract_image(&[SMA.0, HH3.0], &[SMA.1, HH3.1], &[true, false])
            .unwrap();
        assert_eq!(img.shape(), &[3, 3, 4, 2]);

        for ((row, col), &count) in img.slice(s![0, .., .., 0]).indexed_iter() {
            let expected = row as u32 + 1;
            assert_eq!(count, expected);
            assert_eq!(img[[1, row, col, 0]], 10 * expected * expected);
            assert_eq!(img[[2, row, col, 0]], 10 * expected * expected);
            assert_eq!(img[[0, row, col, 1]], col as u32 + 1);
        }
        assert!(img.slice(s![1.., .., .., 1]).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_no_intensity_flags_give_single_layer() {
        let dir = tempdir().unwrap();
        let file = tissue_file(dir.path());
        let img = file.extract_image(&[SMA.0], &[SMA.1], &[false]).unwrap();
        assert_eq!(img.shape(), &[1, 3, 4, 1]);
        assert_eq!(img.sum(), 24);
    }

    #[test]
    fn test_overlapping_windows_both_count_a_pulse() {
        let dir = tempdir().unwrap();
        let file = tissue_file(dir.path());
        let img = file
            .extract_image(&[SMA_TOF - 5, SMA_TOF], &[SMA_TOF + 5, SMA_TOF], &[false, false])
            .unwrap();
        assert_eq!(img.slice(s![0, .., .., 0]).sum(), 24);
        assert_eq!(img.slice(s![0, .., .., 1]).sum(), 24);

        let img = file.extract_image(&[HH3_TOF + 1], &[HH3_TOF + 1], &[false]).unwrap();
        assert_eq!(img.sum(), 0);
    }

    #[test]
    fn test_frames_are_summed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frames.bin");
        write_bin(&path, (2, 2), 3, 1, |_, _, _| vec![(100, 2, 5)]);

        let file = MibiFile::open(&path).unwrap();
        let img = file.extract_image(&[100], &[100], &[true]).unwrap();
        assert_eq!(img.shape(), &[3, 2, 2, 1]);
        assert!(img.slice(s![0, .., .., 0]).iter().all(|&v| v == 3));
        assert!(img.slice(s![1, .., .., 0]).iter().all(|&v| v == 15));
        assert!(img.slice(s![2, .., .., 0]).iter().all(|&v| v == 30));
        assert_eq!(file.total_counts().unwrap(), 12);
    }

    #[test]
    fn test_total_counts_include_out_of_window_pulses() {
        let dir = tempdir().unwrap();
        let file = tissue_file(dir.path());
        assert_eq!(file.total_counts().unwrap(), 66);
    }

    #[test]
    fn test_window_lengths_must_agree() {
        let dir = tempdir().unwrap();
        let file = tissue_file(dir.path());
        let err = file.extract_image(&[SMA.0, HH3.0], &[SMA.1], &[false, false]).unwrap_err();
        assert!(matches!(err, MbtError::InvalidArgument(_)));
    }

    #[test]
    fn test_truncated_files_are_corrupt() {
        let dir = tempdir().unwrap();
        write_tissue_fov(dir.path(), FOV);
        let path = dir.path().join(format!("{FOV}.bin"));
        let bytes = fs::read(&path).unwrap();

        fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
        let file = MibiFile::open(&path).unwrap();
        assert!(matches!(file.total_counts(), Err(MbtError::CorruptBin { .. })));

        fs::write(&path, &bytes[..10]).unwrap();
        assert!(matches!(MibiFile::open(&path), Err(MbtError::CorruptBin { .. })));
    }
}
