//! Decoding loops over the pulse data of a memory-mapped bin file

use ndarray::Array4;

use crate::parser::{parse_trigger_event, parse_trigger_record, skip_pulses};
use crate::types::{Header, PulseHistograms};

/// Counts the total number of pulses across all pixels in the bin file
pub fn extract_total_counts(
    mmap_data: &[u8],
    header: &Header,
    pixel_offsets: &[[u64; 2]], // Array of [start, end] offsets for each pixel
) -> Result<u64, String> {
    let mut total_pulses = 0u64;

    for (pix_idx, &[start_offset, end_offset]) in pixel_offsets.iter().enumerate() {
        let mut input = &mmap_data[start_offset as usize..end_offset as usize];

        for _ in 0..header.triggers_per_pixel {
            let num_pulses = parse_trigger_record(&mut input).map_err(|e| {
                format!("Error parsing trigger record of pixel {}: {:?}", pix_idx, e)
            })?;
            skip_pulses(&mut input, num_pulses)
                .map_err(|e| format!("Truncated pulses in pixel {}: {:?}", pix_idx, e))?;
            total_pulses += num_pulses as u64;
        }
    }

    Ok(total_pulses)
}

/// Extracts bin file data into a 4D array `(type, y, x, channel)`.
///
/// `type` holds pulse counts, intensity sums and intensity * width sums when any channel has
/// `calc_intensity` set, and only pulse counts otherwise. A pulse is counted in every channel
/// whose inclusive window contains its time. Frames accumulate into the same raster.
pub fn extract_bin(
    mmap_data: &[u8],
    header: &Header,
    pixel_offsets: &[[u64; 2]],
    low_range: &[u16],
    high_range: &[u16],
    calc_intensity: &[bool],
) -> Result<Array4<u32>, String> {
    let num_channels = low_range.len();
    let size_x = header.size_x_pixels as usize;
    let size_y = header.size_y_pixels as usize;
    let pixels_per_frame = header.pixels_per_frame();
    let layers = if calc_intensity.iter().any(|&flag| flag) { 3 } else { 1 };

    let mut img_data = Array4::<u32>::zeros((layers, size_y, size_x, num_channels));

    for (pix_idx, &[start_offset, end_offset]) in pixel_offsets.iter().enumerate() {
        let pix = pix_idx % pixels_per_frame;
        let (row, col) = (pix / size_x, pix % size_x);
        let mut input = &mmap_data[start_offset as usize..end_offset as usize];

        for _ in 0..header.triggers_per_pixel {
            let trigger_event = parse_trigger_event(&mut input)
                .map_err(|e| format!("Error parsing trigger event of pixel {}: {:?}", pix_idx, e))?;

            for pulse in &trigger_event.pulses {
                for channel_idx in 0..num_channels {
                    if !pulse.within(low_range[channel_idx], high_range[channel_idx]) {
                        continue;
                    }
                    img_data[[0, row, col, channel_idx]] += 1;

                    if calc_intensity[channel_idx] {
                        let intensity = pulse.intensity as u32;
                        let cell = &mut img_data[[1, row, col, channel_idx]];
                        *cell = cell.saturating_add(intensity);
                        let cell = &mut img_data[[2, row, col, channel_idx]];
                        *cell = cell.saturating_add(intensity * pulse.width as u32);
                    }
                }
            }
        }
    }

    Ok(img_data)
}

/// Builds width, intensity and per-trigger pulse histograms for pulses in `[low, high]`
pub fn extract_histograms(
    mmap_data: &[u8],
    header: &Header,
    pixel_offsets: &[[u64; 2]],
    low: u16,
    high: u16,
) -> Result<PulseHistograms, String> {
    let mut histograms = PulseHistograms::zeros();
    let last_pulse_bin = PulseHistograms::PULSE_BINS - 1;

    for (pix_idx, &[start_offset, end_offset]) in pixel_offsets.iter().enumerate() {
        let mut input = &mmap_data[start_offset as usize..end_offset as usize];

        for _ in 0..header.triggers_per_pixel {
            let trigger_event = parse_trigger_event(&mut input)
                .map_err(|e| format!("Error parsing trigger event of pixel {}: {:?}", pix_idx, e))?;

            let mut in_window = 0usize;
            for pulse in trigger_event.pulses.iter().filter(|p| p.within(low, high)) {
                histograms.widths[pulse.width as usize] += 1;
                histograms.intensities[pulse.intensity as usize] += 1;
                in_window += 1;
            }
            histograms.pulses[in_window.min(last_pulse_bin)] += 1;
        }
    }

    Ok(histograms)
}
