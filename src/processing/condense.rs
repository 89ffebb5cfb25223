//! Reduce an extracted `[type, row, col, channel]` stack to the layers that were asked for

use ndarray::{Array4, Axis, s};

/// Condense extracted image data according to the intensity flags.
///
/// - no channel flagged: keep only the pulse count layer
/// - `replace`: flagged channels take their intensity image in place of their pulse image,
///   and only that merged layer is kept
/// - otherwise: keep the pulse count and intensity layers
pub fn condense_img_data(
    img_data: Array4<u32>,
    calc_intensity: &[bool],
    replace: bool,
) -> Array4<u32> {
    let any_intensity = calc_intensity.iter().any(|&flag| flag);
    let layers = img_data.len_of(Axis(0));

    if !any_intensity || layers < 2 {
        return img_data.slice_move(s![0..1, .., .., ..]);
    }

    if replace {
        let mut img_data = img_data;
        for (j, _) in calc_intensity.iter().enumerate().filter(|(_, flag)| **flag) {
            let (mut pulse, intensity) =
                img_data.multi_slice_mut((s![0, .., .., j], s![1, .., .., j]));
            pulse.assign(&intensity);
        }
        img_data.slice_move(s![0..1, .., .., ..])
    } else {
        img_data.slice_move(s![0..2, .., .., ..])
    }
}
