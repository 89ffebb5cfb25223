use bon::Builder;

/// Fixed-size preamble of a bin file
#[derive(Debug, PartialEq, Builder)]
pub struct Header {
    pub file_signature: String,
    pub size_x_pixels: u16,
    pub size_y_pixels: u16,
    pub triggers_per_pixel: u16,
    pub frame_count: u16,
    pub metadata_length: u16,
}

impl Header {
    /// Number of pixels in a single frame
    pub fn pixels_per_frame(&self) -> usize {
        self.size_x_pixels as usize * self.size_y_pixels as usize
    }

    /// Number of entries in the offset table
    pub fn total_pixels(&self) -> usize {
        self.pixels_per_frame() * self.frame_count as usize
    }
}
