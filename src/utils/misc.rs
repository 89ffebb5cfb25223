use crate::parser::HEADER_LENGTH;
use crate::types::header::Header;

/// Computes the data_start offset which is the sum of:
///  - A fixed header length (0x12 bytes)
///  - The descriptor (metadata_length) bytes
///  - The offset block (size_x_pixels * size_y_pixels * frame_count * 8 bytes)
pub fn data_start_offset(header: &Header) -> usize {
    let descriptor_length = header.metadata_length as usize;
    let offset_block_size = header.total_pixels() * 8;
    HEADER_LENGTH + descriptor_length + offset_block_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_start_offset_does_not_overflow_u16() {
        let header = Header::builder()
            .file_signature(String::new())
            .size_x_pixels(1024)
            .size_y_pixels(1024)
            .triggers_per_pixel(1)
            .frame_count(1)
            .metadata_length(100)
            .build();
        assert_eq!(data_start_offset(&header), 0x12 + 100 + 1024 * 1024 * 8);
    }
}
