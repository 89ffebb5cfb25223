//! Parser functions for the pixel offset lookup table

use crate::types::header::Header;
use winnow::{
    Parser,
    binary::le_u64,
    combinator::repeat,
    error::ContextError,
};

/// Parses the offset block into one u64 file offset per pixel and frame
pub fn parse_offset_table(input: &mut &[u8], header: &Header) -> Result<Vec<u64>, ContextError> {
    repeat(header.total_pixels(), le_u64::<_, ContextError>).parse_next(input)
}
