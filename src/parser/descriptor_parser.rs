//! Parsers for the MIBIscope descriptor JSON

use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::error::{MbtError, Result};
use crate::types::descriptor::MibiDescriptor;

/// Parses descriptor bytes as JSON metadata.
///
/// Null padding is stripped first; if the cleaned text still does not parse, it is retried
/// truncated after its last closing brace.
pub fn parse_descriptor(bytes: &[u8], source: &Path) -> Result<MibiDescriptor> {
    let cleaned_bytes: Vec<u8> = bytes.iter().filter(|&&b| b != 0).copied().collect();
    let descriptor_str = String::from_utf8_lossy(&cleaned_bytes);

    match serde_json::from_str::<MibiDescriptor>(&descriptor_str) {
        Ok(descriptor) => Ok(descriptor),
        Err(e) => {
            debug!("Failed to parse descriptor {}: {}", source.display(), e);

            if let Some(pos) = descriptor_str.rfind('}') {
                let truncated = &descriptor_str[..=pos];
                if let Ok(descriptor) = serde_json::from_str::<MibiDescriptor>(truncated) {
                    warn!(
                        "Descriptor {} has trailing data after byte {}; ignoring it",
                        source.display(),
                        pos
                    );
                    return Ok(descriptor);
                }
            }

            Err(MbtError::Descriptor {
                path: source.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}

/// Reads and parses a json sidecar file
pub fn read_descriptor(path: &Path) -> Result<MibiDescriptor> {
    let bytes = fs::read(path)?;
    parse_descriptor(&bytes, path)
}
