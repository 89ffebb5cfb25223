use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io;
use std::path::Path;

use itertools::Itertools;
use log::{debug, warn};
use memmap2::Mmap;

use crate::error::{MbtError, Result};
use crate::types::Acquisition;

pub const BIN_EXTENSION: &str = "bin";
pub const JSON_EXTENSION: &str = "json";

/// Read a binary file using memory mapping for improved performance
/// This is more efficient for large files as it doesn't load the entire file into RAM
pub fn read_binary_file_mmap(path: impl AsRef<Path>) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // Safety: The file is not modified while the mmap is active
    unsafe { Mmap::map(&file) }
}

/// Base names of the regular files in `dir` carrying the given extension
pub fn list_stems(dir: &Path, extension: &str) -> Result<BTreeSet<String>> {
    let mut stems = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.insert(stem.to_string());
        }
    }
    Ok(stems)
}

/// Locates paired bin/json files within the provided directory.
///
/// Only names with both a `.bin` and a `.json` file count. With `include_fovs`, names that
/// are not found are dropped with a warning. Fails with [`MbtError::NotFound`] when nothing
/// is left.
pub fn find_bin_files(
    data_dir: &Path,
    include_fovs: Option<&[String]>,
) -> Result<BTreeMap<String, Acquisition>> {
    let bin_stems = list_stems(data_dir, BIN_EXTENSION)?;
    let json_stems = list_stems(data_dir, JSON_EXTENSION)?;

    let mut fov_files: BTreeMap<String, Acquisition> = bin_stems
        .intersection(&json_stems)
        .map(|name| {
            let acquisition = Acquisition {
                name: name.clone(),
                bin_path: data_dir.join(format!("{name}.{BIN_EXTENSION}")),
                json_path: data_dir.join(format!("{name}.{JSON_EXTENSION}")),
            };
            (name.clone(), acquisition)
        })
        .collect();

    let unpaired = bin_stems.symmetric_difference(&json_stems).join(", ");
    if !unpaired.is_empty() {
        debug!("Skipping unpaired files in {}: {}", data_dir.display(), unpaired);
    }

    if let Some(include) = include_fovs {
        let missing = include.iter().filter(|name| !fov_files.contains_key(*name)).join(", ");
        if !missing.is_empty() {
            warn!("Requested fovs not found in {}: {}", data_dir.display(), missing);
        }
        fov_files.retain(|name, _| include.contains(name));
    }

    if fov_files.is_empty() {
        return Err(MbtError::NotFound {
            dir: data_dir.to_path_buf(),
        });
    }

    Ok(fov_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let tmp = tempdir().unwrap();
        let files = [
            ("fov1", true, true),
            ("fov2", true, true),
            ("fov3", true, true),
            ("fov4", true, false),
            ("fov5", false, true),
        ];
        for (name, make_bin, make_json) in files {
            if make_bin {
                touch(tmp.path(), &format!("{name}.bin"));
            }
            if make_json {
                touch(tmp.path(), &format!("{name}.json"));
            }
        }
        fs::create_dir(tmp.path().join("fov6.bin")).unwrap();
        touch(tmp.path(), "fov6.json");
        tmp
    }

    fn names(found: &BTreeMap<String, Acquisition>) -> Vec<&str> {
        found.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_find_bin_files_requires_pairs() {
        let tmp = fixture();
        let found = find_bin_files(tmp.path(), None).unwrap();
        assert_eq!(names(&found), vec!["fov1", "fov2", "fov3"]);
        assert_eq!(found["fov2"].bin_path, tmp.path().join("fov2.bin"));
        assert_eq!(found["fov2"].json_path, tmp.path().join("fov2.json"));
    }

    #[test]
    fn test_find_bin_files_include_fovs() {
        let tmp = fixture();
        let include = vec!["fov1".to_string(), "fov2".to_string(), "fov4".to_string()];
        let found = find_bin_files(tmp.path(), Some(include.as_slice())).unwrap();
        assert_eq!(names(&found), vec!["fov1", "fov2"]);
    }

    #[test]
    fn test_find_bin_files_nothing_included() {
        let tmp = fixture();
        let include = vec!["nope".to_string()];
        let err = find_bin_files(tmp.path(), Some(include.as_slice())).unwrap_err();
        assert!(matches!(err, MbtError::NotFound { .. }));
        assert!(err.to_string().contains("No viable bin files"));
    }

    #[test]
    fn test_find_bin_files_empty_dir() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            find_bin_files(tmp.path(), None),
            Err(MbtError::NotFound { .. })
        ));
    }
}
