// ============================================================
// Layer 4 — Scan Loader
// ============================================================
// Enumerates the questionnaire scans in a user-provided folder.
// Only file formats the rest of the pipeline can decode are
// accepted; everything else in the folder is ignored.
//
// A folder with no accepted images is reported as an error
// naming the accepted formats — pointing the user at a mistyped
// path instead of silently producing an empty spreadsheet.

use anyhow::{bail, Context, Result};
use std::{fs, path::Path, path::PathBuf};

use crate::domain::traits::ScanSource;

/// The accepted scan image formats.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A folder of questionnaire scans.
/// Implements the ScanSource trait from Layer 3.
pub struct ScanDirectory {
    dir: String,
}

impl ScanDirectory {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ScanSource for ScanDirectory {
    fn scan_paths(&self) -> Result<Vec<PathBuf>> {
        let dir = Path::new(&self.dir);

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Cannot read scan directory '{}'", self.dir))?
        {
            let path = entry?.path();
            if path.is_file() && has_accepted_extension(&path) {
                paths.push(path);
            }
        }

        if paths.is_empty() {
            bail!(
                "The directory '{}' contains no images in an accepted format. \
                 Accepted image formats: {:?}",
                self.dir,
                ACCEPTED_EXTENSIONS,
            );
        }

        // Directory iteration order is filesystem-dependent; sort so a
        // re-run over the same folder visits scans in the same order.
        paths.sort();

        tracing::info!("Found {} scan(s) in '{}'", paths.len(), self.dir);
        Ok(paths)
    }
}

/// Decode one scan into grayscale. Decode failures are reported,
/// not classified — the caller decides whether to skip the file.
pub fn load_gray(path: &Path) -> Result<image::GrayImage> {
    let img = image::open(path)
        .with_context(|| format!("Cannot decode scan '{}'", path.display()))?;
    Ok(img.to_luma8())
}

fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            ACCEPTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_accepted_extensions_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.png", "b.jpg", "c.JPEG", "notes.txt", "d.tiff"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let source = ScanDirectory::new(dir.path().to_str().unwrap());
        let paths = source.scan_paths().unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "c.JPEG"]);
    }

    #[test]
    fn test_empty_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), b"no scans here").unwrap();

        let source = ScanDirectory::new(dir.path().to_str().unwrap());
        let err = source.scan_paths().unwrap_err().to_string();
        assert!(err.contains("Accepted image formats"));
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let source = ScanDirectory::new("/definitely/not/a/real/folder");
        assert!(source.scan_paths().is_err());
    }
}
