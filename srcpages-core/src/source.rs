//! Loading discovered files into [`SourceUnit`]s.
//!
//! Reading is the only fallible step before pagination. A file that cannot be read or decoded
//! does not abort the run: it is logged, recorded as a [`SkippedUnit`] and contributes no lines.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::contract::{SkippedUnit, SourceError, SourceReader, SourceUnit};

/// Reads UTF-8 files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8(bytes).map_err(|_| SourceError::Decode {
            path: path.to_path_buf(),
        })?;
        Ok(split_lines(&content))
    }
}

/// Split text into lines (LF or CRLF) and drop trailing blank lines.
pub fn split_lines(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = content.lines().map(str::to_owned).collect();
    trim_trailing_blank(&mut lines);
    lines
}

/// Remove trailing lines that are empty or whitespace only.
pub fn trim_trailing_blank(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
}

/// Units read from disk plus the files that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedUnits {
    pub units: Vec<SourceUnit>,
    pub skipped: Vec<SkippedUnit>,
}

impl LoadedUnits {
    /// True when no unit contributed a single line.
    pub fn is_empty(&self) -> bool {
        self.units.iter().all(|unit| unit.lines.is_empty())
    }
}

/// Label printed in a unit's header: the file name, or the full path if there is none.
pub fn unit_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read every file in order. Unreadable files are skipped, empty files contribute nothing.
pub fn load_units<R: SourceReader + ?Sized>(files: &[PathBuf], reader: &R) -> LoadedUnits {
    let mut loaded = LoadedUnits::default();
    for path in files {
        match reader.read_lines(path) {
            Ok(lines) if lines.is_empty() => {
                debug!(path = %path.display(), "Source file is empty, nothing to add");
            }
            Ok(lines) => {
                debug!(path = %path.display(), lines = lines.len(), "Loaded source file");
                loaded.units.push(SourceUnit::new(unit_label(path), lines));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable source file");
                loaded.skipped.push(SkippedUnit {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    info!(
        units = loaded.units.len(),
        skipped = loaded.skipped.len(),
        "Loaded source units"
    );
    loaded
}
