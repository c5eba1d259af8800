//! # contract: data crossing module boundaries, and the two pluggable seams
//!
//! The pagination engine itself is a pure function of its inputs. Everything that touches the
//! outside world sits behind one of two traits so the pipeline can be driven by real
//! implementations in the CLI and by deterministic mocks in tests:
//!
//! - [`SourceReader`]: turns a discovered file into the lines of a [`SourceUnit`].
//! - [`DocumentRenderer`]: turns a [`Paginated`] result into the physical document.
//!
//! Both traits are annotated for `mockall`; the mocks are exported under the default
//! `test-export-mocks` feature so dependent crates can use them in their own tests.

use std::path::{Path, PathBuf};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use thiserror::Error;

use crate::paginate::Paginated;

/// One file's identity plus its ordered content lines, as handed to the pagination engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Printed in the unit's delimiter header; usually the file name.
    pub label: String,
    /// Content lines with trailing blank lines already trimmed.
    pub lines: Vec<String>,
}

impl SourceUnit {
    pub fn new(label: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            label: label.into(),
            lines,
        }
    }
}

/// A discovered file that contributed nothing because it could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUnit {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8")]
    Decode { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing to render: the paginated listing is empty")]
    EmptyDocument,
    #[error("failed to load font {path}: {reason}")]
    Font { path: PathBuf, reason: String },
    #[error("failed to write document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Identity printed in the document's running header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    pub name: String,
    pub version: String,
}

/// What the renderer produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub pages: usize,
    /// Visual rows laid out, after wrapping long lines.
    pub rows: usize,
}

/// Supplies the content lines of one source file.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait SourceReader {
    /// Read `path` into lines. Implementations trim trailing blank lines.
    fn read_lines(&self, path: &Path) -> Result<Vec<String>, SourceError>;
}

/// Produces the physical document from a pagination result.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait DocumentRenderer {
    /// Render `body` to `output`, creating or replacing the file.
    fn render(
        &self,
        meta: &DocumentMeta,
        body: &Paginated,
        output: &Path,
    ) -> Result<RenderSummary, RenderError>;
}
