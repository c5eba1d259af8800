//! High-level pipeline: project root → discovered files → paginated listing → document.
//!
//! Both entry points share the same preparation steps:
//!   - Validate the layout and resolve the project identity (flags first, detection second)
//!   - Detect languages (unless configured) and collect source files in listing order
//!   - Load every file through a [`SourceReader`], recording the ones that had to be skipped
//!   - Paginate according to the [`PageTarget`]
//!
//! [`generate`] then hands the result to a [`DocumentRenderer`]; [`inspect`] stops after
//! pagination and only reports what would be printed.
//!
//! # Error Handling
//! Every failure is a [`PipelineError`]. Unreadable files are not failures: they end up in
//! the report's `skipped` list. A project whose files are all unreadable or empty is
//! [`PipelineError::EmptyCorpus`] and the renderer is never called.
//!
//! # Callable From
//! - The CLI crate, with [`FsSourceReader`](crate::source::FsSourceReader) and
//!   [`PdfRenderer`](crate::render::PdfRenderer)
//! - Integration tests, with the mockall mocks from [`contract`](crate::contract)

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};

use crate::collect::{
    collect_source_files, detect_languages, CollectError, DiscoveryConfig, Language,
};
use crate::config::{ConfigError, LayoutConfig, PageTarget};
use crate::contract::{
    DocumentMeta, DocumentRenderer, RenderError, RenderSummary, SkippedUnit, SourceReader,
};
use crate::estimate::LineEstimator;
use crate::paginate::{listing_cost, paginate, Paginated};
use crate::project::{normalise_version, read_project_info, safe_file_stem};
use crate::source::load_units;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("project root {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("no supported language detected under {0}")]
    NoLanguages(PathBuf),
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error("no source files found under {0}")]
    NoSourceFiles(PathBuf),
    #[error("none of the {files} source files has any content to print")]
    EmptyCorpus { files: usize },
    #[error("no project name given and none could be detected")]
    MissingName,
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What to list and how to paginate it.
#[derive(Debug, Clone, Default)]
pub struct ListingRequest {
    pub root: PathBuf,
    /// Overrides the detected project name.
    pub name: Option<String>,
    /// Overrides the detected version. A `V` prefix is added if missing.
    pub version: Option<String>,
    pub target: PageTarget,
    pub layout: LayoutConfig,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub listing: ListingRequest,
    pub output_dir: PathBuf,
}

/// Shape of a split listing, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitInfo {
    pub front_lines: usize,
    pub back_lines: usize,
    pub omitted_pages: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectReport {
    pub name: Option<String>,
    pub version: String,
    pub languages: Vec<Language>,
    pub files: usize,
    pub units: usize,
    pub skipped: Vec<SkippedUnit>,
    pub target: PageTarget,
    /// Rendered cost of the whole corpus, before truncation or splitting.
    pub corpus_cost: usize,
    /// Logical lines that will be printed, headers and separators included.
    pub printed_lines: usize,
    /// Rendered cost of the printed lines.
    pub printed_cost: usize,
    /// Pages the printed lines occupy at `lines_per_page`.
    pub printed_pages: usize,
    pub split: Option<SplitInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateReport {
    pub listing: InspectReport,
    pub output: PathBuf,
    pub rendered: RenderSummary,
}

/// Run every step short of rendering and report what would be printed.
pub fn inspect<R>(request: &ListingRequest, reader: &R) -> Result<InspectReport, PipelineError>
where
    R: SourceReader + ?Sized,
{
    info!(root = %request.root.display(), "[INSPECT] Starting");
    let (report, _) = prepare(request, reader)?;
    info!(
        files = report.files,
        printed_pages = report.printed_pages,
        split = report.split.is_some(),
        "[INSPECT] Done"
    );
    Ok(report)
}

/// Produce the paginated listing document in `request.output_dir`.
pub fn generate<R, D>(
    request: &GenerateRequest,
    reader: &R,
    renderer: &D,
) -> Result<GenerateReport, PipelineError>
where
    R: SourceReader + ?Sized,
    D: DocumentRenderer + ?Sized,
{
    info!(root = %request.listing.root.display(), "[GENERATE] Starting");
    let (listing, body) = prepare(&request.listing, reader)?;

    let Some(name) = listing.name.clone() else {
        error!("[GENERATE][ERROR] Project name missing");
        return Err(PipelineError::MissingName);
    };

    std::fs::create_dir_all(&request.output_dir).map_err(|source| {
        error!(path = %request.output_dir.display(), error = ?source, "[GENERATE][ERROR] Cannot create output directory");
        PipelineError::OutputDir {
            path: request.output_dir.clone(),
            source,
        }
    })?;
    let output = output_path(&request.output_dir, &name, &listing.version);

    let meta = DocumentMeta {
        name,
        version: listing.version.clone(),
    };
    let rendered = renderer.render(&meta, &body, &output).map_err(|e| {
        error!(output = %output.display(), error = ?e, "[GENERATE][ERROR] Rendering failed");
        e
    })?;
    info!(
        output = %output.display(),
        pages = rendered.pages,
        "[GENERATE] Document written"
    );

    Ok(GenerateReport {
        listing,
        output,
        rendered,
    })
}

/// `{output_dir}/{name}{version}-source.pdf`, with characters unsafe in file names removed.
pub fn output_path(output_dir: &Path, name: &str, version: &str) -> PathBuf {
    output_dir.join(format!(
        "{}{}-source.pdf",
        safe_file_stem(name),
        safe_file_stem(version)
    ))
}

fn prepare<R>(
    request: &ListingRequest,
    reader: &R,
) -> Result<(InspectReport, Paginated), PipelineError>
where
    R: SourceReader + ?Sized,
{
    let root = request.root.as_path();
    request.layout.validate().map_err(|e| {
        error!(error = %e, "[PIPELINE][ERROR] Invalid layout");
        e
    })?;
    request.layout.trace_loaded();
    if !root.is_dir() {
        error!(root = %root.display(), "[PIPELINE][ERROR] Project root is not a directory");
        return Err(PipelineError::NotADirectory(root.to_path_buf()));
    }

    let detected = read_project_info(root);
    let name = request
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or(detected.name);
    let version = request
        .version
        .as_deref()
        .map(normalise_version)
        .unwrap_or(detected.version);
    info!(?name, %version, "[PIPELINE] Project identity resolved");

    let languages = match &request.discovery.languages {
        Some(configured) => configured.clone(),
        None => detect_languages(root),
    };
    if languages.is_empty() {
        error!(root = %root.display(), "[PIPELINE][ERROR] No languages");
        return Err(PipelineError::NoLanguages(root.to_path_buf()));
    }

    let files = collect_source_files(root, &languages, &request.discovery)?;
    if files.is_empty() {
        error!(root = %root.display(), "[PIPELINE][ERROR] No source files");
        return Err(PipelineError::NoSourceFiles(root.to_path_buf()));
    }
    info!(files = files.len(), "[PIPELINE] Collected source files");

    let paths: Vec<PathBuf> = files.into_iter().map(|file| file.path).collect();
    let loaded = load_units(&paths, reader);
    if loaded.is_empty() {
        error!(files = paths.len(), "[PIPELINE][ERROR] Nothing to print");
        return Err(PipelineError::EmptyCorpus { files: paths.len() });
    }

    let estimator = LineEstimator::from_layout(&request.layout);
    let body = paginate(&loaded.units, request.target, &request.layout, &estimator);

    let printed_cost = match &body {
        Paginated::Whole { lines, .. } => lines.iter().map(|l| estimator.cost(l)).sum(),
        Paginated::Split { front, back, .. } => {
            front.iter().chain(back).map(|l| estimator.cost(l)).sum()
        }
    };
    let corpus_cost = match &body {
        Paginated::Split { total_cost, .. } => *total_cost,
        Paginated::Whole { .. } => listing_cost(&loaded.units, &estimator),
    };
    let split = match &body {
        Paginated::Whole { .. } => None,
        Paginated::Split {
            front,
            back,
            omitted_pages,
            total_pages,
            ..
        } => Some(SplitInfo {
            front_lines: front.len(),
            back_lines: back.len(),
            omitted_pages: *omitted_pages,
            total_pages: *total_pages,
        }),
    };

    let report = InspectReport {
        name,
        version,
        languages,
        files: paths.len(),
        units: loaded.units.len(),
        skipped: loaded.skipped,
        target: request.target,
        corpus_cost,
        printed_lines: body.line_count(),
        printed_cost,
        printed_pages: request.layout.pages_for_cost(printed_cost),
        split,
    };
    info!(
        total_cost = report.printed_cost,
        total_pages = report.printed_pages,
        lines = report.printed_lines,
        "[PIPELINE] Paginated"
    );
    Ok((report, body))
}
