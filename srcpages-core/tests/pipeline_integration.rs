use std::fs;
use std::path::{Path, PathBuf};

use srcpages_core::config::{LayoutConfig, PageTarget};
use srcpages_core::contract::{
    MockDocumentRenderer, MockSourceReader, RenderSummary, SourceError,
};
use srcpages_core::pipeline::{generate, inspect, GenerateRequest, ListingRequest, PipelineError};
use srcpages_core::source::FsSourceReader;
use tempfile::tempdir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn rust_project(root: &Path) {
    write(
        root,
        "Cargo.toml",
        "[package]\nname = \"demo-tool\"\nversion = \"0.1.0\"\n",
    );
    write(root, "src/main.rs", "fn main() {\n    run();\n}\n");
    write(root, "src/run.rs", "pub fn run() {}\n");
}

fn request(root: &Path, output_dir: PathBuf) -> GenerateRequest {
    GenerateRequest {
        listing: ListingRequest {
            root: root.to_path_buf(),
            ..ListingRequest::default()
        },
        output_dir,
    }
}

#[test]
fn test_generate_skips_unreadable_units_and_renders_the_rest() {
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    rust_project(project.path());

    let mut reader = MockSourceReader::new();
    reader.expect_read_lines().times(2).returning(|path: &Path| {
        if path.ends_with("run.rs") {
            Err(SourceError::Decode {
                path: path.to_path_buf(),
            })
        } else {
            Ok(vec!["fn main() {".to_string(), "}".to_string()])
        }
    });

    let mut renderer = MockDocumentRenderer::new();
    renderer
        .expect_render()
        .times(1)
        .withf(|meta, body, output| {
            meta.name == "Demo Tool"
                && meta.version == "V0.1.0"
                && body.line_count() == 5
                && output.ends_with("Demo ToolV0.1.0-source.pdf")
        })
        .returning(|_, _, _| Ok(RenderSummary { pages: 1, rows: 5 }));

    let report = generate(&request(project.path(), out.path().to_path_buf()), &reader, &renderer)
        .expect("generate should succeed");

    assert_eq!(report.listing.files, 2);
    assert_eq!(report.listing.units, 1);
    assert_eq!(report.listing.skipped.len(), 1);
    assert!(report.listing.skipped[0].path.ends_with("run.rs"));
    assert_eq!(report.rendered.pages, 1);
    assert_eq!(report.output, out.path().join("Demo ToolV0.1.0-source.pdf"));
}

#[test]
fn test_empty_corpus_never_reaches_the_renderer() {
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    rust_project(project.path());

    let mut reader = MockSourceReader::new();
    reader.expect_read_lines().returning(|_| Ok(vec![]));
    let mut renderer = MockDocumentRenderer::new();
    renderer.expect_render().never();

    let err = generate(&request(project.path(), out.path().to_path_buf()), &reader, &renderer)
        .unwrap_err();
    assert!(matches!(err, PipelineError::EmptyCorpus { files: 2 }));
}

#[test]
fn test_missing_name_is_an_error_for_generate() {
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    // No manifest: the language is found by extension and there is no name to detect.
    write(project.path(), "src/main.rs", "fn main() {}\n");

    let mut renderer = MockDocumentRenderer::new();
    renderer.expect_render().never();

    let err = generate(
        &request(project.path(), out.path().to_path_buf()),
        &FsSourceReader,
        &renderer,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::MissingName));
}

#[test]
fn test_name_and_version_overrides() {
    let project = tempdir().unwrap();
    let out = tempdir().unwrap();
    rust_project(project.path());

    let mut renderer = MockDocumentRenderer::new();
    renderer
        .expect_render()
        .withf(|meta, _, _| meta.name == "Ledger: Core" && meta.version == "V3.0")
        .returning(|_, _, _| Ok(RenderSummary { pages: 1, rows: 10 }));

    let mut req = request(project.path(), out.path().join("nested"));
    req.listing.name = Some("Ledger: Core".to_string());
    req.listing.version = Some("3.0".to_string());

    let report = generate(&req, &FsSourceReader, &renderer).unwrap();
    assert_eq!(
        report.output,
        out.path().join("nested").join("Ledger CoreV3.0-source.pdf")
    );
    assert!(out.path().join("nested").is_dir());
}

#[test]
fn test_inspect_reports_split_in_auto_mode() {
    let project = tempdir().unwrap();
    rust_project(project.path());
    let long: String = (0..400).map(|i| format!("let x{i} = {i};\n")).collect();
    write(project.path(), "src/long.rs", &long);

    let listing = ListingRequest {
        root: project.path().to_path_buf(),
        target: PageTarget::Auto,
        layout: LayoutConfig {
            lines_per_page: 20,
            page_cap: 4,
            ..LayoutConfig::default()
        },
        ..ListingRequest::default()
    };

    let report = inspect(&listing, &FsSourceReader).unwrap();
    let split = report.split.expect("a long listing should be split");
    assert_eq!(split.total_pages, report.corpus_cost.div_ceil(20));
    assert_eq!(split.omitted_pages, split.total_pages - 4);
    assert!(report.printed_pages <= 4);
    assert_eq!(report.name.as_deref(), Some("Demo Tool"));
}

#[test]
fn test_fixed_mode_reports_truncation() {
    let project = tempdir().unwrap();
    rust_project(project.path());
    let long: String = (0..400).map(|i| format!("let x{i} = {i};\n")).collect();
    write(project.path(), "src/long.rs", &long);

    let listing = ListingRequest {
        root: project.path().to_path_buf(),
        target: PageTarget::Fixed(1),
        ..ListingRequest::default()
    };

    let report = inspect(&listing, &FsSourceReader).unwrap();
    assert!(report.split.is_none());
    assert!(report.printed_cost <= 58);
    assert!(report.corpus_cost > 400);
}

#[test]
fn test_directory_without_sources() {
    let empty = tempdir().unwrap();
    let err = inspect(
        &ListingRequest {
            root: empty.path().to_path_buf(),
            ..ListingRequest::default()
        },
        &FsSourceReader,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::NoLanguages(_)));

    let manifest_only = tempdir().unwrap();
    write(manifest_only.path(), "Cargo.toml", "[package]\nname = \"x\"\n");
    let err = inspect(
        &ListingRequest {
            root: manifest_only.path().to_path_buf(),
            ..ListingRequest::default()
        },
        &FsSourceReader,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::NoSourceFiles(_)));
}

#[test]
fn test_invalid_layout_is_rejected_before_any_work() {
    let project = tempdir().unwrap();
    rust_project(project.path());
    let mut reader = MockSourceReader::new();
    reader.expect_read_lines().never();

    let listing = ListingRequest {
        root: project.path().to_path_buf(),
        layout: LayoutConfig {
            usable_width_cm: 0.0,
            ..LayoutConfig::default()
        },
        ..ListingRequest::default()
    };
    let err = inspect(&listing, &reader).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}
