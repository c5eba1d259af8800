use srcpages_core::collect::Language;
use srcpages_core::config::PageTarget;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// A full config file maps onto every section.
#[test]
fn test_load_config_all_sections() {
    let config_yaml = r#"
project:
  root: ./demo
  name: Demo Service
  version: "2.1"
pages: auto
output_dir: ./out
discovery:
  languages: [rust, python]
  exclude_patterns: ["*_generated.rs"]
  exclude_dirs: [fixtures]
layout:
  usable_width_cm: 16.0
  lines_per_page: 50
  page_cap: 40
  char_widths:
    narrow_cm: 0.2
page:
  label_font_size_pt: 9
labels:
  footer: "- {page} -"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config =
        srcpages::load_config::load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.project.root, Some(PathBuf::from("./demo")));
    assert_eq!(config.project.name.as_deref(), Some("Demo Service"));
    assert_eq!(config.project.version.as_deref(), Some("2.1"));
    assert_eq!(config.pages, Some(PageTarget::Auto));
    assert_eq!(config.output_dir, Some(PathBuf::from("./out")));
    assert_eq!(
        config.discovery.languages,
        Some(vec![Language::Rust, Language::Python])
    );
    assert_eq!(config.discovery.exclude_dirs, vec!["fixtures".to_string()]);
    assert_eq!(config.layout.lines_per_page, 50);
    assert_eq!(config.layout.page_cap, 40);
    assert_eq!(config.layout.char_widths.narrow_cm, 0.2);
    // Unset fields keep their defaults.
    assert_eq!(config.layout.char_widths.wide_cm, 0.35);
    assert_eq!(config.page.label_font_size_pt, 9.0);
    assert_eq!(config.page.page_width_cm, 21.0);
    assert_eq!(config.labels.footer, "- {page} -");
    assert_eq!(config.labels.header, "{name} {version}");
}

/// An empty file is a valid config with every default.
#[test]
fn test_load_config_empty_file_uses_defaults() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "{}\n").unwrap();

    let config =
        srcpages::load_config::load_config(config_file.path()).expect("Config should load");
    assert!(config.pages.is_none());
    assert!(config.project.name.is_none());
    assert_eq!(config.layout.lines_per_page, 57);
}

#[test]
fn test_load_config_numeric_page_target() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "pages: 25\n").unwrap();

    let config = srcpages::load_config::load_config(config_file.path()).unwrap();
    assert_eq!(config.pages, Some(PageTarget::Fixed(25)));
}

/// An invalid layout is rejected when the file is loaded.
#[test]
fn test_load_config_rejects_invalid_layout() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "layout:\n  lines_per_page: 0\n").unwrap();

    let err = srcpages::load_config::load_config(config_file.path()).unwrap_err();
    assert!(
        format!("{err:#}").contains("lines per page"),
        "Layout error expected, got: {err:#}"
    );
}

#[test]
fn test_load_config_rejects_unknown_section() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "download:\n  output_dir: ./tmp\n").unwrap();

    let err = srcpages::load_config::load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("parse"), "got: {err}");
}

/// This test ensures that if the config file is not valid YAML, load_config errors and reports as such.
#[test]
fn test_load_config_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = srcpages::load_config::load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
fn test_load_config_missing_file() {
    let err = srcpages::load_config::load_config("does-not-exist.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
