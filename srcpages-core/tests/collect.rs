use std::fs;
use std::path::Path;

use srcpages_core::collect::{
    collect_source_files, detect_languages, CollectError, DiscoveryConfig, Language,
};
use tempfile::tempdir;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "// content\n").unwrap();
}

fn relative_paths(root: &Path, languages: &[Language], extra: &DiscoveryConfig) -> Vec<String> {
    collect_source_files(root, languages, extra)
        .unwrap()
        .into_iter()
        .map(|f| {
            f.path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_detects_languages_from_markers() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "Cargo.toml");
    touch(dir.path(), "frontend/package.json");
    touch(dir.path(), "scripts/tool.py");

    // Markers win, so the stray Python file does not count.
    assert_eq!(
        detect_languages(dir.path()),
        vec![Language::Typescript, Language::Rust]
    );
}

#[test]
fn test_falls_back_to_extensions_without_markers() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "deep/nested/main.go");
    touch(dir.path(), "lib/util.rb");

    assert_eq!(
        detect_languages(dir.path()),
        vec![Language::Ruby, Language::Go]
    );
}

#[test]
fn test_empty_directory_has_no_languages() {
    let dir = tempdir().unwrap();
    assert!(detect_languages(dir.path()).is_empty());
}

#[test]
fn test_java_priority_order_and_test_exclusion() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(root, "src/main/java/com/acme/App.java");
    touch(root, "src/main/java/com/acme/service/OrderService.java");
    touch(root, "src/main/java/com/acme/controller/OrderController.java");
    touch(root, "src/main/java/com/acme/controller/OrderControllerTest.java");
    touch(root, "src/main/java/com/acme/entity/Order.java");

    assert_eq!(
        relative_paths(root, &[Language::Java], &DiscoveryConfig::default()),
        vec![
            "src/main/java/com/acme/controller/OrderController.java",
            "src/main/java/com/acme/service/OrderService.java",
            "src/main/java/com/acme/entity/Order.java",
            "src/main/java/com/acme/App.java",
        ]
    );
}

#[test]
fn test_excluded_directories_are_relative_to_root() {
    // The project itself lives under a directory called "build"; only nested build dirs count.
    let outer = tempdir().unwrap();
    let root = outer.path().join("build").join("project");
    touch(&root, "src/lib.rs");
    touch(&root, "src/target/generated.rs");
    touch(&root, "src/parser_test.rs");

    assert_eq!(
        relative_paths(&root, &[Language::Rust], &DiscoveryConfig::default()),
        vec!["src/lib.rs"]
    );
}

#[test]
fn test_python_root_files_are_collected_once() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(root, "src/core.py");
    touch(root, "main.py");
    touch(root, "test_main.py");
    touch(root, ".venv/lib/site.py");
    touch(root, ".git/hooks/pre-commit.py");

    assert_eq!(
        relative_paths(root, &[Language::Python], &DiscoveryConfig::default()),
        vec!["src/core.py", "main.py"]
    );
}

#[test]
fn test_extra_exclusions_from_config() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(root, "src/main.rs");
    touch(root, "src/generated/schema.rs");
    touch(root, "src/bindings.rs");

    let extra = DiscoveryConfig {
        languages: None,
        exclude_patterns: vec!["bind*.rs".to_string()],
        exclude_dirs: vec!["generated".to_string()],
    };
    assert_eq!(
        relative_paths(root, &[Language::Rust], &extra),
        vec!["src/main.rs"]
    );
}

#[test]
fn test_invalid_extra_pattern_is_an_error() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "src/main.rs");
    let extra = DiscoveryConfig {
        exclude_patterns: vec!["[z-a].rs".to_string()],
        ..DiscoveryConfig::default()
    };
    let result = collect_source_files(dir.path(), &[Language::Rust], &extra);
    assert!(matches!(result, Err(CollectError::Pattern { .. })));
}
