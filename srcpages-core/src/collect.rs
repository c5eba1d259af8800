//! Language detection and source file discovery.
//!
//! Each supported language has a [`LanguageProfile`]: the extensions that count as source,
//! directories to visit in priority order, and file-name / directory-name exclusions (tests,
//! build output, vendored code). Files are returned in the order the listing should print
//! them: by language, then priority directory, then extension, then path.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("invalid exclude pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("unknown language {0:?}")]
    UnknownLanguage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Typescript,
    Cpp,
    Ruby,
    Rust,
    Go,
    Python,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Java,
        Language::Typescript,
        Language::Cpp,
        Language::Ruby,
        Language::Rust,
        Language::Go,
        Language::Python,
    ];

    pub fn name(&self) -> &'static str {
        self.profile().name
    }

    pub fn profile(&self) -> &'static LanguageProfile {
        match self {
            Language::Java => &JAVA,
            Language::Typescript => &TYPESCRIPT,
            Language::Cpp => &CPP,
            Language::Ruby => &RUBY,
            Language::Rust => &RUST,
            Language::Go => &GO,
            Language::Python => &PYTHON,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|language| language.name() == wanted)
            .ok_or_else(|| CollectError::UnknownLanguage(s.to_string()))
    }
}

/// Where to look for a language's sources and what to leave out.
#[derive(Debug)]
pub struct LanguageProfile {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    /// Visited in order. `base/**/suffix` selects every directory below `base` whose name
    /// ends with `suffix`.
    pub priority_dirs: &'static [&'static str],
    /// Shell-style patterns matched against the file name.
    pub exclude_patterns: &'static [&'static str],
    /// Directory names that exclude everything below them.
    pub exclude_dirs: &'static [&'static str],
}

static JAVA: LanguageProfile = LanguageProfile {
    name: "java",
    extensions: &[".java"],
    priority_dirs: &[
        "src/main/java/**/controller",
        "src/main/java/**/service",
        "src/main/java/**/entity",
        "src/main/java/**/repository",
        "src/main/java/**/config",
        "src/main/java/**/security",
        "src/main/java/**/dto",
        "src/main/java",
    ],
    exclude_patterns: &["*Test.java", "*IT.java", "*Tests.java"],
    exclude_dirs: &["target", "build", ".gradle"],
};

static TYPESCRIPT: LanguageProfile = LanguageProfile {
    name: "typescript",
    extensions: &[".ts", ".tsx", ".vue"],
    priority_dirs: &[
        "src/api",
        "src/stores",
        "src/pages",
        "src/views",
        "src/components",
        "src/hooks",
        "src/utils",
        "src/layouts",
        "frontend/src/api",
        "frontend/src/stores",
        "frontend/src/pages",
        "frontend/src/views",
        "frontend/src/components",
        "frontend/src",
        "src",
    ],
    exclude_patterns: &["*.spec.ts", "*.test.ts", "*.spec.tsx", "*.test.tsx", "*.d.ts"],
    exclude_dirs: &["node_modules", "dist", "build", ".next"],
};

static CPP: LanguageProfile = LanguageProfile {
    name: "cpp",
    extensions: &[".cpp", ".cc", ".cxx", ".hpp", ".h"],
    priority_dirs: &["src", "include", "lib"],
    exclude_patterns: &["*_test.cpp", "*_test.cc", "*_test.h"],
    exclude_dirs: &[
        "build",
        "cmake-build-debug",
        "cmake-build-release",
        "test",
        "tests",
    ],
};

static RUBY: LanguageProfile = LanguageProfile {
    name: "ruby",
    extensions: &[".rb"],
    priority_dirs: &[
        "app/controllers",
        "app/models",
        "app/services",
        "lib",
        "app",
    ],
    exclude_patterns: &["*_spec.rb", "*_test.rb"],
    exclude_dirs: &["spec", "test", "vendor"],
};

static RUST: LanguageProfile = LanguageProfile {
    name: "rust",
    extensions: &[".rs"],
    priority_dirs: &["src"],
    exclude_patterns: &["*_test.rs"],
    exclude_dirs: &["target", "tests"],
};

static GO: LanguageProfile = LanguageProfile {
    name: "go",
    extensions: &[".go"],
    priority_dirs: &["cmd", "internal", "pkg", "."],
    exclude_patterns: &["*_test.go"],
    exclude_dirs: &["vendor", "testdata"],
};

static PYTHON: LanguageProfile = LanguageProfile {
    name: "python",
    extensions: &[".py"],
    priority_dirs: &["src", "app", "lib", "."],
    exclude_patterns: &["test_*.py", "*_test.py", "conftest.py"],
    exclude_dirs: &[
        "tests",
        "test",
        "__pycache__",
        ".venv",
        "venv",
        ".pytest_cache",
    ],
};

/// Manifest files that reveal a project's language.
const PROJECT_MARKERS: &[(&str, Language)] = &[
    ("pom.xml", Language::Java),
    ("build.gradle", Language::Java),
    ("package.json", Language::Typescript),
    ("Cargo.toml", Language::Rust),
    ("Gemfile", Language::Ruby),
    ("go.mod", Language::Go),
    ("CMakeLists.txt", Language::Cpp),
    ("requirements.txt", Language::Python),
    ("pyproject.toml", Language::Python),
];

/// Sub-projects (typically a web frontend) are often kept in one of these.
const NESTED_PROJECT_DIRS: &[&str] = &["frontend", "client", "web", "app", "ui"];

/// Never descended into, whatever the language.
const ALWAYS_SKIPPED_DIRS: &[&str] = &[".git"];

/// Extra exclusions layered on top of the built-in profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Use these languages instead of detecting them.
    pub languages: Option<Vec<Language>>,
    pub exclude_patterns: Vec<String>,
    pub exclude_dirs: Vec<String>,
}

/// A discovered source file and the language profile that selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
}

/// Languages used by the project at `root`, in [`Language::ALL`] order.
///
/// Manifest files at the root and in common sub-project directories decide first; without any,
/// a language counts if at least one file with its extension exists anywhere below `root`.
pub fn detect_languages(root: &Path) -> Vec<Language> {
    let mut detected: HashSet<Language> = HashSet::new();
    let candidates =
        std::iter::once(root.to_path_buf()).chain(NESTED_PROJECT_DIRS.iter().map(|d| root.join(d)));
    for dir in candidates {
        if !dir.is_dir() {
            continue;
        }
        for (marker, language) in PROJECT_MARKERS {
            if dir.join(marker).exists() {
                debug!(marker, dir = %dir.display(), %language, "Found project marker");
                detected.insert(*language);
            }
        }
    }

    if detected.is_empty() {
        debug!(root = %root.display(), "No project markers, scanning for source extensions");
        for language in Language::ALL {
            if has_file_with_extension(root, language.profile().extensions) {
                detected.insert(language);
            }
        }
    }

    let languages: Vec<Language> = Language::ALL
        .into_iter()
        .filter(|language| detected.contains(language))
        .collect();
    info!(root = %root.display(), ?languages, "Detected project languages");
    languages
}

/// Source files for `languages` below `root`, deduplicated, in listing order.
pub fn collect_source_files(
    root: &Path,
    languages: &[Language],
    extra: &DiscoveryConfig,
) -> Result<Vec<SourceFile>, CollectError> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    for language in languages {
        let rules = ExcludeRules::for_profile(language.profile(), extra)?;
        for priority_dir in language.profile().priority_dirs {
            for dir in resolve_priority_dir(root, priority_dir, &rules) {
                for extension in language.profile().extensions {
                    for path in files_with_extension(&dir, extension, &rules) {
                        if rules.excludes(root, &path) || !seen.insert(path.clone()) {
                            continue;
                        }
                        files.push(SourceFile {
                            path,
                            language: *language,
                        });
                    }
                }
            }
        }
        debug!(%language, total = files.len(), "Collected source files for language");
    }

    info!(root = %root.display(), files = files.len(), "Collected source files");
    Ok(files)
}

/// Compiled exclusion rules for one language profile.
struct ExcludeRules {
    patterns: Vec<Regex>,
    dirs: Vec<String>,
}

impl ExcludeRules {
    fn for_profile(
        profile: &LanguageProfile,
        extra: &DiscoveryConfig,
    ) -> Result<Self, CollectError> {
        let patterns = profile
            .exclude_patterns
            .iter()
            .map(|p| p.to_string())
            .chain(extra.exclude_patterns.iter().cloned())
            .map(|pattern| {
                Regex::new(&glob_to_regex(&pattern))
                    .map_err(|source| CollectError::Pattern { pattern, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let dirs = profile
            .exclude_dirs
            .iter()
            .chain(ALWAYS_SKIPPED_DIRS)
            .map(|d| d.to_string())
            .chain(extra.exclude_dirs.iter().cloned())
            .collect();
        Ok(Self { patterns, dirs })
    }

    fn is_excluded_dir_name(&self, name: &str) -> bool {
        self.dirs.iter().any(|dir| dir == name)
    }

    /// Excluded if any directory between `root` and the file is excluded, or the file name
    /// matches an exclude pattern.
    fn excludes(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        if let Some(parent) = relative.parent() {
            let hit = parent
                .components()
                .any(|c| self.is_excluded_dir_name(&c.as_os_str().to_string_lossy()));
            if hit {
                return true;
            }
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.patterns.iter().any(|p| p.is_match(&file_name))
    }
}

/// Translate a shell glob (`*`, `?`, `[...]`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    class.push(inner);
                }
                if closed {
                    out.push('[');
                    if let Some(negated) = class.strip_prefix('!') {
                        out.push('^');
                        out.push_str(&negated.replace('\\', "\\\\"));
                    } else {
                        out.push_str(&class.replace('\\', "\\\\"));
                    }
                    out.push(']');
                } else {
                    out.push_str(&regex::escape(&format!("[{class}")));
                }
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}

/// Directories selected by one priority entry, sorted.
fn resolve_priority_dir(root: &Path, priority_dir: &str, rules: &ExcludeRules) -> Vec<PathBuf> {
    match priority_dir.split_once("**") {
        Some((base, suffix)) => {
            let base = root.join(base.trim_end_matches('/'));
            let suffix = suffix.trim_start_matches('/');
            if !base.is_dir() {
                return Vec::new();
            }
            let mut dirs: Vec<PathBuf> = walk(&base, rules)
                .filter(|entry| entry.depth() > 0 && entry.file_type().is_dir())
                .filter(|entry| entry.file_name().to_string_lossy().ends_with(suffix))
                .map(DirEntry::into_path)
                .collect();
            dirs.sort();
            dirs
        }
        None => {
            let dir = match priority_dir {
                "." => root.to_path_buf(),
                nested => root.join(nested),
            };
            if dir.is_dir() {
                vec![dir]
            } else {
                Vec::new()
            }
        }
    }
}

/// Files below `dir` whose name ends with `extension`, sorted by path.
fn files_with_extension(dir: &Path, extension: &str, rules: &ExcludeRules) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walk(dir, rules)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(extension))
        .map(DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Recursive walk that prunes excluded directories below `dir`.
fn walk<'a>(dir: &Path, rules: &'a ExcludeRules) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(dir)
        .into_iter()
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !(entry.file_type().is_dir()
                    && rules.is_excluded_dir_name(&entry.file_name().to_string_lossy()))
        })
        .filter_map(|entry| entry.ok())
}

fn has_file_with_extension(root: &Path, extensions: &[&str]) -> bool {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            entry.depth() == 0 || !ALWAYS_SKIPPED_DIRS.iter().any(|dir| *dir == name)
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .any(|entry| {
            let name = entry.file_name().to_string_lossy();
            extensions.iter().any(|ext| name.ends_with(ext))
        })
}
