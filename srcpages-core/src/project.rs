//! Project name and version detection from files commonly found at a project root.
//!
//! Sources are tried in order and the first one that yields a name wins:
//! `.claude/CLAUDE.md` / `CLAUDE.md` (first `# Heading`), `package.json`, `pom.xml`,
//! `Cargo.toml`. Versions are normalised to a `V` prefix and default to [`DEFAULT_VERSION`].

use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

pub const DEFAULT_VERSION: &str = "V1.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: Option<String>,
    pub version: String,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: None,
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

pub fn read_project_info(root: &Path) -> ProjectInfo {
    let mut name = None;
    let mut version = None;

    for notes in [root.join(".claude").join("CLAUDE.md"), root.join("CLAUDE.md")] {
        let Some(content) = read_optional(&notes) else {
            continue;
        };
        if let Some(found) = capture(r"(?m)^#\s+(.+?)(?:\s*[-–—]|$)", &content) {
            name = Some(found.trim().to_string());
        }
        if let Some(found) = capture(r"(?:版本|(?i:version))[：:]\s*[vV]?([0-9.]+)", &content) {
            version = Some(found);
        }
        if name.is_some() {
            debug!(path = %notes.display(), "Project name taken from notes heading");
            break;
        }
    }

    if name.is_none() {
        if let Some((found, found_version)) = from_package_json(root) {
            name = found;
            version = Some(found_version);
        }
    }

    if name.is_none() {
        if let Some((found, found_version)) = from_pom(root) {
            name = found;
            version = found_version.or(version);
        }
    }

    if name.is_none() {
        if let Some((found, found_version)) = from_cargo_manifest(root) {
            name = found;
            version = found_version.or(version);
        }
    }

    let info = ProjectInfo {
        name: name.filter(|n| !n.is_empty()),
        version: version
            .map(|v| normalise_version(&v))
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
    };
    debug!(?info, root = %root.display(), "Read project info");
    info
}

/// `1.2.0`, `v1.2.0` and `V1.2.0` all become `V1.2.0`.
pub fn normalise_version(version: &str) -> String {
    let bare = version.trim().trim_start_matches(['v', 'V']);
    format!("V{bare}")
}

/// Turn a package identifier into a display name: `my-cool_app` → `My Cool App`.
pub fn title_case(identifier: &str) -> String {
    let spaced = identifier.replace(['-', '_'], " ");
    let mut out = String::with_capacity(spaced.len());
    let mut previous_is_letter = false;
    for ch in spaced.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

/// Strip characters that are not allowed in file names on common platforms.
pub fn safe_file_stem(name: &str) -> String {
    name.chars()
        .filter(|ch| !matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect()
}

fn from_package_json(root: &Path) -> Option<(Option<String>, String)> {
    let path = root.join("package.json");
    let content = read_optional(&path)?;
    let manifest: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unparsable package.json");
            return None;
        }
    };
    let name = manifest
        .get("name")
        .and_then(|n| n.as_str())
        .map(title_case)
        .filter(|n| !n.is_empty());
    let version = manifest
        .get("version")
        .and_then(|v| v.as_str())
        .unwrap_or("1.0")
        .to_string();
    Some((name, version))
}

fn from_pom(root: &Path) -> Option<(Option<String>, Option<String>)> {
    let content = read_optional(&root.join("pom.xml"))?;
    // The parent block carries the parent's coordinates, not the project's.
    let own = match Regex::new(r"(?s)<parent>.*?</parent>") {
        Ok(parent) => parent.replace(&content, "").into_owned(),
        Err(_) => content,
    };
    let name = capture(r"<artifactId>([^<]+)</artifactId>", &own).map(|a| title_case(a.trim()));
    let version = capture(r"<version>([^<]+)</version>", &own).map(|v| v.trim().to_string());
    Some((name, version))
}

fn from_cargo_manifest(root: &Path) -> Option<(Option<String>, Option<String>)> {
    let path = root.join("Cargo.toml");
    let content = read_optional(&path)?;
    let manifest: toml::Table = match content.parse() {
        Ok(table) => table,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unparsable Cargo.toml");
            return None;
        }
    };
    let package = manifest.get("package")?.as_table()?;
    let name = package
        .get("name")
        .and_then(|n| n.as_str())
        .map(title_case);
    let version = package
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Some((name, version))
}

fn read_optional(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read project file");
            None
        }
    }
}

fn capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
