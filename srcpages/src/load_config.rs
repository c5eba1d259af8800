/// `load_config` module: reads the optional YAML file that carries project defaults, layout
/// tuning and label templates for the CLI.
///
/// Every section is optional and every field inside a section falls back to its default, so a
/// file only needs to mention what it changes. Command-line flags take precedence over the
/// values loaded here (see [`crate::cli`]).
///
/// # Errors
/// Failures are `anyhow::Error`s with the file path in the message, surfaced at the CLI boundary.
use anyhow::{Context, Result};
use serde::Deserialize;
use srcpages_core::collect::DiscoveryConfig;
use srcpages_core::config::{Labels, LayoutConfig, PageSetup, PageTarget};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub project: ProjectSection,
    pub pages: Option<PageTarget>,
    pub output_dir: Option<PathBuf>,
    pub discovery: DiscoveryConfig,
    pub layout: LayoutConfig,
    pub page: PageSetup,
    pub labels: Labels,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSection {
    pub root: Option<PathBuf>,
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Loads a YAML config file and validates its layout section.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config
        .layout
        .validate()
        .with_context(|| format!("Invalid layout section in {}", path_ref.display()))?;
    config.layout.trace_loaded();

    info!(
        pages = ?config.pages,
        languages = ?config.discovery.languages,
        "Config loaded successfully"
    );
    Ok(config)
}
