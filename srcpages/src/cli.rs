//! Command-line interface for srcpages.
//!
//! All pagination and rendering logic lives in `srcpages-core`; this module parses arguments,
//! merges them over the optional YAML config and prints a short report to stdout. Logs go to
//! stderr so the report can be piped.
//!
//! Precedence for every setting: command-line flag, then config file, then built-in default.
use crate::load_config::{load_config, CliConfig};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use srcpages_core::config::PageTarget;
use srcpages_core::pipeline::{
    generate, inspect, GenerateReport, GenerateRequest, InspectReport, ListingRequest,
};
use srcpages_core::render::PdfRenderer;
use srcpages_core::source::FsSourceReader;
use std::path::PathBuf;

/// Output directory used when neither the flag nor the config names one, relative to the root.
pub const DEFAULT_OUTPUT_DIR: &str = "docs/source-listing";

#[derive(Parser)]
#[clap(
    name = "srcpages",
    version,
    about = "Print a project's source code as a PDF listing that fits a page budget"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect, paginate and render the project's sources to PDF
    Generate {
        #[clap(flatten)]
        listing: ListingArgs,
        /// Directory for the generated PDF [default: <root>/docs/source-listing]
        #[clap(long)]
        output_dir: Option<PathBuf>,
    },
    /// Report what would be printed without rendering anything
    Inspect {
        #[clap(flatten)]
        listing: ListingArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListingArgs {
    /// Project root directory [default: .]
    #[clap(long)]
    pub root: Option<PathBuf>,
    /// Software name printed in the page header; detected from the project when omitted
    #[clap(long)]
    pub name: Option<String>,
    /// Version printed in the page header, e.g. 1.0 or V1.0
    #[clap(long = "project-version", short = 'v')]
    pub project_version: Option<String>,
    /// Page target: a page count, or "auto" to keep front and back halves of long listings
    #[clap(long)]
    pub pages: Option<PageTarget>,
    /// Optional YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// Entry point shared by `main` and the integration tests.
pub fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Generate {
            listing,
            output_dir,
        } => {
            let config = config_for(&listing)?;
            let request = listing_request(&listing, &config);
            let output_dir = output_dir
                .or_else(|| config.output_dir.clone())
                .unwrap_or_else(|| request.root.join(DEFAULT_OUTPUT_DIR));
            tracing::info!(command = "generate", root = %request.root.display(), "Starting generation");

            let renderer = PdfRenderer::new(
                config.layout.clone(),
                config.page.clone(),
                config.labels.clone(),
            );
            let request = GenerateRequest {
                listing: request,
                output_dir,
            };
            match generate(&request, &FsSourceReader, &renderer) {
                Ok(report) => {
                    tracing::info!(command = "generate", output = %report.output.display(), "Generation complete");
                    print_generate_report(&report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "generate", error = %e, "Generation failed");
                    Err(e.into())
                }
            }
        }
        Commands::Inspect { listing } => {
            let config = config_for(&listing)?;
            let request = listing_request(&listing, &config);
            tracing::info!(command = "inspect", root = %request.root.display(), "Starting inspection");
            match inspect(&request, &FsSourceReader) {
                Ok(report) => {
                    print_listing_report(&report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "inspect", error = %e, "Inspection failed");
                    Err(e.into())
                }
            }
        }
    }
}

fn config_for(args: &ListingArgs) -> Result<CliConfig> {
    match &args.config {
        Some(path) => load_config(path),
        None => Ok(CliConfig::default()),
    }
}

/// Merge flags over the config file.
pub fn listing_request(args: &ListingArgs, config: &CliConfig) -> ListingRequest {
    let root = args
        .root
        .clone()
        .or_else(|| config.project.root.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    ListingRequest {
        root,
        name: args.name.clone().or_else(|| config.project.name.clone()),
        version: args
            .project_version
            .clone()
            .or_else(|| config.project.version.clone()),
        target: args.pages.or(config.pages).unwrap_or_default(),
        layout: config.layout.clone(),
        discovery: config.discovery.clone(),
    }
}

fn print_listing_report(report: &InspectReport) {
    let languages: Vec<&str> = report.languages.iter().map(|l| l.name()).collect();
    println!(
        "Project:   {} {}",
        report.name.as_deref().unwrap_or("(unknown)"),
        report.version
    );
    println!("Languages: {}", languages.join(", "));
    println!("Files:     {} ({} with content)", report.files, report.units);
    println!("Target:    {}", report.target);
    println!(
        "Printed:   {} lines, {} rendered rows, {} pages",
        report.printed_lines, report.printed_cost, report.printed_pages
    );
    match &report.split {
        Some(split) => println!(
            "Split:     {} of {} pages omitted ({} front lines, {} back lines)",
            split.omitted_pages, split.total_pages, split.front_lines, split.back_lines
        ),
        None => println!("Split:     no"),
    }
    if !report.skipped.is_empty() {
        println!("Skipped:   {}", report.skipped.len());
        for skipped in &report.skipped {
            println!("  {}: {}", skipped.path.display(), skipped.reason);
        }
    }
}

fn print_generate_report(report: &GenerateReport) {
    print_listing_report(&report.listing);
    println!(
        "Rendered:  {} pages, {} rows",
        report.rendered.pages, report.rendered.rows
    );
    println!("Output:    {}", report.output.display());
}
