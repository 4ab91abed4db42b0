// Copyright 2026 Style Harvest Contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use style_harvest_runtime::config::HarvestConfig;
use style_harvest_runtime::error::FatalError;
use style_harvest_runtime::pipeline::Orchestrator;
use style_harvest_runtime::renderer::chromium::ChromiumRenderer;
use style_harvest_runtime::renderer::Renderer;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "style-harvest",
    about = "Style Harvest — extract design tokens, components and screenshots from a style guide",
    version,
    after_help = "With no options, crawls the built-in style-guide target list into ./extracted-data."
)]
struct Cli {
    /// Style-guide index URL
    #[arg(long)]
    base_url: Option<String>,

    /// Directory for JSON results and screenshots
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Component page slug to visit after the index (repeatable; replaces the built-in list)
    #[arg(long = "page")]
    pages: Vec<String>,

    /// Enable verbose/debug logging
    #[arg(long, short)]
    verbose: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn into_config(self) -> HarvestConfig {
        let mut config = HarvestConfig::default().with_env();
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if !self.pages.is_empty() {
            config.component_pages = self.pages;
        }
        config
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "style_harvest=debug,style_harvest_runtime=debug"
    } else {
        "style_harvest=info,style_harvest_runtime=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(config: HarvestConfig) -> Result<()> {
    let targets = config.targets()?;

    info!(
        "starting style-harvest v{} — {} pages from {}",
        env!("CARGO_PKG_VERSION"),
        targets.len(),
        config.base_url
    );

    let renderer = ChromiumRenderer::launch(&config)
        .await
        .map_err(FatalError::Setup)?;
    let mut context = renderer.new_context().await.map_err(FatalError::Setup)?;

    let orchestrator = Orchestrator::new(config);
    let outcome = orchestrator.run_all(&mut *context, &targets).await;
    let persisted = orchestrator.persist(&outcome);

    if let Err(e) = context.close().await {
        warn!("failed to close page: {e:#}");
    }
    renderer.shutdown().await?;

    let summary = persisted?;
    println!();
    println!("Summary:");
    println!("  - Pages extracted: {}", summary.total_pages);
    println!("  - Unique colors: {}", summary.total_colors);
    println!("  - Total components: {}", summary.total_components);
    println!("  - CSS variables: {}", summary.total_css_variables);
    if !summary.failed_pages.is_empty() {
        println!("  - Failed pages: {}", summary.failed_pages.join(", "));
    }
    if summary.skipped_screenshots > 0 {
        println!("  - Skipped element screenshots: {}", summary.skipped_screenshots);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let result = run(cli.into_config()).await;

    // Consistent exit codes: 0=success (per-page failures included), 1=fatal
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
