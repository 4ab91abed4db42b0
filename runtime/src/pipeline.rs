// Copyright 2026 Style Harvest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capture orchestrator: navigate, extract, screenshot, throttle, repeat.
//!
//! Targets are processed strictly one after another on a single exclusively
//! borrowed `RenderContext`. A failing page is logged and skipped; only
//! persistence can fail the run from here.

use std::time::Instant;

use serde::Serialize;
use style_harvest::{AggregateResult, Extractor, OutputLayout, Summary};
use tracing::{error, info, warn};

use crate::capture::{capture_page, CaptureReport};
use crate::config::{HarvestConfig, PageTarget};
use crate::error::FatalError;
use crate::extraction::collect_snapshot;
use crate::renderer::RenderContext;
use crate::throttle::Throttle;

/// How one target went.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub key: String,
    pub url: String,
    pub navigated: bool,
    pub extracted: bool,
    pub capture: CaptureReport,
    pub elapsed_ms: u64,
}

/// Everything a run produced, before persistence.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub aggregate: AggregateResult,
    pub reports: Vec<PageReport>,
}

impl RunOutcome {
    /// Summary counts plus the run's failures and skipped screenshots.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::from_aggregate(&self.aggregate);
        summary.failed_pages = self
            .reports
            .iter()
            .filter(|r| !r.extracted)
            .map(|r| r.key.clone())
            .collect();
        summary.skipped_screenshots = self.reports.iter().map(|r| r.capture.skipped).sum();
        summary
    }
}

/// Sequences the per-page pipeline across all targets.
pub struct Orchestrator {
    config: HarvestConfig,
    extractor: Extractor,
    layout: OutputLayout,
}

impl Orchestrator {
    pub fn new(config: HarvestConfig) -> Self {
        let layout = OutputLayout::new(&config.output_dir);
        Self {
            config,
            extractor: Extractor::default(),
            layout,
        }
    }

    /// Replace the default extractor, e.g. to add component matchers.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Visit every target in order and collect what could be collected.
    pub async fn run_all(
        &self,
        context: &mut dyn RenderContext,
        targets: &[PageTarget],
    ) -> RunOutcome {
        let mut aggregate = AggregateResult::new(&self.config.base_url);
        let mut reports = Vec::with_capacity(targets.len());
        let mut throttle = Throttle::new(self.config.politeness_delay);

        for (i, target) in targets.iter().enumerate() {
            throttle.acquire().await;
            info!(
                page = %target.key,
                "[{}/{}] visiting {}",
                i + 1,
                targets.len(),
                target.url
            );
            let report = self.visit(context, target, &mut aggregate).await;
            reports.push(report);
        }

        RunOutcome { aggregate, reports }
    }

    async fn visit(
        &self,
        context: &mut dyn RenderContext,
        target: &PageTarget,
        aggregate: &mut AggregateResult,
    ) -> PageReport {
        let start = Instant::now();
        let mut report = PageReport {
            key: target.key.clone(),
            url: target.url.clone(),
            navigated: false,
            extracted: false,
            capture: CaptureReport::default(),
            elapsed_ms: 0,
        };

        match context.navigate(&target.url, &self.config.wait).await {
            Ok(nav) => {
                report.navigated = true;
                info!(
                    page = %target.key,
                    load_ms = nav.load_time_ms,
                    peak_inflight = nav.peak_inflight,
                    "loaded {}",
                    nav.final_url
                );
            }
            Err(e) => {
                warn!(page = %target.key, retryable = e.is_retryable(), "skipping page: {e}");
                report.elapsed_ms = start.elapsed().as_millis() as u64;
                return report;
            }
        }

        match collect_snapshot(&*context, &target.url).await {
            Ok(snapshot) => {
                let record = self.extractor.extract(&snapshot);
                info!(
                    page = %target.key,
                    colors = record.colors.len(),
                    typography = record.typography.len(),
                    spacing = record.spacing.len(),
                    components = record.components.len(),
                    css_variables = record.css_variables.len(),
                    css_rules = record.raw_styles.len(),
                    "extracted"
                );
                match aggregate.insert(target.key.clone(), record) {
                    Ok(()) => report.extracted = true,
                    Err(e) => error!(page = %target.key, "{e}"),
                }
            }
            Err(e) => error!(page = %target.key, "{e}"),
        }

        report.capture = capture_page(
            &*context,
            &self.layout,
            &target.key,
            &self.config.component_selector,
            self.config.max_component_shots,
        )
        .await;
        info!(
            page = %target.key,
            full_page = report.capture.full_page,
            saved = report.capture.saved,
            skipped = report.capture.skipped,
            "screenshots saved to {}",
            self.layout.screenshot_dir(&target.key).display()
        );

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        report
    }

    /// Write the aggregate and the summary. Either failing is fatal.
    pub fn persist(&self, outcome: &RunOutcome) -> Result<Summary, FatalError> {
        let summary = outcome.summary();
        let data = self.layout.write_aggregate(&outcome.aggregate)?;
        info!("data saved to {}", data.display());
        let summary_path = self.layout.write_summary(&summary)?;
        info!("summary saved to {}", summary_path.display());
        Ok(summary)
    }
}
