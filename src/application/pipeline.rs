//! Catalog pipeline
//!
//! Walks the catalog strictly in order, one entry at a time:
//! fetch page, classify, select image, check destination, download.
//! Per-entry failures become `Failed` outcomes and the run carries on;
//! only setup problems and the final report write abort it.

#![allow(clippy::uninlined_format_args)]

use super::error::ScrapeError;
use super::report::RunReport;
use crate::domain::{Catalog, Classifier, DownloadOutcome, FailureDetails};
use crate::infrastructure::{
    AppConfig, Downloader, Fetcher, OutputLayout, ProductPageParser, SaveStatus,
};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sequential scraper over a catalog
pub struct CatalogPipeline<F: Fetcher> {
    fetcher: F,
    parser: ProductPageParser,
    classifier: Classifier,
    downloader: Downloader,
    delay: Duration,
    flush_each_entry: bool,
}

impl<F: Fetcher> CatalogPipeline<F> {
    pub fn new(fetcher: F, config: &AppConfig) -> Result<Self> {
        let classifier = Classifier::new(&config.classification).context("Invalid classification rules")?;
        let parser = ProductPageParser::with_config(&config.image)
            .context("Invalid image selector configuration")?
            .with_text_capture(classifier.includes_page_text());

        Ok(Self {
            fetcher,
            parser,
            classifier,
            downloader: Downloader::new(OutputLayout::from_config(&config.output)),
            delay: config.http.delay(),
            flush_each_entry: config.output.flush_report_each_entry,
        })
    }

    pub fn layout(&self) -> &OutputLayout {
        self.downloader.layout()
    }

    /// Process every catalog entry and write the final report
    pub async fn run(&self, catalog: &Catalog) -> Result<RunReport> {
        let layout = self.layout();
        layout
            .ensure_directories()
            .await
            .with_context(|| format!("Failed to create output directories under {:?}", layout.root()))?;

        let total = catalog.len();
        let mut report = RunReport::new();
        info!("Starting download of {} product images", total);

        for (index, url) in catalog.iter().enumerate() {
            let position = index + 1;
            info!("--- Processing {}/{}: {} ---", position, total, url);

            let outcome = self.process_entry(url).await;
            report.record(outcome);

            if self.flush_each_entry {
                if let Err(e) = report.write_to(layout.report_path()).await {
                    warn!("Failed to flush report after entry {}: {:#}", position, e);
                }
            }

            if position < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        report
            .write_to(layout.report_path())
            .await
            .context("Failed to write final report")?;

        info!(
            "Run finished: {} downloaded, {} already present, {} failed",
            report.summary.downloaded, report.summary.skipped, report.summary.failed
        );
        Ok(report)
    }

    /// Run one entry to its terminal outcome
    pub async fn process_entry(&self, url: &str) -> DownloadOutcome {
        let mut details = FailureDetails::default();
        match self.try_process_entry(url, &mut details).await {
            Ok(outcome) => outcome,
            Err(error) => {
                let stage = error.stage();
                warn!("Failed at {} stage: {}", stage, error);
                DownloadOutcome::Failed {
                    url: url.to_string(),
                    stage,
                    reason: error.to_string(),
                    details,
                }
            }
        }
    }

    /// Fill `details` as each stage learns something, so a failure keeps it
    async fn try_process_entry(
        &self,
        url: &str,
        details: &mut FailureDetails,
    ) -> Result<DownloadOutcome, ScrapeError> {
        let body = self.fetcher.fetch_page(url).await.map_err(ScrapeError::Fetch)?;

        // The parsed document never outlives this statement
        let page = self.parser.parse_page(&body, url);
        drop(body);

        let title = page.title.unwrap_or_default();
        if !title.is_empty() {
            details.title = Some(title.clone());
        }
        let classification = self.classifier.classify_with_text(url, &title, page.text.as_deref());
        let category = classification.category;
        details.category = Some(category);
        let color_code = classification.color_code.ok_or(ScrapeError::Unclassifiable)?;
        details.color_code = Some(color_code.clone());
        debug!("Classified {} as {} ({})", url, color_code, category);

        let image = page.image?;
        details.image_url = Some(image.url.clone());
        info!("Downloading image for color {} ({})", color_code, category);

        let saved = self
            .downloader
            .download(&self.fetcher, &image.url, &color_code, category)
            .await?;
        let file_path = saved.path.display().to_string();

        Ok(match saved.status {
            SaveStatus::AlreadyPresent => {
                warn!("Skipped, already present: {}", file_path);
                DownloadOutcome::Skipped {
                    url: url.to_string(),
                    reason: DownloadOutcome::ALREADY_PRESENT.to_string(),
                    color_code,
                    category,
                    file_path,
                    image_url: image.url,
                }
            }
            SaveStatus::Written { byte_size } => {
                info!("Successfully downloaded: {}", file_path);
                DownloadOutcome::Downloaded {
                    url: url.to_string(),
                    title,
                    color_code,
                    category,
                    file_path,
                    image_url: image.url,
                    byte_size,
                }
            }
        })
    }
}
