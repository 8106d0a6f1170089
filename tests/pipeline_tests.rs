//! End-to-end catalog runs against an in-memory fetcher

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use swatch_scraper::application::CatalogPipeline;
use swatch_scraper::domain::{Catalog, Category, DownloadOutcome, FailureDetails, FailureStage};
use swatch_scraper::infrastructure::{AppConfig, FetchCause, FetchError, Fetcher, ResourceKind};
use tempfile::TempDir;

const SITE: &str = "https://www.emaux-soyer.com";

/// Serves canned bodies and records every request
#[derive(Default)]
struct FakeFetcher {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<(String, ResourceKind)>>,
}

impl FakeFetcher {
    fn with_page(mut self, url: &str, html: &str) -> Self {
        self.responses.insert(url.to_string(), html.as_bytes().to_vec());
        self
    }

    fn with_image(mut self, url: &str, bytes: &[u8]) -> Self {
        self.responses.insert(url.to_string(), bytes.to_vec());
        self
    }

    fn requests_of(&self, kind: ResourceKind) -> usize {
        self.requests.lock().unwrap().iter().filter(|(_, k)| *k == kind).count()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str, kind: ResourceKind) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push((url.to_string(), kind));
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::new(url, FetchCause::Transport("connection refused".to_string())))
    }
}

fn product_page(title: &str, image: &str) -> String {
    format!(
        r#"<html><head><title>{title} | Emaux Soyer</title></head>
        <body>
          <img class="logo" src="/skin/frontend/logo.png">
          <h1>{title}</h1>
          <div class="product-image-main"><img src="{image}"></div>
          <img src="/media/thumbs/other-small.gif">
        </body></html>"#
    )
}

fn config_for(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.output.root_dir = root.to_path_buf();
    config.http.delay_ms = 0;
    config
}

fn url(slug: &str) -> String {
    format!("{SITE}/en/{slug}.html")
}

fn image(name: &str) -> String {
    format!("{SITE}/media/catalog/product/large/{name}")
}

fn sample_fetcher() -> FakeFetcher {
    FakeFetcher::default()
        .with_page(
            &url("bleu-62f-en-poudre"),
            &product_page("Bleu 62F", "/media/catalog/product/large/62f.jpg"),
        )
        .with_image(&image("62f.jpg"), b"jpeg-62f")
        .with_page(
            &url("rose-2004-en-poudre"),
            &product_page("Rose 2004", "//www.emaux-soyer.com/media/catalog/product/large/2004.png"),
        )
        .with_image(&image("2004.png"), b"png-2004")
        .with_page(
            &url("lilas-opale-607-en-poudre"),
            &product_page("Lilas opale 607", "/media/catalog/product/large/607.jpg"),
        )
        .with_image(&image("607.jpg"), b"jpeg-607")
}

fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        url("bleu-62f-en-poudre"),
        url("rose-2004-en-poudre"),
        url("lilas-opale-607-en-poudre"),
    ])
}

fn assert_counts_consistent(report: &swatch_scraper::application::RunReport, catalog: &Catalog) {
    let s = &report.summary;
    assert_eq!(s.total_processed, catalog.len());
    assert_eq!(report.results.len(), catalog.len());
    assert_eq!(s.downloaded + s.failed + s.skipped, s.total_processed);
    assert_eq!(report.by_type.total(), s.downloaded);
}

#[tokio::test]
async fn test_run_downloads_into_category_directories() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(sample_fetcher());
    let pipeline = CatalogPipeline::new(fetcher.clone(), &config_for(dir.path())).unwrap();
    let catalog = sample_catalog();

    let report = pipeline.run(&catalog).await.unwrap();

    assert_counts_consistent(&report, &catalog);
    assert_eq!(report.summary.downloaded, 3);
    assert_eq!(report.by_type.opaque, 1);
    assert_eq!(report.by_type.transparent, 1);
    assert_eq!(report.by_type.opal, 1);

    let root = dir.path();
    assert_eq!(std::fs::read(root.join("opaques/62F_hq.jpg")).unwrap(), b"jpeg-62f");
    assert_eq!(std::fs::read(root.join("transparent_colors/2004_hq.png")).unwrap(), b"png-2004");
    assert_eq!(std::fs::read(root.join("opale_colors/607_hq.jpg")).unwrap(), b"jpeg-607");
    assert!(root.join("samples").is_dir());
    assert_eq!(fetcher.requests_of(ResourceKind::Image), 3);
}

#[tokio::test]
async fn test_second_run_fetches_no_images() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    let catalog = sample_catalog();

    let first_fetcher = Arc::new(sample_fetcher());
    let first = CatalogPipeline::new(first_fetcher.clone(), &config)
        .unwrap()
        .run(&catalog)
        .await
        .unwrap();

    let second_fetcher = Arc::new(sample_fetcher());
    let second = CatalogPipeline::new(second_fetcher.clone(), &config)
        .unwrap()
        .run(&catalog)
        .await
        .unwrap();

    assert_eq!(second_fetcher.requests_of(ResourceKind::Image), 0);
    assert_eq!(second_fetcher.requests_of(ResourceKind::Page), catalog.len());
    assert_eq!(second.summary.skipped, 3);
    assert_eq!(second.summary.downloaded, 0);
    assert_eq!(second.summary.successful, first.summary.successful);
    assert!(second.results.iter().all(|outcome| matches!(
        outcome,
        DownloadOutcome::Skipped { reason, .. } if reason == DownloadOutcome::ALREADY_PRESENT
    )));
    assert_eq!(std::fs::read(dir.path().join("opaques/62F_hq.jpg")).unwrap(), b"jpeg-62f");
}

#[tokio::test]
async fn test_unreachable_page_fails_and_run_continues() {
    let dir = TempDir::new().unwrap();
    let fetcher = sample_fetcher();
    let catalog = Catalog::new(vec![
        "https://unreachable.invalid/en/noir-36-en-poudre.html".to_string(),
        url("bleu-62f-en-poudre"),
    ]);

    let report = CatalogPipeline::new(fetcher, &config_for(dir.path()))
        .unwrap()
        .run(&catalog)
        .await
        .unwrap();

    assert_counts_consistent(&report, &catalog);
    match &report.results[0] {
        DownloadOutcome::Failed { stage, reason, .. } => {
            assert_eq!(*stage, FailureStage::Fetch);
            assert!(!reason.is_empty());
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(matches!(report.results[1], DownloadOutcome::Downloaded { .. }));
}

#[tokio::test]
async fn test_classification_and_selection_failures() {
    let dir = TempDir::new().unwrap();
    let no_code = url("contre-email-en-poudre");
    let no_image = url("gris-304-en-poudre");
    let fetcher = FakeFetcher::default()
        .with_page(&no_code, &product_page("Contre email", "/media/catalog/product/large/ce.jpg"))
        .with_page(&no_image, "<html><h1>Gris 304</h1><img src=\"/skin/logo.png\"></html>");
    let catalog = Catalog::new(vec![no_code, no_image]);

    let report = CatalogPipeline::new(fetcher, &config_for(dir.path()))
        .unwrap()
        .run(&catalog)
        .await
        .unwrap();

    assert_counts_consistent(&report, &catalog);
    let stages: Vec<_> = report
        .results
        .iter()
        .map(|outcome| match outcome {
            DownloadOutcome::Failed { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(stages, vec![Some(FailureStage::Classification), Some(FailureStage::Selection)]);
    assert_eq!(report.summary.success_rate, 0.0);
}

#[tokio::test]
async fn test_image_download_failure_is_recorded() {
    let dir = TempDir::new().unwrap();
    let page = url("vert-10-en-poudre");
    let fetcher = FakeFetcher::default().with_page(&page, &product_page("Vert 10", "/media/catalog/product/large/10.jpg"));
    let catalog = Catalog::new(vec![page]);

    let report = CatalogPipeline::new(fetcher, &config_for(dir.path()))
        .unwrap()
        .run(&catalog)
        .await
        .unwrap();

    match &report.results[0] {
        DownloadOutcome::Failed { stage, details, .. } => {
            assert_eq!(*stage, FailureStage::Download);
            assert_eq!(details.title.as_deref(), Some("Vert 10"));
            assert_eq!(details.color_code.as_deref(), Some("10"));
            assert_eq!(details.category, Some(Category::Opaque));
            assert_eq!(details.image_url.as_deref(), Some(image("10.jpg").as_str()));
        }
        other => panic!("expected download failure, got {other:?}"),
    }
    assert!(!dir.path().join("opaques/10_hq.jpg").exists());

    let content = std::fs::read_to_string(dir.path().join("download_report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["results"][0]["image_url"], image("10.jpg"));
    assert_eq!(value["results"][0]["title"], "Vert 10");
}

#[tokio::test]
async fn test_fetch_failure_carries_no_details() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::new(vec![url("noir-36-en-poudre")]);

    let report = CatalogPipeline::new(FakeFetcher::default(), &config_for(dir.path()))
        .unwrap()
        .run(&catalog)
        .await
        .unwrap();

    match &report.results[0] {
        DownloadOutcome::Failed { stage, details, .. } => {
            assert_eq!(*stage, FailureStage::Fetch);
            assert_eq!(*details, FailureDetails::default());
        }
        other => panic!("expected fetch failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_duplicate_entries_each_get_an_outcome() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::new(vec![url("bleu-62f-en-poudre"), url("bleu-62f-en-poudre")]);

    let report = CatalogPipeline::new(sample_fetcher(), &config_for(dir.path()))
        .unwrap()
        .run(&catalog)
        .await
        .unwrap();

    assert_counts_consistent(&report, &catalog);
    assert_eq!(report.summary.downloaded, 1);
    assert_eq!(report.summary.skipped, 1);
}

#[tokio::test]
async fn test_unknown_default_routes_to_unclassified_directory() {
    let dir = TempDir::new().unwrap();
    let page = url("bleu-62f-en-poudre");
    let mut config = config_for(dir.path());
    config.classification.default_category = Category::Unknown;

    let report = CatalogPipeline::new(sample_fetcher(), &config)
        .unwrap()
        .run(&Catalog::new(vec![page]))
        .await
        .unwrap();

    assert_eq!(report.by_type.unknown, 1);
    assert!(dir.path().join("samples/62F_hq.jpg").exists());
}

#[tokio::test]
async fn test_report_file_matches_returned_report() {
    let dir = TempDir::new().unwrap();
    let catalog = sample_catalog();

    let report = CatalogPipeline::new(sample_fetcher(), &config_for(dir.path()))
        .unwrap()
        .run(&catalog)
        .await
        .unwrap();

    let content = std::fs::read_to_string(dir.path().join("download_report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["summary"]["total_processed"], 3);
    assert_eq!(value["summary"]["successful"], 3);
    assert_eq!(value["by_type"]["opal"], 1);
    assert_eq!(value["results"][0]["status"], "downloaded");
    assert_eq!(value["results"][0]["color_code"], "62F");
    assert_eq!(value["results"][0]["category"], "opaque");
    assert_eq!(value["results"].as_array().unwrap().len(), report.results.len());
}

#[tokio::test]
async fn test_empty_catalog_still_writes_report() {
    let dir = TempDir::new().unwrap();
    let report = CatalogPipeline::new(FakeFetcher::default(), &config_for(dir.path()))
        .unwrap()
        .run(&Catalog::default())
        .await
        .unwrap();

    assert_eq!(report.summary.total_processed, 0);
    assert_eq!(report.summary.success_rate, 0.0);
    assert!(dir.path().join("download_report.json").exists());
}

#[tokio::test]
async fn test_uncreatable_output_root_aborts() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let result = CatalogPipeline::new(sample_fetcher(), &config_for(&blocker))
        .unwrap()
        .run(&sample_catalog())
        .await;

    assert!(result.is_err());
}
