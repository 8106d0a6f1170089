//! Output layout and image downloads
//!
//! Images land in one directory per category as `<CODE>_hq<ext>`. Existing
//! files are never overwritten, and new ones are written to a `.part` sibling
//! first so an interrupted write never looks like a finished download.

#![allow(clippy::uninlined_format_args)]

use crate::domain::Category;
use crate::infrastructure::config::OutputConfig;
use crate::infrastructure::http_client::{FetchError, Fetcher, ResourceKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

const DEFAULT_EXTENSION: &str = ".jpg";
const PART_SUFFIX: &str = ".part";

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolved output paths
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    transparent: PathBuf,
    opaque: PathBuf,
    opal: PathBuf,
    unclassified: PathBuf,
    report: PathBuf,
}

impl OutputLayout {
    pub fn from_config(config: &OutputConfig) -> Self {
        let root = config.root_dir.clone();
        Self {
            transparent: root.join(&config.transparent_dir),
            opaque: root.join(&config.opaque_dir),
            opal: root.join(&config.opal_dir),
            unclassified: root.join(&config.unclassified_dir),
            report: root.join(&config.report_file),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: Category) -> &Path {
        match category {
            Category::Transparent => &self.transparent,
            Category::Opaque => &self.opaque,
            Category::Opal => &self.opal,
            Category::Unknown => &self.unclassified,
        }
    }

    pub fn report_path(&self) -> &Path {
        &self.report
    }

    /// Create every category directory (and the root)
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        for category in Category::ALL {
            let dir = self.category_dir(category);
            tokio::fs::create_dir_all(dir).await?;
            debug!("Output directory ready: {}", dir.display());
        }
        Ok(())
    }

    /// `<category_dir>/<CODE>_hq<ext>`
    pub fn destination(&self, color_code: &str, category: Category, image_url: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}_hq{}", color_code, image_extension(image_url)))
    }
}

/// Extension of the image URL's path (with the dot), `.jpg` when absent
pub fn image_extension(image_url: &str) -> String {
    let path = match Url::parse(image_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => image_url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let file_name = path.rsplit('/').next().unwrap_or_default();
    match Path::new(file_name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!(".{}", ext),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// What happened at the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    AlreadyPresent,
    Written { byte_size: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub path: PathBuf,
    pub status: SaveStatus,
}

/// Fetches chosen images into the output layout
#[derive(Debug, Clone)]
pub struct Downloader {
    layout: OutputLayout,
}

impl Downloader {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Download `image_url` unless its destination already exists
    pub async fn download<F: Fetcher + ?Sized>(
        &self,
        fetcher: &F,
        image_url: &str,
        color_code: &str,
        category: Category,
    ) -> Result<SavedImage, DownloadError> {
        let path = self.layout.destination(color_code, category, image_url);

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| DownloadError::Write {
                path: path.clone(),
                source,
            })?;
        if exists {
            debug!("Destination exists, skipping fetch: {}", path.display());
            return Ok(SavedImage {
                path,
                status: SaveStatus::AlreadyPresent,
            });
        }

        let bytes = fetcher.fetch(image_url, ResourceKind::Image).await?;
        write_atomically(&path, &bytes).await?;

        let byte_size = bytes.len() as u64;
        info!("Saved {} ({} bytes)", path.display(), byte_size);
        Ok(SavedImage {
            path,
            status: SaveStatus::Written { byte_size },
        })
    }
}

fn part_path(destination: &Path) -> PathBuf {
    let mut part = destination.as_os_str().to_owned();
    part.push(PART_SUFFIX);
    PathBuf::from(part)
}

async fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    let part = part_path(destination);
    let write_error = |source| DownloadError::Write {
        path: destination.to_path_buf(),
        source,
    };

    if let Err(e) = tokio::fs::write(&part, bytes).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(write_error(e));
    }
    if let Err(e) = tokio::fs::rename(&part, destination).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(write_error(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::FetchCause;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher {
        body: Option<Vec<u8>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str, _kind: ResourceKind) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body
                .clone()
                .ok_or_else(|| FetchError::new(url, FetchCause::Status(404)))
        }
    }

    fn layout(root: &Path) -> OutputLayout {
        OutputLayout::from_config(&OutputConfig {
            root_dir: root.to_path_buf(),
            ..Default::default()
        })
    }

    #[rstest]
    #[case("https://x.test/media/62f.png", ".png")]
    #[case("https://x.test/media/62f.jpeg?v=2", ".jpeg")]
    #[case("https://x.test/media/62f", ".jpg")]
    #[case("https://x.test/media.d/62f", ".jpg")]
    #[case("/relative/pic.webp#frag", ".webp")]
    fn test_image_extension(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(image_extension(url), expected);
    }

    #[test]
    fn test_destination_layout() {
        let layout = layout(Path::new("public"));
        assert_eq!(
            layout.destination("62F", Category::Transparent, "https://x.test/a.png"),
            Path::new("public/transparent_colors/62F_hq.png")
        );
        assert_eq!(
            layout.destination("8", Category::Opal, "https://x.test/a"),
            Path::new("public/opale_colors/8_hq.jpg")
        );
        assert_eq!(layout.category_dir(Category::Opaque), Path::new("public/opaques"));
        assert_eq!(layout.category_dir(Category::Unknown), Path::new("public/samples"));
        assert_eq!(layout.report_path(), Path::new("public/download_report.json"));
    }

    #[tokio::test]
    async fn test_download_writes_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        layout.ensure_directories().await.unwrap();
        let downloader = Downloader::new(layout);
        let fetcher = StaticFetcher {
            body: Some(b"image-bytes".to_vec()),
            calls: AtomicUsize::new(0),
        };

        let first = downloader
            .download(&fetcher, "https://x.test/62f.png", "62F", Category::Opaque)
            .await
            .unwrap();
        assert_eq!(first.status, SaveStatus::Written { byte_size: 11 });
        assert_eq!(std::fs::read(&first.path).unwrap(), b"image-bytes");
        assert!(!part_path(&first.path).exists());

        let second = downloader
            .download(&fetcher, "https://x.test/62f.png", "62F", Category::Opaque)
            .await
            .unwrap();
        assert_eq!(second.status, SaveStatus::AlreadyPresent);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        layout.ensure_directories().await.unwrap();
        let existing = layout.destination("304", Category::Opaque, "https://x.test/304.jpg");
        std::fs::write(&existing, b"original").unwrap();

        let fetcher = StaticFetcher {
            body: Some(b"new".to_vec()),
            calls: AtomicUsize::new(0),
        };
        let saved = Downloader::new(layout)
            .download(&fetcher, "https://x.test/304.jpg", "304", Category::Opaque)
            .await
            .unwrap();

        assert_eq!(saved.status, SaveStatus::AlreadyPresent);
        assert_eq!(std::fs::read(&existing).unwrap(), b"original");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        layout.ensure_directories().await.unwrap();
        let fetcher = StaticFetcher {
            body: None,
            calls: AtomicUsize::new(0),
        };

        let err = Downloader::new(layout.clone())
            .download(&fetcher, "https://x.test/1.jpg", "1", Category::Opal)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Fetch(_)));
        assert!(!layout.destination("1", Category::Opal, "https://x.test/1.jpg").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unverifiable_destination_is_a_write_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        layout.ensure_directories().await.unwrap();
        let opaque_dir = layout.category_dir(Category::Opaque).to_path_buf();
        std::fs::set_permissions(&opaque_dir, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores directory permissions
        let lookup_denied = std::fs::metadata(opaque_dir.join("x"))
            .is_err_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied);
        let fetcher = StaticFetcher {
            body: Some(b"new".to_vec()),
            calls: AtomicUsize::new(0),
        };
        let result = Downloader::new(layout)
            .download(&fetcher, "https://x.test/304.jpg", "304", Category::Opaque)
            .await;
        std::fs::set_permissions(&opaque_dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        if lookup_denied {
            assert!(matches!(result, Err(DownloadError::Write { .. })));
            assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_write_failure_without_directories() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher {
            body: Some(vec![1, 2, 3]),
            calls: AtomicUsize::new(0),
        };

        let err = Downloader::new(layout(&dir.path().join("missing")))
            .download(&fetcher, "https://x.test/1.jpg", "1", Category::Opal)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Write { .. }));
    }
}
