//! Infrastructure layer for HTTP, HTML parsing, filesystem output and ambient setup
//!
//! Everything that touches the network, the disk or process-wide state lives
//! here; the domain layer stays pure.

pub mod config; // Layered configuration and the built-in catalog
pub mod downloader;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod parsing_error;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, LoggingConfig, OutputConfig, emaux_soyer};
pub use downloader::{DownloadError, Downloader, OutputLayout, SaveStatus, SavedImage};
pub use http_client::{FetchCause, FetchError, Fetcher, HttpClient, HttpClientConfig, ResourceKind};
pub use logging::{init_logging, init_logging_with_config};
pub use parsing::{ImageSelector, ImageSelectorConfig, ParsingError, ParsingResult, ProductPageParser, SelectedImage};
