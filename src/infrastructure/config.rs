//! Configuration infrastructure
//!
//! Layered configuration for the scraper:
//! 1. Struct defaults (`#[serde(default)]`)
//! 2. Optional config file (`swatch-scraper.{toml,json,yaml}` or `--config`)
//! 3. `SWATCH_` environment variables, `__` separating nested keys
//!
//! CLI flags are applied on top by the binary.

#![allow(clippy::uninlined_format_args)]

use crate::domain::{Catalog, ClassificationConfig};
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::parsing::ImageSelectorConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output directory layout and report behavior
    pub output: OutputConfig,

    /// HTTP client and pacing
    pub http: HttpClientConfig,

    /// Where the product URLs come from
    pub catalog: CatalogConfig,

    /// Color code and category rules
    pub classification: ClassificationConfig,

    /// Image selection heuristics
    pub image: ImageSelectorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Output layout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of every output file
    pub root_dir: PathBuf,
    pub transparent_dir: String,
    pub opaque_dir: String,
    pub opal_dir: String,
    /// Directory for the `unknown` category
    pub unclassified_dir: String,
    pub report_file: String,
    /// Rewrite the report after every entry
    pub flush_report_each_entry: bool,
}

/// Catalog source; `None` means the built-in product list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub source: Option<PathBuf>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files
    pub log_dir: PathBuf,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(defaults::ROOT_DIR),
            transparent_dir: defaults::TRANSPARENT_DIR.to_string(),
            opaque_dir: defaults::OPAQUE_DIR.to_string(),
            opal_dir: defaults::OPAL_DIR.to_string(),
            unclassified_dir: defaults::UNCLASSIFIED_DIR.to_string(),
            report_file: defaults::REPORT_FILE.to_string(),
            flush_report_each_entry: defaults::FLUSH_REPORT_EACH_ENTRY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: PathBuf::from(defaults::LOG_DIR),
            max_files: defaults::LOG_MAX_FILES,
        }
    }
}

/// Configuration loader
pub struct ConfigManager {
    /// Explicit config file; when absent an optional `swatch-scraper.*` in the
    /// working directory is used
    pub config_path: Option<PathBuf>,
}

impl ConfigManager {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    /// Build the effective configuration from every layer
    pub fn load_config(&self) -> Result<AppConfig> {
        let file_source = match &self.config_path {
            Some(path) => ConfigFile::from(path.as_path()).required(true),
            None => ConfigFile::with_name(defaults::CONFIG_FILE_STEM).required(false),
        };

        let config = Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(defaults::ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration sources")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to parse configuration")?;

        if let Some(path) = &self.config_path {
            info!("Configuration loaded from {:?}", path);
        }
        Ok(app_config)
    }

    /// Load the catalog named by the configuration, or the built-in list
    pub async fn load_catalog(config: &AppConfig) -> Result<Catalog> {
        match &config.catalog.source {
            Some(path) => Self::read_catalog_file(path).await,
            None => Ok(Catalog::from_unique(emaux_soyer::PRODUCT_PAGES.iter().copied())),
        }
    }

    async fn read_catalog_file(path: &Path) -> Result<Catalog> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog file: {:?}", path))?;
        let catalog = Catalog::parse_list(&content)
            .with_context(|| format!("Failed to parse catalog file: {:?}", path))?;
        info!("Loaded {} catalog entries from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    /// Effective configuration as pretty JSON
    pub fn to_pretty_json(config: &AppConfig) -> Result<String> {
        serde_json::to_string_pretty(config).context("Failed to serialize configuration")
    }
}

/// Default configuration values
pub mod defaults {
    pub const ROOT_DIR: &str = "public";
    pub const TRANSPARENT_DIR: &str = "transparent_colors";
    pub const OPAQUE_DIR: &str = "opaques";
    pub const OPAL_DIR: &str = "opale_colors";
    pub const UNCLASSIFIED_DIR: &str = "samples";
    pub const REPORT_FILE: &str = "download_report.json";
    pub const FLUSH_REPORT_EACH_ENTRY: bool = true;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_DIR: &str = "logs";
    pub const LOG_MAX_FILES: usize = 5;

    /// Config file looked up in the working directory (any supported extension)
    pub const CONFIG_FILE_STEM: &str = "swatch-scraper";
    pub const ENV_PREFIX: &str = "SWATCH";
    pub const ENV_SEPARATOR: &str = "__";
}

/// Emaux Soyer enamel catalog
pub mod emaux_soyer {
    pub const BASE_URL: &str = "https://www.emaux-soyer.com";

    /// Known product pages (powders, grains and lumps)
    pub const PRODUCT_PAGES: &[&str] = &[
        "https://www.emaux-soyer.com/en/noir-36-en-poudre.html",
        "https://www.emaux-soyer.com/en/noir-36-en-morceaux.html",
        "https://www.emaux-soyer.com/en/blanc-59-en-grains.html",
        "https://www.emaux-soyer.com/en/blanc-59-p-morceaux.html",
        "https://www.emaux-soyer.com/en/bleu-62f-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-66-f-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-66-f-grains.html",
        "https://www.emaux-soyer.com/en/bleu-66-f-morceaux.html",
        "https://www.emaux-soyer.com/en/bleu-68-f-sans-plomb.html",
        "https://www.emaux-soyer.com/en/gris-71-en-poudre.html",
        "https://www.emaux-soyer.com/en/jaune-75-en-poudre.html",
        "https://www.emaux-soyer.com/en/turquoise-80-f-en-poudre.html",
        "https://www.emaux-soyer.com/en/turquoise-81-f-en-poudre.html",
        "https://www.emaux-soyer.com/en/turquoise-81-f-en-morceaux.html",
        "https://www.emaux-soyer.com/en/vert-83-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-83-en-morceaux.html",
        "https://www.emaux-soyer.com/en/vert-84-en-morceaux.html",
        "https://www.emaux-soyer.com/en/jaune-95-en-poudre.html",
        "https://www.emaux-soyer.com/en/blanc-teinte-97-p.html",
        "https://www.emaux-soyer.com/en/orange-621-150g.html",
        "https://www.emaux-soyer.com/en/bleu-272-150g.html",
        "https://www.emaux-soyer.com/en/noir-55-f-morceaux.html",
        "https://www.emaux-soyer.com/en/marron-268-150-gr.html",
        "https://www.emaux-soyer.com/en/marron-269-150-gr-750-c-800-c.html",
        "https://www.emaux-soyer.com/en/vert-85-f-poudre-sans-plomb-830.html",
        "https://www.emaux-soyer.com/en/jaune-79-en-poudre-750-c-800-c.html",
        "https://www.emaux-soyer.com/en/rose-283-en-poudre.html",
        "https://www.emaux-soyer.com/en/turquoise-opaque-clair-126.html",
        "https://www.emaux-soyer.com/en/turquoise-opaque-fonce-127.html",
        "https://www.emaux-soyer.com/en/turquoise-271-poudre.html",
        "https://www.emaux-soyer.com/en/noir-56-poudre.html",
        "https://www.emaux-soyer.com/en/rose-299-f-poudre.html",
        "https://www.emaux-soyer.com/en/jaune-3063-transparent-en-poudre-3444.html",
        "https://www.emaux-soyer.com/en/violet-431-f-powder.html",
        "https://www.emaux-soyer.com/en/rose-2004-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-d-eau-270.html",
        "https://www.emaux-soyer.com/en/fondant-pour-cuivre-n-1-sans-plomb-en-poudre.html",
        "https://www.emaux-soyer.com/en/rubis-31.html",
        "https://www.emaux-soyer.com/en/anis-94-en-poudre.html",
        "https://www.emaux-soyer.com/en/black-55-f-powder.html",
        "https://www.emaux-soyer.com/en/bleu-195-f-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-196-f-poudre.html",
        "https://www.emaux-soyer.com/en/gris-bleu-197-f-en-poudre.html",
        "https://www.emaux-soyer.com/en/gris-bleu-197-f-en-morceaux.html",
        "https://www.emaux-soyer.com/en/gris-bleu-200-poudre.html",
        "https://www.emaux-soyer.com/en/orange-291-en-poudre.html",
        "https://www.emaux-soyer.com/en/rose-297-en-poudre.html",
        "https://www.emaux-soyer.com/en/rose-298-f-en-poudre.html",
        "https://www.emaux-soyer.com/en/rose-298-f-en-morceaux.html",
        "https://www.emaux-soyer.com/en/marron-302-c-en-poudre.html",
        "https://www.emaux-soyer.com/en/gris-304-en-poudre.html",
        "https://www.emaux-soyer.com/en/gris-304-en-grains.html",
        "https://www.emaux-soyer.com/en/gris-304-en-morceaux.html",
        "https://www.emaux-soyer.com/en/marron-307-en-poudre.html",
        "https://www.emaux-soyer.com/en/marron-309-en-poudre.html",
        "https://www.emaux-soyer.com/en/violet-430-f-en-poudre.html",
        "https://www.emaux-soyer.com/en/orange-491-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-marine-605-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-marine-605-en-grains.html",
        "https://www.emaux-soyer.com/en/peche-631-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-anglais-632-en-poudre.html",
        "https://www.emaux-soyer.com/en/lilas-633-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-olive-636-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-olive-636-en-grains.html",
        "https://www.emaux-soyer.com/en/celadon-637-f-en-poudre.html",
        "https://www.emaux-soyer.com/en/celadon-637-f-en-grains.html",
        "https://www.emaux-soyer.com/en/fondant-pour-or-n-2-en-poudre.html",
        "https://www.emaux-soyer.com/en/fondant-pour-argent-n-3-en-morceaux.html",
        "https://www.emaux-soyer.com/en/bleu-4-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-4-en-morceaux.html",
        "https://www.emaux-soyer.com/en/vert-10-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-10-en-grains.html",
        "https://www.emaux-soyer.com/en/vert-10-en-morceaux.html",
        "https://www.emaux-soyer.com/en/gris-bleu-13-en-poudre.html",
        "https://www.emaux-soyer.com/en/jaune-15-en-poudre.html",
        "https://www.emaux-soyer.com/en/violet-20-en-morceaux.html",
        "https://www.emaux-soyer.com/en/bleu-23-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-23-en-morceaux.html",
        "https://www.emaux-soyer.com/en/bleu-25-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-26-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-26-en-grains.html",
        "https://www.emaux-soyer.com/en/bleu-26-en-morceaux.html",
        "https://www.emaux-soyer.com/en/bleu-27-en-grains.html",
        "https://www.emaux-soyer.com/en/jaune-28-en-poudre.html",
        "https://www.emaux-soyer.com/en/jaune-28-en-morceaux.html",
        "https://www.emaux-soyer.com/en/lilas-29-en-poudre.html",
        "https://www.emaux-soyer.com/en/marron-32-en-poudre.html",
        "https://www.emaux-soyer.com/en/marron-32-en-grains.html",
        "https://www.emaux-soyer.com/en/lilas-33-en-poudre.html",
        "https://www.emaux-soyer.com/en/lilas-33-en-morceaux.html",
        "https://www.emaux-soyer.com/en/orange-38-en-poudre.html",
        "https://www.emaux-soyer.com/en/turquoise-45-en-poudre.html",
        "https://www.emaux-soyer.com/en/turquoise-45-en-morceaux.html",
        "https://www.emaux-soyer.com/en/vert-46-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-47-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-49-en-morceaux.html",
        "https://www.emaux-soyer.com/en/vert-50-poudre.html",
        "https://www.emaux-soyer.com/en/vert-51-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-52-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-52-en-morceaux.html",
        "https://www.emaux-soyer.com/en/violet-53-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-100-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-100-en-grains.html",
        "https://www.emaux-soyer.com/en/lilas-111-en-poudre.html",
        "https://www.emaux-soyer.com/en/lilas-111-en-morceaux.html",
        "https://www.emaux-soyer.com/en/vert-119-en-poudre.html",
        "https://www.emaux-soyer.com/en/gris-bleu-161-b-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-163-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-163-en-grains.html",
        "https://www.emaux-soyer.com/en/bleu-163-en-morceaux.html",
        "https://www.emaux-soyer.com/en/marron-172-en-poudre.html",
        "https://www.emaux-soyer.com/en/marron-172-en-grains.html",
        "https://www.emaux-soyer.com/en/marron-173-en-poudre.html",
        "https://www.emaux-soyer.com/en/marron-173-c-en-poudre.html",
        "https://www.emaux-soyer.com/en/marron-clair-174-c-en-poudre.html",
        "https://www.emaux-soyer.com/en/marron-175-en-poudre.html",
        "https://www.emaux-soyer.com/en/marron-176-en-poudre.html",
        "https://www.emaux-soyer.com/en/noir-177-en-poudre.html",
        "https://www.emaux-soyer.com/en/turquoise-185-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-188-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-188-en-grains.html",
        "https://www.emaux-soyer.com/en/vert-189-en-poudre.html",
        "https://www.emaux-soyer.com/en/violet-191-en-poudre.html",
        "https://www.emaux-soyer.com/en/violet-194-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-237-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-238-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-238-b-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-239-en-poudre.html",
        "https://www.emaux-soyer.com/en/turquoise-240-en-grains.html",
        "https://www.emaux-soyer.com/en/bleu-241-en-poudre.html",
        "https://www.emaux-soyer.com/en/bleu-241-en-morceaux.html",
        "https://www.emaux-soyer.com/en/turquoise-250-en-grains.html",
        "https://www.emaux-soyer.com/en/bleu-251-f-poudre.html",
        "https://www.emaux-soyer.com/en/vert-256-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-256-en-morceaux.html",
        "https://www.emaux-soyer.com/en/fondant-de-finition-518-en-poudre.html",
        "https://www.emaux-soyer.com/en/gris-violace-600-en-poudre.html",
        "https://www.emaux-soyer.com/en/gris-vert-601-en-poudre.html",
        "https://www.emaux-soyer.com/en/gris-terre-602-en-poudre.html",
        "https://www.emaux-soyer.com/en/gris-terre-602-en-grains.html",
        "https://www.emaux-soyer.com/en/gris-souris-603-en-poudre.html",
        "https://www.emaux-soyer.com/en/gris-turquoise-604-en-poudre.html",
        "https://www.emaux-soyer.com/en/marron-614-en-poudre.html",
        "https://www.emaux-soyer.com/en/fondant-de-finition-619-en-poudre.html",
        "https://www.emaux-soyer.com/en/fondant-de-finition-619-en-morceaux.html",
        "https://www.emaux-soyer.com/en/orange-620-en-poudre.html",
        "https://www.emaux-soyer.com/en/contre-email-en-poudre.html",
        "https://www.emaux-soyer.com/en/rose-1044-en-poudre.html",
        "https://www.emaux-soyer.com/en/rose-1046-en-poudre.html",
        "https://www.emaux-soyer.com/en/rose-1940-en-poudre.html",
        "https://www.emaux-soyer.com/en/rose-1942-en-poudre.html",
        "https://www.emaux-soyer.com/en/rose-1942-en-morceaux.html",
        "https://www.emaux-soyer.com/en/red-43-powder.html",
        "https://www.emaux-soyer.com/en/rouge-43-poudre-3115.html",
        "https://www.emaux-soyer.com/en/rouge-43-poudre-150-gr.html",
        "https://www.emaux-soyer.com/en/vert-pomme-285.html",
        "https://www.emaux-soyer.com/en/vert-tilleul-286-150g.html",
        "https://www.emaux-soyer.com/en/pourpre-284.html",
        "https://www.emaux-soyer.com/en/blanc-160-en-poudre.html",
        "https://www.emaux-soyer.com/en/fondant-pour-argent-n-3-en-poudre.html",
        "https://www.emaux-soyer.com/en/violet-20-en-poudre.html",
        "https://www.emaux-soyer.com/en/violet-104-en-poudre.html",
        "https://www.emaux-soyer.com/en/turquoise-184-en-poudre.html",
        "https://www.emaux-soyer.com/en/turquoise-240-en-poudre.html",
        "https://www.emaux-soyer.com/en/jaune-30-en-poudre.html",
        "https://www.emaux-soyer.com/en/vert-48-en-poudre.html",
        "https://www.emaux-soyer.com/en/rouge-296-en-poudre.html",
        "https://www.emaux-soyer.com/en/rouge-42-poudre.html",
        "https://www.emaux-soyer.com/en/rouge-288-en-poudre-800-c-840-c.html",
        "https://www.emaux-soyer.com/en/rouge-flamme-287.html",
        "https://www.emaux-soyer.com/en/fondant-pour-cuivre-n-1-en-poudre.html",
        "https://www.emaux-soyer.com/en/red-289-powder.html",
        "https://www.emaux-soyer.com/en/turquoise-273-poudre.html",
    ];
}
