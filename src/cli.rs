use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use swatch_scraper::infrastructure::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Harvest enamel swatch images from a product catalog", long_about = None)]
pub struct Cli {
    /// Config file (toml, json or yaml); defaults to ./swatch-scraper.*
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every catalog page and download its swatch image (default)
    Run(RunArgs),

    /// Classify a single product URL without touching the network
    Classify {
        url: String,
        /// Product title to classify alongside the URL
        #[arg(long, default_value = "")]
        title: String,
    },

    /// Print the effective configuration as JSON
    PrintConfig,
}

/// Overrides applied on top of file and environment configuration
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Output root directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Catalog file: one URL per line, or a JSON array
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Product page timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub page_timeout: Option<u64>,

    /// Image download timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub image_timeout: Option<u64>,

    /// Pause between catalog entries in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Log level or filter directives
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl RunArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.output_dir {
            config.output.root_dir.clone_from(dir);
        }
        if let Some(catalog) = &self.catalog {
            config.catalog.source = Some(catalog.clone());
        }
        if let Some(secs) = self.page_timeout {
            config.http.page_timeout_seconds = secs;
        }
        if let Some(secs) = self.image_timeout {
            config.http.image_timeout_seconds = secs;
        }
        if let Some(ms) = self.delay_ms {
            config.http.delay_ms = ms;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
    }
}
