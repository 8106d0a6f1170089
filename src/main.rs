mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use swatch_scraper::application::CatalogPipeline;
use swatch_scraper::domain::Classifier;
use swatch_scraper::infrastructure::logging::{init_logging_with_config, log_system_info};
use swatch_scraper::infrastructure::{AppConfig, ConfigManager, HttpClient};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ConfigManager::new(cli.config.clone()).load_config()?;

    match cli.command {
        Some(Commands::Classify { url, title }) => classify(&config, &url, &title),
        Some(Commands::PrintConfig) => {
            println!("{}", ConfigManager::to_pretty_json(&config)?);
            Ok(())
        }
        Some(Commands::Run(args)) => {
            args.apply(&mut config);
            run(config)
        }
        None => run(config),
    }
}

fn classify(config: &AppConfig, url: &str, title: &str) -> Result<()> {
    let classifier = Classifier::new(&config.classification).context("Invalid classification rules")?;
    let result = classifier.classify(url, title);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run(config: AppConfig) -> Result<()> {
    init_logging_with_config(&config.logging)?;
    log_system_info();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    runtime.block_on(async {
        let catalog = ConfigManager::load_catalog(&config).await?;
        let client = HttpClient::with_config(config.http.clone())?;
        let pipeline = CatalogPipeline::new(client, &config)?;

        let report = pipeline.run(&catalog).await?;
        println!("\n{}", report.render_console_summary(pipeline.layout().report_path()));
        Ok::<(), anyhow::Error>(())
    })
}
