//! Command-line entry point for the catalog import job.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use catalog_stampede::catalog::{CatalogClient, HttpCatalogClient, InMemoryCatalog};
use catalog_stampede::config::ImportConfig;
use catalog_stampede::error::AppError;
use catalog_stampede::job::ImportJob;
use catalog_stampede::source::CsvDraftSource;
use catalog_stampede::steps::{
    CustomerGroupStep, ImportProductsStep, ProductTypesStep, PublishStep, TaxCategoryStep,
};

const USAGE: &str = "Usage: catalog-stampede <config.json> [--dry-run]";

struct CliArgs {
    config_path: PathBuf,
    dry_run: bool,
}

fn parse_args() -> Result<CliArgs, AppError> {
    let mut config_path: Option<PathBuf> = None;
    let mut dry_run = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "--help" | "-h" => return Err(AppError::Config(USAGE.to_string())),
            _ if config_path.is_none() => config_path = Some(PathBuf::from(arg)),
            other => {
                return Err(AppError::Config(format!(
                    "Unexpected argument: {}\n{}",
                    other, USAGE
                )))
            }
        }
    }

    let config_path = config_path.ok_or_else(|| AppError::Config(USAGE.to_string()))?;
    Ok(CliArgs {
        config_path,
        dry_run,
    })
}

async fn run(args: CliArgs) -> Result<(), AppError> {
    let config = ImportConfig::load(&args.config_path)?;

    if config.retry.max_attempts > 0 {
        warn!(
            "[MAIN] retry.max_attempts = {} is configured but not yet honored; the job fails fast",
            config.retry.max_attempts
        );
    }

    let client: Arc<dyn CatalogClient> = if args.dry_run {
        info!("[MAIN] Dry run: writing to an in-memory catalog");
        Arc::new(InMemoryCatalog::new())
    } else {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("Invalid base_url: {}", e)))?;
        Arc::new(HttpCatalogClient::new(base_url, config.api_token.clone())?)
    };

    let source = CsvDraftSource::open(&config.products_csv, config.max_records)?;

    let job = ImportJob::new()
        .with_step(Box::new(CustomerGroupStep::new(
            client.clone(),
            config.timeouts.clone(),
        )))
        .with_step(Box::new(TaxCategoryStep::new(
            client.clone(),
            config.timeouts.clone(),
        )))
        .with_step(Box::new(ProductTypesStep::new(
            client.clone(),
            config.timeouts.clone(),
        )))
        .with_step(Box::new(ImportProductsStep::new(
            client.clone(),
            source,
            config.chunk_size,
            &config.primary_locale,
            &config.secondary_locale,
            config.timeouts.clone(),
        )))
        .with_step(Box::new(PublishStep::new(
            client.clone(),
            config.chunk_size,
            config.timeouts.clone(),
        )));

    let report = job.run().await?;

    for step in &report.steps {
        info!(
            "[MAIN] {}: read={} filtered={} excluded={} created={} published={}",
            step.name,
            step.counters.read,
            step.counters.filtered,
            step.counters.excluded,
            step.counters.created,
            step.counters.published
        );
    }
    info!(
        "[MAIN] Job complete: {} created, {} published",
        report.total(|c| c.created),
        report.total(|c| c.published)
    );

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[MAIN] Job failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
