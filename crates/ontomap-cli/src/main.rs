//! ontomap: predicted vs observed outcome-term similarity per drug.
//! Entry point for the batch binary.

use anyhow::Context;
use ontomap_config::{MappingConfig, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};
use ontomap_core::{run_mapping, MappingJob};
use ontomap_embed::{BertEmbedder, TextEmbedder};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ontomap=debug,info")),
        )
        .init();

    info!("Ontomap starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = MappingConfig::load().with_context(|| {
        format!("could not load configuration (set {CONFIG_ENV_VAR} or provide {DEFAULT_CONFIG_FILE})")
    })?;
    info!(
        model = %config.embedding.model,
        predicted = %config.datasets.predicted,
        observed = %config.datasets.observed,
        base_dir = %config.paths.base_dir.display(),
        "Configuration loaded"
    );

    let job = MappingJob::from_config(&config)?;

    info!("Loading embedding model {}...", config.embedding.model);
    let embedder = BertEmbedder::new(config.embedding_config())
        .await
        .with_context(|| format!("failed to load {}", config.embedding.model))?;
    info!(
        dimension = embedder.dimension(),
        gpu = embedder.is_gpu(),
        "Embedding model ready"
    );

    let report = run_mapping(&job, &embedder).await?;

    for skipped in &report.skipped {
        warn!(drug = %skipped.drug, "Skipped: {}", skipped.reason);
    }
    for failed in &report.failed {
        warn!(drug = %failed.drug, "Output not written: {}", failed.error);
    }
    info!(
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        output = %config.model_output_dir().display(),
        "Done in {:.1}s",
        report.duration_ms as f64 / 1000.0
    );

    Ok(())
}
