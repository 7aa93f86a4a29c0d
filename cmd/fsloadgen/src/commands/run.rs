//! The `run` command: build a corpus, drive it at a target QPS, and report
//! aggregate (and, if configured, detailed) results.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use fsloadgen_caller::{build_caller, ApiVersion, Caller, CallerKind, HttpCallerConfig};
use fsloadgen_corpus::{
    build_corpus, EntityListingSource, LocalFileBlobSource, LocalWarehouseEntitySource,
};
use fsloadgen_manager::{LoadManager, LoadManagerConfig, SampleStrategy};
use fsloadgen_sink::{normalize_gcs_output_path, LocalBlobSink, LocalCsvTableSink, ResultsWriter};
use tracing::{info, warn};

const GCS_MIRROR_ROOT: &str = ".local-gcs-cache";

/// Arguments for `fsloadgen run`.
#[derive(Args)]
pub struct RunArgs {
    /// Tasks submitted per one-second sample.
    #[arg(long)]
    pub target_qps: usize,

    /// Worker pool size for each sample's executor.
    #[arg(long)]
    pub num_threads: usize,

    /// Number of measured samples (roughly the number of seconds measured).
    #[arg(long)]
    pub num_samples: usize,

    /// Number of warmup samples, whose results are discarded.
    #[arg(long, default_value_t = 0)]
    pub num_warmup_samples: usize,

    /// Whether the work queue replays the corpus in order or shuffled.
    #[arg(long, value_enum, default_value_t = SampleStrategyArg::InOrder)]
    pub sample_strategy: SampleStrategyArg,

    /// Seed for a shuffled work queue. Omit for a nondeterministic shuffle.
    #[arg(long)]
    pub seed: Option<u64>,

    /// GCP project ID the feature store lives in.
    #[arg(long)]
    pub project_id: String,

    /// GCP region the feature store lives in, e.g. `us-central1`.
    #[arg(long)]
    pub region: String,

    /// Which feature-retrieval API version to address.
    #[arg(long, value_enum, default_value_t = ApiVersionArg::V1)]
    pub api_version: ApiVersionArg,

    /// Overrides the default `{region}-aiplatform.googleapis.com` endpoint.
    #[arg(long)]
    pub endpoint_override: Option<String>,

    /// Path or `gs://` URI to the request template document.
    #[arg(long)]
    pub feature_query_file: String,

    /// Path or `gs://` URI to the entity listing document.
    #[arg(long)]
    pub entity_file: Option<String>,

    /// A warehouse query string to resolve the entity listing instead of a
    /// static file. Mutually exclusive with `entity_file`.
    #[arg(long, conflicts_with = "entity_file")]
    pub entity_query: Option<String>,

    /// Root for blob outputs (aggregate + detailed CSVs). Empty means
    /// console-only: no artifacts are written.
    #[arg(long)]
    pub gcs_output_path: Option<String>,

    /// Local directory to write outputs into, when not using a `gs://`
    /// path. Takes precedence over `gcs_output_path` if both are set.
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Dataset the detailed-results table is created in. Empty auto-names
    /// it from the target QPS and run UUID.
    #[arg(long)]
    pub bigquery_output_dataset: Option<String>,

    /// Use the in-process arithmetic test caller instead of issuing real
    /// HTTP calls, with the given artificial per-call latency in
    /// milliseconds. For dry runs against no live endpoint.
    #[arg(long)]
    pub test_caller_latency_ms: Option<u64>,
}

/// Which wire version of the feature-retrieval API to address.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ApiVersionArg {
    /// The stable `v1` API.
    V1,
    /// The `v1beta1` API.
    V1Beta1,
}

impl From<ApiVersionArg> for ApiVersion {
    fn from(value: ApiVersionArg) -> Self {
        match value {
            ApiVersionArg::V1 => Self::V1,
            ApiVersionArg::V1Beta1 => Self::V1Beta1,
        }
    }
}

/// How the work queue replays the corpus.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SampleStrategyArg {
    /// `workQueue[i] = corpus[i]`.
    InOrder,
    /// A seeded Fisher-Yates shuffle.
    Shuffled,
}

impl From<SampleStrategyArg> for SampleStrategy {
    fn from(value: SampleStrategyArg) -> Self {
        match value {
            SampleStrategyArg::InOrder => Self::InOrder,
            SampleStrategyArg::Shuffled => Self::Shuffled,
        }
    }
}

/// Runs one load-generation experiment end to end.
pub async fn run(args: RunArgs) -> Result<()> {
    let corpus = build_request_corpus(&args).context("failed to build request corpus")?;
    info!(corpus_size = corpus.len(), "corpus built");

    let caller = build_run_caller(&args).context("failed to construct caller")?;

    let config = LoadManagerConfig::new(args.target_qps, args.num_threads)
        .with_sample_strategy(args.sample_strategy.into())
        .with_warmup_sample_count(args.num_warmup_samples)
        .with_measured_sample_count(args.num_samples);
    let config = match args.seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    };

    let manager = LoadManager::new(config, caller);
    let report = manager.run(corpus).await.context("run failed")?;

    print!("{}", report.aggregate.format_line());
    if report.exceeded_samples > 0 {
        warn!(
            exceeded_samples = report.exceeded_samples,
            total_samples = report.total_samples,
            "some samples did not reach the target QPS within their one-second budget"
        );
    }

    if let Some(output_root) = resolve_output_root(&args)? {
        let dataset = args.bigquery_output_dataset.filter(|d| !d.is_empty()).unwrap_or_else(|| {
            format!("vertex_ai_benchmarker_results_{}_{}", args.target_qps, report.run_identity.uuid)
        });

        let blob_sink = Arc::new(LocalBlobSink::new(output_root.join("blobs")));
        let table_sink = Arc::new(LocalCsvTableSink::new(output_root.join("tables")));
        let writer = ResultsWriter::new(blob_sink, table_sink, dataset);

        let outcome = writer
            .write(&report.run_identity, &report.aggregate, &report.results)
            .context("failed to write detailed results")?;

        info!(
            aggregate_object = %outcome.aggregate_object.display(),
            detailed_objects = outcome.detailed_objects.len(),
            table_name = %outcome.table_name,
            "detailed results written"
        );
    }

    Ok(())
}

fn build_request_corpus(args: &RunArgs) -> anyhow::Result<Vec<fsloadgen_request::Request>> {
    let blobs = LocalFileBlobSource::with_gcs_mirror(GCS_MIRROR_ROOT);
    let warehouse = LocalWarehouseEntitySource;

    let listing = if let Some(query) = &args.entity_query {
        EntityListingSource::Warehouse(query)
    } else {
        let path = args
            .entity_file
            .as_deref()
            .context("either --entity-file or --entity-query must be given")?;
        EntityListingSource::Blob(path)
    };

    Ok(build_corpus(&blobs, &warehouse, &args.feature_query_file, listing)?)
}

fn build_run_caller(args: &RunArgs) -> anyhow::Result<Arc<dyn Caller>> {
    if let Some(latency_ms) = args.test_caller_latency_ms {
        warn!("using the in-process test caller; no real RPCs will be issued");
        return Ok(build_caller(CallerKind::Test {
            latency: Duration::from_millis(latency_ms),
        })?);
    }

    let mut config = HttpCallerConfig::new(&args.project_id, &args.region, args.api_version.into());
    config.endpoint_override.clone_from(&args.endpoint_override);
    Ok(build_caller(CallerKind::Http(config))?)
}

/// Resolves where detailed results should be written, honoring
/// `output_dir` over a `gs://`-style `gcs_output_path` and returning `None`
/// for console-only runs.
fn resolve_output_root(args: &RunArgs) -> anyhow::Result<Option<PathBuf>> {
    if let Some(dir) = args.output_dir.as_deref().filter(|d| !d.is_empty()) {
        return Ok(Some(PathBuf::from(dir)));
    }

    let Some(gcs_path) = args.gcs_output_path.as_deref().filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    let normalized = normalize_gcs_output_path(gcs_path)?;
    warn!(
        path = %normalized,
        "no real GCS/BigQuery backend is wired in; mirroring output under {GCS_MIRROR_ROOT}"
    );
    let object = normalized
        .strip_prefix("gs://")
        .unwrap_or(&normalized)
        .trim_end_matches('/');
    Ok(Some(PathBuf::from(GCS_MIRROR_ROOT).join(object)))
}
