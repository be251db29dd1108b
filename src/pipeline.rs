//! The two pipeline stages as the CLI runs them.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::fetch::HttpClient;
use crate::metrics::{self, MetricsTable, SegmentMap};
use crate::output;
use crate::reports;
use crate::resolver::ReportResolver;
use crate::retriever::FileRetriever;
use crate::services::inbox_api::InboxApi;

/// Outcome counts for one fetch pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub retrieved: usize,
    pub skipped: usize,
}

/// Resolves every catalog report and downloads its files into `data_dir`.
///
/// When a report resolves to several files they are written in turn to the
/// same canonical name, so the last successful one is kept. Ids are visited
/// in string order, so `"99"` is written after `"100"`.
#[tracing::instrument(skip_all, fields(data_dir = %data_dir.display()))]
pub async fn fetch_reports<I, C, A, D>(
    resolver: &ReportResolver<I, C>,
    retriever: &FileRetriever<A, D>,
    data_dir: &Path,
) -> Result<FetchSummary>
where
    I: InboxApi,
    C: HttpClient,
    A: HttpClient,
    D: HttpClient,
{
    let resolved = resolver.resolve(reports::report_names()).await?;
    let mut summary = FetchSummary::default();

    for spec in reports::catalog() {
        let Some(ids) = resolved.get(spec.name) else {
            continue;
        };
        info!(report = spec.name, file_ids = ids.len(), "Found file IDs");

        for id in ids {
            if retriever
                .retrieve(id, spec.kind, spec.canonical_filename, data_dir)
                .await?
            {
                summary.retrieved += 1;
            } else {
                warn!(report = spec.name, file_id = %id, "Skipped file");
                summary.skipped += 1;
            }
        }
    }

    info!(
        retrieved = summary.retrieved,
        skipped = summary.skipped,
        "Fetch pass complete"
    );
    Ok(summary)
}

/// Aggregates the canonical files in `data_dir` and writes the result to
/// `output_path`. Nothing is written unless aggregation succeeds.
#[tracing::instrument(skip_all, fields(data_dir = %data_dir.display(), output = %output_path.display()))]
pub fn build_metrics(
    data_dir: &Path,
    output_path: &Path,
    segments: &SegmentMap,
) -> Result<MetricsTable> {
    let files = reports::canonical_files(data_dir);
    let metrics = metrics::aggregate(&files, segments)?;
    output::write_metrics(output_path, &metrics)?;
    info!(regions = metrics.len(), "Metrics written");
    Ok(metrics)
}
