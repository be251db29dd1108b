//! Persistence and reporting of the scored metrics.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::metrics::MetricsTable;

/// Writes `metrics` as pretty-printed JSON to `path`, replacing any previous
/// document in one rename.
pub fn write_metrics(path: &Path, metrics: &MetricsTable) -> Result<()> {
    let json = serde_json::to_string_pretty(metrics)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to stage output in {}", dir.display()))?;
    staged.write_all(json.as_bytes())?;
    staged.write_all(b"\n")?;
    staged
        .persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), bytes = json.len(), "Wrote metrics");
    Ok(())
}

/// Logs one line per region, best score first.
pub fn log_summary(metrics: &MetricsTable) {
    let mut ranked: Vec<_> = metrics.iter().collect();
    ranked.sort_by(|a, b| b.1.score.total_cmp(&a.1.score).then_with(|| a.0.cmp(b.0)));

    for (region, m) in ranked {
        info!(
            region = %region,
            score = m.score,
            calls = m.counts.calls,
            connects = m.counts.connects,
            discos = m.counts.discos,
            deals = m.counts.deals,
            customers = m.counts.customers,
            segments = m.segments.len(),
            "Region"
        );
    }
}
