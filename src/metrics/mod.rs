//! Regional performance metrics built from the canonical report files.
//!
//! Two passes: [`accumulate`] sums every file's counts per region and
//! segment into a [`RegionTable`], then [`score`] turns that table into
//! rate-based scores normalized against the best region.

pub mod accumulate;
pub mod loader;
pub mod score;
pub mod segments;
pub mod types;
pub mod utility;

pub use accumulate::{accumulate, normalize_region};
pub use score::score;
pub use segments::SegmentMap;
pub use types::{CountRow, Counts, MetricsTable, RegionMetrics, RegionTable, SegmentMetrics};

use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::reports::Category;

/// Reads every canonical file. The deals file may be absent; any other
/// missing or malformed file is an error.
pub fn load_inputs(
    files: &BTreeMap<Category, PathBuf>,
    segments: &SegmentMap,
) -> Result<BTreeMap<Category, Vec<CountRow>>> {
    let mut inputs = BTreeMap::new();

    for category in Category::ALL {
        let path = files.get(&category);
        let path = match path {
            Some(p) if p.exists() => p,
            _ if !category.is_required() => {
                warn!(%category, "Optional file missing, counting zero");
                continue;
            }
            Some(p) => bail!("Required {category} file missing at {}", p.display()),
            None => bail!("No file configured for {category}"),
        };

        let rows = loader::load_file(path, category, segments)?;
        info!(%category, path = %path.display(), rows = rows.len(), "Loaded file");
        inputs.insert(category, rows);
    }

    Ok(inputs)
}

/// Loads, accumulates and scores the canonical files.
#[tracing::instrument(skip_all)]
pub fn aggregate(
    files: &BTreeMap<Category, PathBuf>,
    segments: &SegmentMap,
) -> Result<MetricsTable> {
    let inputs = load_inputs(files, segments)?;
    let table = accumulate(
        inputs.iter().map(|(category, rows)| (*category, rows.as_slice())),
        segments,
    );
    info!(regions = table.len(), "Accumulated region totals");
    Ok(score(&table))
}
