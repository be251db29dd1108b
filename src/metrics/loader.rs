//! Reading canonical CSV files into [`CountRow`]s.

use anyhow::{Context, Result, anyhow, bail};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::metrics::segments::SegmentMap;
use crate::metrics::types::CountRow;
use crate::reports::Category;

const REGION_HEADERS: &[&str] = &["State/Region", "State", "Region"];

/// Column positions resolved from a file's header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSchema {
    pub region: usize,
    pub count: usize,
    pub classification: Option<usize>,
}

fn clean_header(h: &str) -> &str {
    h.trim_start_matches('\u{feff}').trim()
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| clean_header(h).eq_ignore_ascii_case(name))
}

const COUNT_PREFIX: &str = "count of";

fn count_header(category: Category) -> &'static str {
    match category {
        Category::Calls | Category::Connects => "Count of Calls",
        Category::Customers | Category::Deals => "Count of Deals",
        Category::Discos => "Count of Meetings",
    }
}

fn find_count_column(headers: &StringRecord, category: Category, region: usize) -> Option<usize> {
    find_column(headers, count_header(category)).or_else(|| {
        headers.iter().enumerate().position(|(idx, h)| {
            idx != region
                && clean_header(h)
                    .get(..COUNT_PREFIX.len())
                    .is_some_and(|p| p.eq_ignore_ascii_case(COUNT_PREFIX))
        })
    })
}

/// Locates the region, count and classification columns.
///
/// The count column is found by its category's name, then by any other
/// `Count of ...` header, falling back to the second column.
/// Exports without a region column are rejected.
pub fn resolve_schema(
    headers: &StringRecord,
    category: Category,
    segments: &SegmentMap,
) -> Result<FileSchema> {
    let region = REGION_HEADERS
        .iter()
        .find_map(|name| find_column(headers, name))
        .ok_or_else(|| anyhow!("no region column (expected one of {REGION_HEADERS:?})"))?;

    let count = match find_count_column(headers, category, region) {
        Some(idx) => idx,
        None if headers.len() > 1 => 1,
        None => bail!("no count column"),
    };
    if count == region {
        bail!("count column and region column are the same");
    }

    let classification = find_column(headers, segments.column_for(category));

    Ok(FileSchema {
        region,
        count,
        classification,
    })
}

fn parse_count(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| anyhow!("count '{raw}' is not a non-negative integer"))
}

/// Parses CSV text for `category`. Rows whose region is blank are dropped;
/// any unparseable count fails the whole file.
pub fn read_rows<R: Read>(
    reader: R,
    category: Category,
    segments: &SegmentMap,
) -> Result<Vec<CountRow>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let schema = resolve_schema(&headers, category, segments)?;
    debug!(?schema, %category, "Resolved file schema");

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let region = record.get(schema.region).unwrap_or("").trim();
        if region.is_empty() {
            debug!(line, "Skipping row without a region");
            continue;
        }

        let raw_count = record
            .get(schema.count)
            .ok_or_else(|| anyhow!("line {line}: missing count column"))?;
        let count = parse_count(raw_count).with_context(|| format!("line {line}"))?;

        let classification = schema
            .classification
            .and_then(|idx| record.get(idx))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        rows.push(CountRow {
            region: region.to_string(),
            count,
            classification,
        });
    }

    Ok(rows)
}

/// Reads the canonical file at `path`.
pub fn load_file(path: &Path, category: Category, segments: &SegmentMap) -> Result<Vec<CountRow>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_rows(file, category, segments).with_context(|| format!("Malformed file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(csv: &str, category: Category) -> Result<Vec<CountRow>> {
        read_rows(csv.as_bytes(), category, &SegmentMap::default())
    }

    #[test]
    fn test_named_count_column() {
        let parsed = rows(
            "Activity date,State/Region,Count of Calls\n2025-01-01,CA,12\n2025-01-01, tx ,3\n",
            Category::Calls,
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].region, "CA");
        assert_eq!(parsed[0].count, 12);
        assert_eq!(parsed[1].region, "tx");
        assert_eq!(parsed[1].classification, None);
    }

    #[test]
    fn test_positional_count_column() {
        let parsed = rows("State/Region,Meetings\nNY,4\n", Category::Discos).unwrap();
        assert_eq!(parsed[0].count, 4);
    }

    #[test]
    fn test_customers_use_deal_count_header() {
        let parsed = rows(
            "State/Region,Deal Stage,Count of Deals\nCA,Closed Won,3\n",
            Category::Customers,
        )
        .unwrap();
        assert_eq!(parsed[0].count, 3);
    }

    #[test]
    fn test_other_count_header_beats_position() {
        let parsed = rows(
            "State/Region,Activity type,Count of Activities\nOR,Call,9\n",
            Category::Calls,
        )
        .unwrap();
        assert_eq!(parsed[0].count, 9);
    }

    #[test]
    fn test_bom_and_case_in_headers() {
        let parsed = rows("\u{feff}state/region,count of calls\nWA,7\n", Category::Connects).unwrap();
        assert_eq!(parsed[0].region, "WA");
        assert_eq!(parsed[0].count, 7);
    }

    #[test]
    fn test_deal_classification_column() {
        let parsed = rows(
            "Deal Name,State/Region,School Type,Count of Deals\nA,CA,Public,1\nB,CA,,1\n",
            Category::Deals,
        )
        .unwrap();
        assert_eq!(parsed[0].classification.as_deref(), Some("Public"));
        assert_eq!(parsed[0].count, 1);
        assert_eq!(parsed[1].classification, None);
    }

    #[test]
    fn test_role_column_for_activity() {
        let parsed = rows(
            "State/Region,Count of Calls,Activity assigned to\nCA,5,Dana Reyes\n",
            Category::Calls,
        )
        .unwrap();
        assert_eq!(parsed[0].classification.as_deref(), Some("Dana Reyes"));
    }

    #[test]
    fn test_blank_region_skipped() {
        let parsed = rows("State/Region,Count of Calls\n ,5\nCA,1\n", Category::Calls).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_missing_region_column_errors() {
        let err = rows("Owner,Count of Calls\nx,5\n", Category::Calls).unwrap_err();
        assert!(err.to_string().contains("region column"));
    }

    #[test]
    fn test_bad_count_errors() {
        let err = rows("State/Region,Count of Calls\nCA,many\n", Category::Calls).unwrap_err();
        assert!(format!("{err:#}").contains("many"));
        assert!(rows("State/Region,Count of Calls\nCA,-1\n", Category::Calls).is_err());
    }

    #[test]
    fn test_empty_file_has_no_rows() {
        assert!(rows("State/Region,Count of Calls\n", Category::Calls).unwrap().is_empty());
    }

    #[test]
    fn test_load_file_missing() {
        let err = load_file(Path::new("/nonexistent/calls.csv"), Category::Calls, &SegmentMap::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
