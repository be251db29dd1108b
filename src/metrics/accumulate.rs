use crate::metrics::segments::SegmentMap;
use crate::metrics::types::{CountRow, RegionTable};
use crate::reports::Category;

/// Region keys compare trimmed and uppercased, so " ca " and "CA" merge.
pub fn normalize_region(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Adds one category's rows to `table`.
///
/// A region is created on first sight with all counters at zero. Every row
/// counts toward its region total; rows that classify into a known segment
/// also count toward that segment.
pub fn accumulate_category(
    table: &mut RegionTable,
    category: Category,
    rows: &[CountRow],
    segments: &SegmentMap,
) {
    for row in rows {
        let key = normalize_region(&row.region);
        if key.is_empty() {
            continue;
        }

        let region = table.entry(key).or_default();
        region.totals.add(category, row.count);

        let segment = row
            .classification
            .as_deref()
            .and_then(|raw| segments.classify(category, raw));
        if let Some(segment) = segment {
            region
                .segments
                .entry(segment.to_string())
                .or_default()
                .add(category, row.count);
        }
    }
}

/// Builds the region table from scratch out of every category's rows.
pub fn accumulate<'a>(
    inputs: impl IntoIterator<Item = (Category, &'a [CountRow])>,
    segments: &SegmentMap,
) -> RegionTable {
    let mut table = RegionTable::new();
    for (category, rows) in inputs {
        accumulate_category(&mut table, category, rows, segments);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::types::Counts;

    fn row(region: &str, count: u64, classification: Option<&str>) -> CountRow {
        CountRow {
            region: region.to_string(),
            count,
            classification: classification.map(String::from),
        }
    }

    #[test]
    fn test_region_keys_merge_case_and_whitespace() {
        let calls = vec![row(" ca ", 10, None), row("CA", 5, None), row("Ca", 1, None)];
        let table = accumulate([(Category::Calls, calls.as_slice())], &SegmentMap::default());

        assert_eq!(table.len(), 1);
        assert_eq!(table["CA"].totals.calls, 16);
    }

    #[test]
    fn test_new_region_starts_at_zero() {
        let discos = vec![row("TX", 2, None)];
        let table = accumulate([(Category::Discos, discos.as_slice())], &SegmentMap::default());
        assert_eq!(
            table["TX"].totals,
            Counts {
                discos: 2,
                ..Counts::default()
            }
        );
        assert!(table["TX"].segments.is_empty());
    }

    #[test]
    fn test_categories_land_in_their_own_counter() {
        let calls = vec![row("CA", 100, None)];
        let connects = vec![row("CA", 40, None)];
        let customers = vec![row("CA", 3, None)];
        let table = accumulate(
            [
                (Category::Calls, calls.as_slice()),
                (Category::Connects, connects.as_slice()),
                (Category::Customers, customers.as_slice()),
            ],
            &SegmentMap::default(),
        );
        let totals = table["CA"].totals;
        assert_eq!((totals.calls, totals.connects, totals.customers), (100, 40, 3));
        assert_eq!((totals.discos, totals.deals), (0, 0));
    }

    #[test]
    fn test_unrecognized_segment_counts_only_toward_total() {
        let deals = vec![
            row("CA", 1, Some("Public")),
            row("CA", 1, Some("Private")),
            row("CA", 1, None),
        ];
        let table = accumulate([(Category::Deals, deals.as_slice())], &SegmentMap::default());

        assert_eq!(table["CA"].totals.deals, 3);
        assert_eq!(table["CA"].segments.len(), 1);
        assert_eq!(table["CA"].segments["Public"].deals, 1);
        assert!(!table["CA"].segments.contains_key("Private"));
    }

    #[test]
    fn test_roles_classify_activity_rows() {
        let mut segments = SegmentMap::default();
        segments.roles.insert("Dana Reyes".into(), "Charter".into());
        let calls = vec![row("NY", 7, Some("Dana Reyes")), row("NY", 2, Some("Unknown Rep"))];
        let table = accumulate([(Category::Calls, calls.as_slice())], &segments);

        assert_eq!(table["NY"].totals.calls, 9);
        assert_eq!(table["NY"].segments["Charter"].calls, 7);
    }

    #[test]
    fn test_segments_never_exceed_totals() {
        let mut segments = SegmentMap::default();
        segments.roles.insert("A".into(), "Public".into());
        segments.roles.insert("B".into(), "Charter".into());
        let calls = vec![
            row("CA", 5, Some("A")),
            row("CA", 3, Some("B")),
            row("ca", 4, None),
        ];
        let deals = vec![row("CA", 2, Some("public")), row("CA", 1, Some("Charter"))];
        let table = accumulate(
            [
                (Category::Calls, calls.as_slice()),
                (Category::Deals, deals.as_slice()),
            ],
            &segments,
        );

        let region = &table["CA"];
        for category in Category::ALL {
            let segment_sum: u64 = region.segments.values().map(|c| c.get(category)).sum();
            assert!(segment_sum <= region.totals.get(category), "{category}");
            for counts in region.segments.values() {
                assert!(counts.get(category) <= region.totals.get(category));
            }
        }
    }
}
