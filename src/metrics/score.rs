//! Rate-based scoring and normalization against the best region.

use std::collections::BTreeMap;

use crate::metrics::types::{
    Counts, MetricsTable, RegionMetrics, RegionTable, SegmentMetrics,
};
use crate::metrics::utility::{ratio, round_to};

const CONNECT_WEIGHT: f64 = 0.5;
const BOOK_WEIGHT: f64 = 0.4;
const DEAL_WEIGHT: f64 = 0.1;

/// Funnel conversion rates for one node. Each is 0 when its denominator is 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub connect_rate: f64,
    pub book_rate: f64,
    pub deal_rate: f64,
}

impl Rates {
    pub fn from_counts(counts: &Counts) -> Self {
        Self {
            connect_rate: ratio(counts.connects, counts.calls),
            book_rate: ratio(counts.discos, counts.connects),
            deal_rate: ratio(counts.deals, counts.discos),
        }
    }
}

/// Weighted sum of the rates, rounded to 3 places.
pub fn raw_score(counts: &Counts) -> f64 {
    let r = Rates::from_counts(counts);
    round_to(
        CONNECT_WEIGHT * r.connect_rate + BOOK_WEIGHT * r.book_rate + DEAL_WEIGHT * r.deal_rate,
        3,
    )
}

/// `raw / global_max` rounded to 4 places, or 0 when no region scored.
pub fn normalize(raw: f64, global_max: f64) -> f64 {
    if global_max > 0.0 {
        round_to(raw / global_max, 4)
    } else {
        0.0
    }
}

/// Highest raw score among top-level regions. Segments do not participate.
pub fn global_max(table: &RegionTable) -> f64 {
    table
        .values()
        .map(|region| raw_score(&region.totals))
        .fold(0.0, f64::max)
}

/// Scores every region and segment against the same top-level maximum.
///
/// A segment can out-convert every whole region, so segment scores are
/// capped at 1.0 to stay in the same range as region scores.
pub fn score(table: &RegionTable) -> MetricsTable {
    let max = global_max(table);

    table
        .iter()
        .map(|(key, region)| {
            let segments: BTreeMap<String, SegmentMetrics> = region
                .segments
                .iter()
                .map(|(name, counts)| {
                    (
                        name.clone(),
                        SegmentMetrics {
                            counts: *counts,
                            score: normalize(raw_score(counts), max).min(1.0),
                        },
                    )
                })
                .collect();

            let metrics = RegionMetrics {
                counts: region.totals,
                score: normalize(raw_score(&region.totals), max),
                segments,
            };
            (key.clone(), metrics)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::types::RegionTotals;

    fn counts(calls: u64, connects: u64, discos: u64, deals: u64) -> Counts {
        Counts {
            calls,
            connects,
            customers: 0,
            discos,
            deals,
        }
    }

    fn table(entries: &[(&str, Counts)]) -> RegionTable {
        entries
            .iter()
            .map(|(k, c)| {
                (
                    k.to_string(),
                    RegionTotals {
                        totals: *c,
                        segments: BTreeMap::new(),
                    },
                )
            })
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_zero_denominators() {
        let r = Rates::from_counts(&Counts::default());
        assert_eq!((r.connect_rate, r.book_rate, r.deal_rate), (0.0, 0.0, 0.0));

        let r = Rates::from_counts(&counts(0, 5, 0, 3));
        assert_eq!(r.connect_rate, 0.0);
        assert_eq!(r.book_rate, 0.0);
        assert_eq!(r.deal_rate, 0.0);
    }

    #[test]
    fn test_raw_score_formula() {
        assert!(approx(raw_score(&counts(100, 40, 10, 2)), 0.32));
        assert!(approx(raw_score(&counts(50, 10, 1, 0)), 0.14));
    }

    #[test]
    fn test_customers_do_not_affect_score() {
        let mut c = counts(100, 40, 10, 2);
        let before = raw_score(&c);
        c.customers = 99;
        assert_eq!(raw_score(&c), before);
    }

    #[test]
    fn test_two_region_scenario() {
        let scored = score(&table(&[
            ("CA", counts(100, 40, 10, 2)),
            ("TX", counts(50, 10, 1, 0)),
        ]));
        assert!(approx(scored["CA"].score, 1.0));
        assert!(approx(scored["TX"].score, 0.4375));
        assert_eq!(scored["CA"].counts.calls, 100);
    }

    #[test]
    fn test_all_zero_scores_normalize_to_zero() {
        let scored = score(&table(&[
            ("CA", counts(10, 0, 0, 0)),
            ("TX", Counts::default()),
        ]));
        assert!(scored.values().all(|m| m.score == 0.0));
    }

    #[test]
    fn test_scores_bounded_by_one() {
        let scored = score(&table(&[
            ("A", counts(10, 10, 10, 10)),
            ("B", counts(10, 3, 1, 1)),
            ("C", counts(7, 2, 0, 0)),
        ]));
        assert!(approx(scored["A"].score, 1.0));
        assert!(scored.values().all(|m| (0.0..=1.0).contains(&m.score)));
    }

    #[test]
    fn test_segments_use_top_level_max() {
        let mut t = table(&[("CA", counts(100, 40, 10, 2))]);
        t.get_mut("CA")
            .unwrap()
            .segments
            .insert("Public".into(), counts(10, 2, 1, 0));

        let scored = score(&t);
        // Segment raw = 0.5*0.2 + 0.4*0.5 = 0.3, normalized against CA's 0.32.
        assert!(approx(scored["CA"].segments["Public"].score, 0.9375));
    }

    #[test]
    fn test_global_max_ignores_segments() {
        let mut t = table(&[("CA", counts(10, 1, 0, 0))]);
        t.get_mut("CA")
            .unwrap()
            .segments
            .insert("Public".into(), counts(1, 1, 1, 1));
        assert!(approx(global_max(&t), 0.05));
        assert_eq!(score(&t)["CA"].segments["Public"].score, 1.0);
    }
}
