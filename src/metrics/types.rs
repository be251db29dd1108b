//! Data types used by the aggregation pipeline.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::reports::Category;

/// One parsed row of a canonical file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRow {
    pub region: String,
    pub count: u64,
    /// Raw classification cell (school type or role), if the file has one.
    pub classification: Option<String>,
}

/// Per-category counters for a region or segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub calls: u64,
    pub connects: u64,
    pub customers: u64,
    pub discos: u64,
    pub deals: u64,
}

impl Counts {
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Calls => self.calls,
            Category::Connects => self.connects,
            Category::Customers => self.customers,
            Category::Discos => self.discos,
            Category::Deals => self.deals,
        }
    }

    pub fn add(&mut self, category: Category, count: u64) {
        let slot = match category {
            Category::Calls => &mut self.calls,
            Category::Connects => &mut self.connects,
            Category::Customers => &mut self.customers,
            Category::Discos => &mut self.discos,
            Category::Deals => &mut self.deals,
        };
        *slot = slot.saturating_add(count);
    }
}

/// Accumulated counters for one region, before scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionTotals {
    pub totals: Counts,
    pub segments: BTreeMap<String, Counts>,
}

/// Region key → accumulated counters. Output of the accumulation pass.
pub type RegionTable = BTreeMap<String, RegionTotals>;

/// Scored counters for one segment of a region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentMetrics {
    #[serde(flatten)]
    pub counts: Counts,
    pub score: f64,
}

/// Scored counters for a region, serialized as one entry of `state_metrics.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMetrics {
    #[serde(flatten)]
    pub counts: Counts,
    pub score: f64,
    pub segments: BTreeMap<String, SegmentMetrics>,
}

/// Region key → scored metrics. Output of the scoring pass.
pub type MetricsTable = BTreeMap<String, RegionMetrics>;
