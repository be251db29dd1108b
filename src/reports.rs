//! The fixed catalog of emailed reports and the files they land in.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Inner entry every archived export carries.
pub const ARCHIVE_ENTRY_NAME: &str = "hubspot-export-summary.csv";

/// How an export's bytes arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// The download is the CSV itself.
    Raw,
    /// The download is a zip holding [`ARCHIVE_ENTRY_NAME`].
    Archived,
}

/// The counter a canonical file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Calls,
    Connects,
    Customers,
    Discos,
    Deals,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Calls,
        Category::Connects,
        Category::Customers,
        Category::Discos,
        Category::Deals,
    ];

    /// Deal exports carry their own classification column; everything else
    /// is an activity export classified through the role lookup.
    pub fn is_deal(self) -> bool {
        matches!(self, Category::Deals)
    }

    /// Only the deals file may be missing at aggregation time.
    pub fn is_required(self) -> bool {
        !self.is_deal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Calls => "calls",
            Category::Connects => "connects",
            Category::Customers => "customers",
            Category::Discos => "discos",
            Category::Deals => "deals",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emailed report: the subject it arrives under and where it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSpec {
    pub name: &'static str,
    pub canonical_filename: &'static str,
    pub kind: ReportKind,
    pub category: Category,
}

static REPORTS: &[ReportSpec] = &[
    ReportSpec {
        name: "Calls by State",
        canonical_filename: "calls.csv",
        kind: ReportKind::Archived,
        category: Category::Calls,
    },
    ReportSpec {
        name: "Discos Scheduled by State",
        canonical_filename: "discos.csv",
        kind: ReportKind::Archived,
        category: Category::Discos,
    },
    ReportSpec {
        name: "Closed Won by State",
        canonical_filename: "customers.csv",
        kind: ReportKind::Archived,
        category: Category::Customers,
    },
    ReportSpec {
        name: "Connects by State",
        canonical_filename: "connects.csv",
        kind: ReportKind::Archived,
        category: Category::Connects,
    },
    ReportSpec {
        name: "Deals by Name",
        canonical_filename: "deals.csv",
        kind: ReportKind::Raw,
        category: Category::Deals,
    },
];

/// Every report the pipeline knows about.
pub fn catalog() -> &'static [ReportSpec] {
    REPORTS
}

pub fn find(name: &str) -> Option<&'static ReportSpec> {
    REPORTS.iter().find(|r| r.name == name)
}

pub fn report_names() -> Vec<&'static str> {
    REPORTS.iter().map(|r| r.name).collect()
}

/// Canonical file location for each category under `data_dir`.
pub fn canonical_files(data_dir: &Path) -> BTreeMap<Category, PathBuf> {
    REPORTS
        .iter()
        .map(|r| (r.category, data_dir.join(r.canonical_filename)))
        .collect()
}
