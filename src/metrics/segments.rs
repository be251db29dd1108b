use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::reports::Category;

/// Which segments exist and how rows are assigned to them.
///
/// Deal files name their segment directly in `classification_column`.
/// Activity files carry a role (the assignee) in `role_column`, which `roles`
/// maps to a segment. Anything that does not land on a name in `segments` is
/// unclassified and only counts toward the region total.
///
/// Loaded from JSON; every field is optional:
/// ```json
/// {
///   "segments": ["Public", "Charter"],
///   "classification_column": "School Type",
///   "role_column": "Activity assigned to",
///   "roles": { "Dana Reyes": "Public", "Sam Ortiz": "Charter" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentMap {
    pub segments: Vec<String>,
    pub classification_column: String,
    pub role_column: String,
    pub roles: HashMap<String, String>,
}

impl Default for SegmentMap {
    fn default() -> Self {
        Self {
            segments: vec!["Public".to_string(), "Charter".to_string()],
            classification_column: "School Type".to_string(),
            role_column: "Activity assigned to".to_string(),
            roles: HashMap::new(),
        }
    }
}

impl SegmentMap {
    /// Loads the map from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read segment map {path}"))?;
        let map: SegmentMap = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse segment map {path}"))?;

        for (role, segment) in &map.roles {
            if map.recognize(segment).is_none() {
                warn!(role = %role, segment = %segment, "Role maps to an unknown segment and will be unclassified");
            }
        }
        Ok(map)
    }

    /// The configured segment name matching `name`, ignoring case and
    /// surrounding whitespace.
    pub fn recognize(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.segments
            .iter()
            .find(|s| s.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Header of the column that classifies rows of `category`.
    pub fn column_for(&self, category: Category) -> &str {
        if category.is_deal() {
            &self.classification_column
        } else {
            &self.role_column
        }
    }

    /// Segment for a raw classification cell, or `None` if unclassified.
    pub fn classify(&self, category: Category, raw: &str) -> Option<&str> {
        if category.is_deal() {
            self.recognize(raw)
        } else {
            self.roles
                .get(raw.trim())
                .and_then(|segment| self.recognize(segment))
        }
    }
}
