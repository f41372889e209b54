//! Heuristic column mapping.
//!
//! Pre-fills a header → canonical-field mapping from ordered substring
//! patterns. The result is advisory: the caller may override any entry, and
//! an unmapped header never blocks an import.

use std::collections::HashSet;

/// Ordered substring patterns for one canonical field. Patterns are matched
/// against case-folded, trimmed headers.
#[derive(Debug, Clone, Copy)]
pub struct FieldPatterns {
    pub field: &'static str,
    pub patterns: &'static [&'static str],
}

/// Advisory header → canonical-field mapping, in header order.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    entries: Vec<(String, Option<String>)>,
}

impl ColumnMapping {
    /// Map headers to canonical fields. For each header the fields are tried
    /// in the given order and the first one whose pattern list matches wins;
    /// a field already claimed by an earlier header is never reassigned.
    pub fn auto(headers: &[String], fields: &[FieldPatterns]) -> Self {
        let mut claimed: HashSet<&str> = HashSet::new();
        let entries = headers
            .iter()
            .map(|header| {
                let folded = header.trim().to_lowercase();
                let matched = fields
                    .iter()
                    .filter(|fp| !claimed.contains(fp.field))
                    .find(|fp| fp.patterns.iter().any(|p| folded.contains(p)));
                let field = matched.map(|fp| {
                    claimed.insert(fp.field);
                    fp.field.to_string()
                });
                (header.clone(), field)
            })
            .collect();
        Self { entries }
    }

    /// Header currently assigned to `field`, if any.
    pub fn header_for(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, f)| f.as_deref() == Some(field))
            .map(|(h, _)| h.as_str())
    }

    /// Override the assignment for a header. Assigning a field that another
    /// header holds steals it from that header.
    pub fn set(&mut self, header: &str, field: Option<&str>) {
        if let Some(field) = field {
            for (_, f) in self.entries.iter_mut() {
                if f.as_deref() == Some(field) {
                    *f = None;
                }
            }
        }
        if let Some(entry) = self.entries.iter_mut().find(|(h, _)| h == header) {
            entry.1 = field.map(str::to_string);
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(h, f)| (h.as_str(), f.as_deref()))
    }
}
