//! Per-column value labels.
//!
//! Billetweb encodes several statuses as numeric strings (`order_paid = "1"`).
//! [`ValueFormatter`] turns such codes into readable labels for display.
//! Unknown columns and unknown codes pass through unchanged.

use std::collections::{BTreeMap, HashMap};

/// Mapping from raw cell value to display label for one column.
pub type ValueMapping = BTreeMap<String, String>;

/// Registry of per-column value mappings.
///
/// Lookups are exact string matches: `"1"` and `"01"` are different codes.
#[derive(Debug, Clone, Default)]
pub struct ValueFormatter {
    mappings: HashMap<String, ValueMapping>,
}

impl ValueFormatter {
    /// Creates a formatter with no mappings.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a formatter preloaded with the Billetweb status tables
    /// (`order_paid`, `order_accreditation`, `used`).
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut formatter = Self::empty();
        formatter.register("order_paid", mapping(&[("0", "Non payé"), ("1", "Payé")]));
        formatter.register(
            "order_accreditation",
            mapping(&[
                ("0", "Non applicable"),
                ("1", "En attente"),
                ("2", "Refusé"),
                ("3", "Accepté"),
            ]),
        );
        formatter.register(
            "used",
            mapping(&[("0", "non composté"), ("1", "Composté"), ("2", "Sorti")]),
        );
        formatter
    }

    /// Merges `entries` into the mapping of `column`. New entries override
    /// existing ones with the same raw value; other existing entries stay.
    pub fn register(&mut self, column: &str, entries: ValueMapping) {
        self.mappings
            .entry(column.to_string())
            .or_default()
            .extend(entries);
    }

    /// Returns the label for `raw` in `column`, or `raw` itself.
    #[must_use]
    pub fn format<'a>(&'a self, column: &str, raw: &'a str) -> &'a str {
        self.mappings
            .get(column)
            .and_then(|m| m.get(raw))
            .map_or(raw, String::as_str)
    }

    /// Snapshot of every registered mapping, sorted by column.
    #[must_use]
    pub fn mappings(&self) -> BTreeMap<String, ValueMapping> {
        self.mappings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn mapping(pairs: &[(&str, &str)]) -> ValueMapping {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn known_code_maps_to_label() {
        let f = ValueFormatter::with_defaults();
        assert_eq!(f.format("order_paid", "1"), "Payé");
        assert_eq!(f.format("order_paid", "0"), "Non payé");
        assert_eq!(f.format("used", "2"), "Sorti");
        assert_eq!(f.format("order_accreditation", "3"), "Accepté");
    }

    #[test]
    fn unknown_code_passes_through() {
        let f = ValueFormatter::with_defaults();
        assert_eq!(f.format("order_paid", "9"), "9");
        assert_eq!(f.format("order_paid", ""), "");
    }

    #[test]
    fn unmapped_column_passes_through() {
        let f = ValueFormatter::with_defaults();
        assert_eq!(f.format("email", "x@y.com"), "x@y.com");
    }

    #[test]
    fn lookup_is_exact_string_match() {
        let f = ValueFormatter::with_defaults();
        assert_eq!(f.format("order_paid", "01"), "01");
        assert_eq!(f.format("order_paid", "1.0"), "1.0");
    }

    #[test]
    fn register_merges_into_existing_table() {
        let mut f = ValueFormatter::with_defaults();
        f.register(
            "order_paid",
            mapping(&[("1", "Paid"), ("2", "Refunded")]),
        );
        assert_eq!(f.format("order_paid", "0"), "Non payé");
        assert_eq!(f.format("order_paid", "1"), "Paid");
        assert_eq!(f.format("order_paid", "2"), "Refunded");
    }

    #[test]
    fn register_creates_new_table() {
        let mut f = ValueFormatter::empty();
        f.register("custom.status", mapping(&[("0", "Inactif"), ("1", "Actif")]));
        assert_eq!(f.format("custom.status", "1"), "Actif");
        assert_eq!(f.mappings().len(), 1);
    }

    #[test]
    fn instances_are_independent() {
        let mut a = ValueFormatter::with_defaults();
        let b = ValueFormatter::with_defaults();
        a.register("order_paid", mapping(&[("1", "Paid")]));
        assert_eq!(b.format("order_paid", "1"), "Payé");
    }
}
