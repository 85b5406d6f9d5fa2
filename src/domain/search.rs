//! Substring search over flattened attendee columns.

use super::AttendeeRecord;

/// Returns the records matching `query`, in their original order.
///
/// A blank (empty or whitespace-only) query returns every record. Otherwise a
/// record matches when any of `searchable_columns` holds a value whose
/// lowercase form contains the lowercased query. The query itself is not
/// trimmed. Columns absent from a record never match, and neither does a
/// record that fails to flatten within `max_depth`.
#[must_use]
pub fn filter_attendees<'a>(
    records: &'a [AttendeeRecord],
    query: &str,
    searchable_columns: &[String],
    max_depth: usize,
) -> Vec<&'a AttendeeRecord> {
    if query.trim().is_empty() {
        return records.iter().collect();
    }
    let needle = query.to_lowercase();

    records
        .iter()
        .filter(|record| {
            let flat = match record.flat(max_depth) {
                Ok(flat) => flat,
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "skipping unflattenable record");
                    return false;
                }
            };
            searchable_columns.iter().any(|column| {
                flat.get(column)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            })
        })
        .collect()
}
