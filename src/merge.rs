//! Shallow record merging for the write-through re-fetch step.
//!
//! After a successful remote mutation the coordinator adopts the fetched
//! record as the base and re-applies the locally edited fields on top, so
//! a fetch that races another station's write never silently discards the
//! edit that was just made.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SyncError;

/// Overlays `edited` onto `fetched` field by field.
///
/// Top-level fields only. An edited field is skipped when its JSON form
/// is null, an empty string, an empty array, or an empty object; the
/// fetched value wins for those, since an empty local field usually means
/// "not touched" rather than "cleared".
///
/// # Errors
///
/// [`SyncError::Validation`] when either record fails JSON round-tripping,
/// which indicates a malformed record rather than a merge conflict.
pub fn overlay_record<T>(fetched: &T, edited: &T) -> Result<T, SyncError>
where
    T: Serialize + DeserializeOwned,
{
    let mut base = serde_json::to_value(fetched)
        .map_err(|e| SyncError::Validation(format!("record merge: encode base: {e}")))?;
    let over = serde_json::to_value(edited)
        .map_err(|e| SyncError::Validation(format!("record merge: encode overlay: {e}")))?;
    if let (Value::Object(base_map), Value::Object(over_map)) = (&mut base, over) {
        for (key, value) in over_map {
            if is_absent(&value) {
                continue;
            }
            base_map.insert(key, value);
        }
    }
    serde_json::from_value(base)
        .map_err(|e| SyncError::Validation(format!("record merge: decode: {e}")))
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::LedgerEntry;

    fn entry(id: &str, name: &str, town: &str, amount: f64) -> LedgerEntry {
        LedgerEntry {
            id: id.to_string(),
            event_id: "0001".to_string(),
            name: name.to_string(),
            town: town.to_string(),
            amount,
            ..LedgerEntry::default()
        }
    }

    #[test]
    fn edited_fields_win_over_fetched() {
        let fetched = entry("0003", "Murugan", "Madurai", 500.0);
        let edited = entry("0003", "Murugan M", "", 750.0);
        let Ok(merged) = overlay_record(&fetched, &edited) else {
            panic!("merge failed");
        };
        assert_eq!(merged.name, "Murugan M");
        assert_eq!(merged.amount, 750.0);
        // Empty edited field does not erase the fetched value.
        assert_eq!(merged.town, "Madurai");
    }

    #[test]
    fn numeric_zero_is_not_treated_as_absent() {
        let fetched = entry("0003", "Murugan", "Madurai", 500.0);
        let mut edited = fetched.clone();
        edited.kind = Some(crate::domain::EntryKind::Change);
        edited.amount = 0.0;
        let Ok(merged) = overlay_record(&fetched, &edited) else {
            panic!("merge failed");
        };
        assert_eq!(merged.amount, 0.0);
    }
}
