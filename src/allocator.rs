//! Serial and identifier allocation.
//!
//! All ids here are client-computed `max + 1` over the freshest snapshot
//! available. Under concurrent stations this is a documented race window:
//! the coordinator re-fetches the remote collection immediately before
//! allocating (re-fetch-then-allocate), which narrows the window but does
//! not close it. A strict guarantee needs server-side allocation.

use crate::domain::{Event, LedgerEntry, Member};

/// Fixed prefix for generated member codes.
pub const MEMBER_CODE_PREFIX: &str = "MC";

/// Formats a number as a 4-digit zero-padded string (`7` → `"0007"`).
#[must_use]
pub fn pad4(n: u64) -> String {
    format!("{n:04}")
}

/// Formats a member-code suffix as 6 digits (`42` → `"000042"`).
#[must_use]
pub fn pad6(n: u64) -> String {
    format!("{n:06}")
}

/// Normalizes an identifier: purely numeric ids are zero-padded to 4
/// digits; anything else passes through trimmed.
#[must_use]
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(n) => pad4(n),
        Err(_) => trimmed.to_string(),
    }
}

/// Computes the next serial for a new entry in the given event.
///
/// Scans the event's entries, takes `max(serial) + 1`, and zero-pads to 4
/// digits. Entries lacking an explicit serial get a synthetic sequence
/// position from sort order (serial when present, else numeric id) so that
/// mixed legacy/new data still orders consistently. An event with no
/// entries starts at `len + 1`, i.e. `"0001"`.
#[must_use]
pub fn next_ledger_serial(entries: &[LedgerEntry], event_id: &str) -> String {
    let event_id = normalize_id(event_id);
    let mut scoped: Vec<&LedgerEntry> = entries
        .iter()
        .filter(|e| normalize_id(&e.event_id) == event_id)
        .collect();

    if scoped.is_empty() {
        return pad4(scoped.len() as u64 + 1);
    }

    scoped.sort_by_key(|e| e.serial().unwrap_or(u32::MAX));

    let mut max = 0u32;
    for (idx, entry) in scoped.iter().enumerate() {
        let serial = entry
            .serial()
            .unwrap_or_else(|| u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(1));
        max = max.max(serial);
    }
    pad4(u64::from(max) + 1)
}

/// Computes the next member code, unless the caller supplied one.
///
/// A non-empty `supplied` value is a manual override and is used as-is.
/// Otherwise codes matching [`MEMBER_CODE_PREFIX`] are scanned, the numeric
/// suffix parsed, and `prefix + zero-pad(max + 1, 6)` returned.
#[must_use]
pub fn next_member_code(members: &[Member], supplied: Option<&str>) -> String {
    if let Some(code) = supplied {
        let code = code.trim();
        if !code.is_empty() {
            return code.to_string();
        }
    }

    let max = members
        .iter()
        .filter_map(|m| {
            m.member_code
                .trim()
                .to_uppercase()
                .strip_prefix(MEMBER_CODE_PREFIX)
                .and_then(|suffix| suffix.parse::<u64>().ok())
        })
        .max()
        .unwrap_or(0);

    format!("{MEMBER_CODE_PREFIX}{}", pad6(max + 1))
}

/// Computes the next id for an entity collection when the remote service
/// did not supply one: `max(numeric ids) + 1`, 4-digit zero-padded.
#[must_use]
pub fn next_entity_id<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = ids
        .into_iter()
        .filter_map(|id| id.trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    pad4(max + 1)
}

/// Computes the next event id.
///
/// Considers both existing event ids and every `event_id` seen on ledger
/// entries, so an id of a deleted event (whose entries are retained) is
/// never reassigned.
#[must_use]
pub fn next_event_id(events: &[Event], entries: &[LedgerEntry]) -> String {
    let max_event = events
        .iter()
        .filter_map(|e| e.id.trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    let max_entry = entries
        .iter()
        .filter_map(|e| e.event_id.trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    pad4(max_event.max(max_entry) + 1)
}
