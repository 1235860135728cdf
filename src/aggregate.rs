//! Folding ledger entries into canonical member records.
//!
//! Merge heuristic for scalar fields: the non-empty value wins, and when
//! both sides are non-empty the longer string wins (longer = more complete
//! data). Notes accumulate instead of overwriting. The whole aggregation is
//! idempotent: re-running it over the same inputs yields identical output.

use std::collections::HashMap;

use crate::domain::{LedgerEntry, Member};

/// Maps an entry's contributor fields onto the member shape, falling back
/// to `existing` per field where the entry is blank.
#[must_use]
pub fn member_from_entry(entry: &LedgerEntry, existing: Option<&Member>) -> Member {
    let base = existing.cloned().unwrap_or_default();
    let fallback = |entry_value: &str, existing_value: &str| -> String {
        let trimmed = entry_value.trim();
        if trimmed.is_empty() {
            existing_value.to_string()
        } else {
            trimmed.to_string()
        }
    };

    Member {
        member_code: fallback(&entry.member_code, &base.member_code),
        name: fallback(&entry.name, &base.name),
        initial: fallback(&entry.initial, &base.initial),
        base_name: fallback(&entry.name, &base.base_name),
        full_name: fallback(&entry.full_name(), &base.full_name),
        phone: fallback(&entry.phone, &base.phone),
        address: fallback(&entry.address, &base.address),
        town: fallback(&entry.town, &base.town),
        town_id: base.town_id.clone(),
        street: fallback(&entry.street, &base.street),
        relationship: fallback(&entry.relationship, &base.relationship),
        relation_name: base.relation_name.clone(),
        education: fallback(&entry.education, &base.education),
        profession: fallback(&entry.profession, &base.profession),
        amount: if entry.amount == 0.0 {
            base.amount
        } else {
            entry.amount
        },
        denominations: if entry.denominations.is_empty() {
            base.denominations.clone()
        } else {
            entry.denominations.clone()
        },
        is_maternal_uncle: entry.is_maternal_uncle || base.is_maternal_uncle,
        notes: fallback(&entry.note, &base.notes),
        source_event_id: fallback(&entry.event_id, &base.source_event_id),
    }
}

/// Merges two member records for the same code.
///
/// Scalar strings: longest non-empty wins. Notes: deduplicated and
/// newline-joined. Numeric/object fields: `incoming` when present, else
/// `existing`.
#[must_use]
pub fn merge_members(existing: &Member, incoming: &Member) -> Member {
    Member {
        member_code: longer(&existing.member_code, &incoming.member_code),
        name: longer(&existing.name, &incoming.name),
        initial: longer(&existing.initial, &incoming.initial),
        base_name: longer(&existing.base_name, &incoming.base_name),
        full_name: longer(&existing.full_name, &incoming.full_name),
        phone: longer(&existing.phone, &incoming.phone),
        address: longer(&existing.address, &incoming.address),
        town: longer(&existing.town, &incoming.town),
        town_id: longer(&existing.town_id, &incoming.town_id),
        street: longer(&existing.street, &incoming.street),
        relationship: longer(&existing.relationship, &incoming.relationship),
        relation_name: longer(&existing.relation_name, &incoming.relation_name),
        education: longer(&existing.education, &incoming.education),
        profession: longer(&existing.profession, &incoming.profession),
        amount: if incoming.amount == 0.0 {
            existing.amount
        } else {
            incoming.amount
        },
        denominations: if incoming.denominations.is_empty() {
            existing.denominations.clone()
        } else {
            incoming.denominations.clone()
        },
        is_maternal_uncle: existing.is_maternal_uncle || incoming.is_maternal_uncle,
        notes: join_notes(&existing.notes, &incoming.notes),
        source_event_id: longer(&existing.source_event_id, &incoming.source_event_id),
    }
}

/// Groups entries by normalized member code and folds each group into a
/// final member snapshot, seeded with any existing member sharing the code.
///
/// Entries without a member code cannot be tied to a canonical member and
/// are excluded. Output order follows first appearance in `entries`.
#[must_use]
pub fn members_from_entries(entries: &[LedgerEntry], existing: &[Member]) -> Vec<Member> {
    let by_code: HashMap<String, &Member> = existing
        .iter()
        .filter(|m| !m.normalized_code().is_empty())
        .map(|m| (m.normalized_code(), m))
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut folded: HashMap<String, Member> = HashMap::new();

    for entry in entries {
        let code = entry.member_code.trim().to_lowercase();
        if code.is_empty() {
            continue;
        }
        match folded.get(&code) {
            Some(current) => {
                let incoming = member_from_entry(entry, Some(current));
                let merged = merge_members(current, &incoming);
                folded.insert(code, merged);
            }
            None => {
                let seed = by_code.get(&code).copied();
                folded.insert(code.clone(), member_from_entry(entry, seed));
                order.push(code);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|code| folded.remove(&code))
        .collect()
}

fn longer(existing: &str, incoming: &str) -> String {
    let a = existing.trim();
    let b = incoming.trim();
    if a.is_empty() {
        b.to_string()
    } else if b.is_empty() || b.len() <= a.len() {
        a.to_string()
    } else {
        b.to_string()
    }
}

/// Newline-joins note fields, skipping blanks and exact duplicates.
fn join_notes(existing: &str, incoming: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for candidate in existing.split('\n').chain(incoming.split('\n')) {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !parts.contains(&candidate) {
            parts.push(candidate);
        }
    }
    parts.join("\n")
}
