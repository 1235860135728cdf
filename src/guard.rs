//! Duplicate-contributor rejection.
//!
//! Runs synchronously against the freshest local snapshot before any remote
//! call. Hard failure, never retried: the write is refused with no partial
//! state change.

use crate::allocator;
use crate::domain::LedgerEntry;
use crate::error::SyncError;

/// Validates a candidate entry against the full ledger.
///
/// Expense and change entries are exempt. For contributions:
///
/// 1. The phone number, when present, must not already belong to a
///    differently-named entry in *any* event — one number must never
///    silently represent two distinct contributors.
/// 2. The normalized full name must not already appear in the same event.
///
/// The phone check runs first: a same-name, same-phone duplicate passes it
/// and is then rejected by the name check, so the caller sees the name
/// reason.
///
/// # Errors
///
/// [`SyncError::DuplicatePhone`] or [`SyncError::DuplicateName`] on
/// collision.
pub fn check_new_entry(entries: &[LedgerEntry], candidate: &LedgerEntry) -> Result<(), SyncError> {
    if !candidate.is_contribution() {
        return Ok(());
    }

    let candidate_name = candidate.normalized_full_name();
    let candidate_phone = candidate.phone.trim();

    if !candidate_phone.is_empty() {
        let bound = entries.iter().find(|existing| {
            existing.phone.trim() == candidate_phone
                && existing.normalized_full_name() != candidate_name
        });
        if let Some(existing) = bound {
            return Err(SyncError::DuplicatePhone {
                phone: candidate_phone.to_string(),
                existing_name: existing.full_name(),
            });
        }
    }

    let event_id = allocator::normalize_id(&candidate.event_id);
    let clash = entries.iter().any(|existing| {
        allocator::normalize_id(&existing.event_id) == event_id
            && existing.normalized_full_name() == candidate_name
    });
    if clash {
        return Err(SyncError::DuplicateName {
            name: candidate_name,
            event_id,
        });
    }

    Ok(())
}
