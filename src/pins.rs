//! Approval PIN issuance, validation, and consumption.
//!
//! The product contract is deliberate: a PIN's textual validity never
//! expires. Consumption records a usage event rather than revoking the
//! code, so [`validate`] keeps returning `true` after a consume and every
//! further consume appends another audit record carrying the same pin
//! value.

use std::collections::HashSet;

use chrono::Utc;
use rand::Rng;

use crate::domain::{Event, PinAction, PinRecord};
use crate::error::SyncError;

/// Default number of PINs issued per event.
pub const DEFAULT_PIN_COUNT: usize = 10;

/// Generates `count` unique random 4-digit codes as unused records.
///
/// The caller replaces the event's prior pin set with the result; the
/// coordinator requires explicit confirmation first since distributed
/// codes become invalid.
///
/// # Errors
///
/// [`SyncError::Validation`] when `count` exceeds the 10,000 possible
/// 4-digit codes.
pub fn generate(count: usize) -> Result<Vec<PinRecord>, SyncError> {
    if count > 10_000 {
        return Err(SyncError::Validation(format!(
            "cannot issue {count} unique 4-digit pins"
        )));
    }

    let mut rng = rand::thread_rng();
    let mut seen = HashSet::with_capacity(count);
    let mut records = Vec::with_capacity(count);
    while records.len() < count {
        let code = format!("{:04}", rng.gen_range(0..10_000u32));
        if seen.insert(code.clone()) {
            records.push(PinRecord::fresh(code));
        }
    }
    Ok(records)
}

/// Textual validity check: `true` iff any issued record matches, used or
/// not.
#[must_use]
pub fn validate(event: &Event, candidate: &str) -> bool {
    let candidate = candidate.trim();
    !candidate.is_empty() && event.approval_pins.iter().any(|r| r.pin == candidate)
}

/// Records a usage event for the given PIN.
///
/// The first unused matching record is marked used with the audit fields
/// set. When every matching record is already used, an additional record
/// with the same pin value is appended — a second usage event, not a new
/// PIN.
///
/// # Errors
///
/// [`SyncError::PinMismatch`] when no issued record matches textually.
pub fn consume(
    event: &mut Event,
    pin: &str,
    entry_id: &str,
    action: PinAction,
) -> Result<(), SyncError> {
    let pin = pin.trim();
    if !validate(event, pin) {
        return Err(SyncError::PinMismatch);
    }

    let usage = PinRecord {
        pin: pin.to_string(),
        used: true,
        used_by: Some(entry_id.to_string()),
        used_at: Some(Utc::now()),
        used_for: Some(action),
    };

    if let Some(record) = event
        .approval_pins
        .iter_mut()
        .find(|r| r.pin == pin && !r.used)
    {
        *record = usage;
    } else {
        event.approval_pins.push(usage);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn event_with_pins(pins: &[&str]) -> Event {
        Event {
            id: "0001".to_string(),
            approval_pins: pins
                .iter()
                .map(|p| PinRecord::fresh((*p).to_string()))
                .collect(),
            ..Event::default()
        }
    }

    #[test]
    fn generate_produces_unique_four_digit_codes() {
        let Ok(records) = generate(DEFAULT_PIN_COUNT) else {
            panic!("generation failed");
        };
        assert_eq!(records.len(), 10);
        let codes: HashSet<&str> = records.iter().map(|r| r.pin.as_str()).collect();
        assert_eq!(codes.len(), 10);
        for record in &records {
            assert_eq!(record.pin.len(), 4);
            assert!(record.pin.chars().all(|c| c.is_ascii_digit()));
            assert!(!record.used);
        }
    }

    #[test]
    fn generate_rejects_impossible_counts() {
        assert!(generate(10_001).is_err());
    }

    #[test]
    fn validate_matches_used_and_unused_records() {
        let mut event = event_with_pins(&["1234"]);
        assert!(validate(&event, "1234"));
        assert!(!validate(&event, "0000"));
        assert!(!validate(&event, ""));

        let Ok(()) = consume(&mut event, "1234", "0007", PinAction::Delete) else {
            panic!("consume failed");
        };
        // Textual validity persists after consumption.
        assert!(validate(&event, "1234"));
    }

    #[test]
    fn consume_records_audit_fields() {
        let mut event = event_with_pins(&["1234", "5678"]);
        let Ok(()) = consume(&mut event, "1234", "0003", PinAction::Delete) else {
            panic!("consume failed");
        };
        let Some(record) = event.approval_pins.iter().find(|r| r.pin == "1234") else {
            panic!("record missing");
        };
        assert!(record.used);
        assert_eq!(record.used_by.as_deref(), Some("0003"));
        assert_eq!(record.used_for, Some(PinAction::Delete));
        assert!(record.used_at.is_some());
    }

    #[test]
    fn second_consume_appends_usage_without_new_pin() {
        let mut event = event_with_pins(&["1234"]);
        let Ok(()) = consume(&mut event, "1234", "0003", PinAction::Delete) else {
            panic!("first consume failed");
        };
        let Ok(()) = consume(&mut event, "1234", "0009", PinAction::Edit) else {
            panic!("second consume failed");
        };

        let usages: Vec<&PinRecord> = event
            .approval_pins
            .iter()
            .filter(|r| r.pin == "1234")
            .collect();
        assert_eq!(usages.len(), 2);
        assert!(usages.iter().all(|r| r.used));
        let kinds: Vec<Option<PinAction>> = usages.iter().map(|r| r.used_for).collect();
        assert!(kinds.contains(&Some(PinAction::Delete)));
        assert!(kinds.contains(&Some(PinAction::Edit)));
    }

    #[test]
    fn consume_unknown_pin_fails_closed() {
        let mut event = event_with_pins(&["1234"]);
        let result = consume(&mut event, "9999", "0001", PinAction::Expense);
        assert!(matches!(result, Err(SyncError::PinMismatch)));
        assert_eq!(event.approval_pins.len(), 1);
    }
}
