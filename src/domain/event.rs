//! Event records and their approval PIN audit trail.
//!
//! A PIN's textual validity never expires; every consumption is recorded as
//! a usage event on the pin list instead of revoking the code. Legacy data
//! stores pins as bare strings; those are normalized to [`PinRecord`]s with
//! `used = false` at deserialization time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The action kind a consumed approval PIN authorized.
///
/// PINs gate three mutations only: recording an expense, an amount-reducing
/// edit, and a delete. Amount increases and ordinary creates never require
/// a PIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinAction {
    /// Approving a negative-amount expense entry.
    Expense,
    /// Approving an amount-reducing edit.
    Edit,
    /// Approving a ledger entry delete.
    Delete,
}

/// A single approval PIN with its usage audit fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawPin")]
pub struct PinRecord {
    /// 4-digit PIN code. Textual validity never expires.
    pub pin: String,
    /// Whether this record captured a usage event.
    pub used: bool,
    /// Ledger entry the usage was recorded against.
    pub used_by: Option<String>,
    /// When the usage was recorded.
    pub used_at: Option<DateTime<Utc>>,
    /// Which gated action the usage authorized.
    pub used_for: Option<PinAction>,
}

impl PinRecord {
    /// Creates an unused record for a freshly issued PIN.
    #[must_use]
    pub const fn fresh(pin: String) -> Self {
        Self {
            pin,
            used: false,
            used_by: None,
            used_at: None,
            used_for: None,
        }
    }
}

/// Wire shape accepted for a pin: either a structured record or a legacy
/// bare string from older datasets.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPin {
    Record {
        #[serde(default)]
        pin: String,
        #[serde(default)]
        used: bool,
        #[serde(default, rename = "usedBy")]
        used_by: Option<String>,
        #[serde(default, rename = "usedAt")]
        used_at: Option<DateTime<Utc>>,
        #[serde(default, rename = "usedFor")]
        used_for: Option<PinAction>,
    },
    Legacy(String),
}

impl From<RawPin> for PinRecord {
    fn from(raw: RawPin) -> Self {
        match raw {
            RawPin::Legacy(pin) => Self::fresh(pin),
            RawPin::Record {
                pin,
                used,
                used_by,
                used_at,
                used_for,
            } => Self {
                pin,
                used,
                used_by,
                used_at,
                used_for,
            },
        }
    }
}

/// A social event with its venue, organizer, and issued approval PINs.
///
/// Deleting an Event removes it from the active collection but never
/// deletes its ledger entries (audit retention).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// 4-digit zero-padded, globally unique identifier.
    #[serde(default)]
    pub id: String,
    /// Display name of the event.
    #[serde(default)]
    pub event_name: String,
    /// Event date (opaque display string, as entered).
    #[serde(default)]
    pub date: String,
    /// Event time (opaque display string).
    #[serde(default)]
    pub time: String,
    /// Venue name.
    #[serde(default)]
    pub venue: String,
    /// Town or locality of the venue.
    #[serde(default)]
    pub place: String,
    /// Organizer name.
    #[serde(default)]
    pub organizer: String,
    /// Organizer contact phone.
    #[serde(default)]
    pub organizer_phone: String,
    /// Whether the event is open for intake.
    #[serde(default)]
    pub permission: bool,
    /// Issued approval PINs, including per-usage audit records.
    #[serde(default)]
    pub approval_pins: Vec<PinRecord>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn legacy_bare_string_pin_normalizes_to_unused_record() {
        let json = r#"{"id":"0001","eventName":"Wedding","approvalPins":["4821","0933"]}"#;
        let Ok(event) = serde_json::from_str::<Event>(json) else {
            panic!("legacy event should deserialize");
        };
        assert_eq!(event.approval_pins.len(), 2);
        let Some(first) = event.approval_pins.first() else {
            panic!("expected a pin record");
        };
        assert_eq!(first.pin, "4821");
        assert!(!first.used);
        assert!(first.used_for.is_none());
    }

    #[test]
    fn structured_pin_record_round_trips() {
        let record = PinRecord {
            pin: "1234".to_string(),
            used: true,
            used_by: Some("0007".to_string()),
            used_at: Some(Utc::now()),
            used_for: Some(PinAction::Delete),
        };
        let Ok(json) = serde_json::to_string(&record) else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"usedFor\":\"delete\""));
        let Ok(back) = serde_json::from_str::<PinRecord>(&json) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, record);
    }

    #[test]
    fn mixed_legacy_and_structured_pins_coexist() {
        let json = r#"["1111",{"pin":"2222","used":true,"usedFor":"expense"}]"#;
        let Ok(pins) = serde_json::from_str::<Vec<PinRecord>>(json) else {
            panic!("mixed pin list should deserialize");
        };
        assert_eq!(pins.len(), 2);
        let Some(second) = pins.get(1) else {
            panic!("expected second record");
        };
        assert!(second.used);
        assert_eq!(second.used_for, Some(PinAction::Expense));
    }

    #[test]
    fn missing_optional_event_fields_default() {
        let Ok(event) = serde_json::from_str::<Event>(r#"{"id":"12"}"#) else {
            panic!("sparse event should deserialize");
        };
        assert_eq!(event.id, "12");
        assert!(event.approval_pins.is_empty());
        assert!(!event.permission);
    }
}
