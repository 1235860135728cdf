//! Ledger entries: one contribution, expense, or currency exchange per record.
//!
//! The entry id doubles as the per-event serial number. Historical datasets
//! used several field names for it (`serialNumber`, `serialNo`, `sNo`); all
//! are accepted on read and re-emitted as `id`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Non-contribution entry kinds.
///
/// A plain contribution carries no kind (`None` on the wire). Expenses are
/// negative-amount entries; a "change" entry records a balanced currency
/// exchange with a zero net amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Outgoing money; amount is negative. PIN-gated.
    Expense,
    /// Zero-sum denomination exchange at the cash table.
    Change,
}

/// One ledger record tied to an event and an intake station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Per-event serial, 4-digit zero-padded. Unique within `event_id`,
    /// not globally.
    #[serde(default, alias = "serialNumber", alias = "serialNo", alias = "sNo")]
    pub id: String,
    /// Event this entry belongs to. May reference a deleted event.
    #[serde(default)]
    pub event_id: String,
    /// Intake station (table) identifier.
    #[serde(default)]
    pub table: String,
    /// Contributor code linking the entry to a canonical member.
    #[serde(default)]
    pub member_code: String,
    /// Contributor initial prefix.
    #[serde(default)]
    pub initial: String,
    /// Contributor name (without initial).
    #[serde(default)]
    pub name: String,
    /// Contributor town.
    #[serde(default)]
    pub town: String,
    /// Contributor phone.
    #[serde(default)]
    pub phone: String,
    /// Contributor address.
    #[serde(default)]
    pub address: String,
    /// Contributor street.
    #[serde(default)]
    pub street: String,
    /// Contributor education details.
    #[serde(default)]
    pub education: String,
    /// Contributor profession details.
    #[serde(default)]
    pub profession: String,
    /// Relationship to the event family.
    #[serde(default)]
    pub relationship: String,
    /// Signed amount: negative for expenses, zero for change, positive otherwise.
    #[serde(default)]
    pub amount: f64,
    /// Entry kind; `None` for an ordinary contribution.
    #[serde(default, rename = "type")]
    pub kind: Option<EntryKind>,
    /// Denomination breakdown: note value (as string) → note count.
    #[serde(default)]
    pub denominations: BTreeMap<String, u32>,
    /// Maternal-uncle flag.
    #[serde(default)]
    pub is_maternal_uncle: bool,
    /// Free-form note.
    #[serde(default)]
    pub note: String,
}

impl LedgerEntry {
    /// Initial-prefixed full name, e.g. `"A. Ramasamy"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        let initial = self.initial.trim();
        let name = self.name.trim();
        if initial.is_empty() {
            name.to_string()
        } else {
            format!("{initial} {name}")
        }
    }

    /// Duplicate-detection key: trimmed, lowercased full name.
    #[must_use]
    pub fn normalized_full_name(&self) -> String {
        self.full_name().to_lowercase()
    }

    /// Parses the serial from the id, if the entry carries one.
    #[must_use]
    pub fn serial(&self) -> Option<u32> {
        let digits = self.id.trim();
        if digits.is_empty() {
            None
        } else {
            digits.parse().ok()
        }
    }

    /// Composite key `eventId::id`, unique across the whole ledger.
    #[must_use]
    pub fn composite_key(&self) -> String {
        format!("{}::{}", self.event_id, self.id)
    }

    /// Total value of the denomination breakdown.
    ///
    /// Keys that are not numeric note values contribute nothing.
    #[must_use]
    pub fn denomination_total(&self) -> f64 {
        self.denominations
            .iter()
            .map(|(note, count)| {
                note.trim().parse::<f64>().unwrap_or(0.0) * f64::from(*count)
            })
            .sum()
    }

    /// Whether this entry participates in duplicate-contributor checks.
    ///
    /// Expenses and change entries are not contributions and are exempt.
    #[must_use]
    pub const fn is_contribution(&self) -> bool {
        self.kind.is_none()
    }
}
