//! The in-memory canonical snapshot of all five collections.

use serde::{Deserialize, Serialize};

use super::entry::LedgerEntry;
use super::event::Event;
use super::member::Member;
use super::registrar::Registrar;
use super::settings::Settings;
use crate::allocator;

/// Everything the device knows, as one snapshot.
///
/// Held behind the coordinator's `RwLock`; each mutation edits the snapshot
/// and re-persists the touched collection wholesale (no partial local
/// writes, to avoid torn-write anomalies).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Active events.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Station personnel.
    #[serde(default)]
    pub registrars: Vec<Registrar>,
    /// Canonical contributors.
    #[serde(default)]
    pub members: Vec<Member>,
    /// All ledger entries, including those of deleted events.
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
    /// The settings document.
    #[serde(default)]
    pub settings: Settings,
}

impl Dataset {
    /// Normalizes identifiers in place: numeric ids become 4-digit
    /// zero-padded strings, matching what the remote service assigns.
    pub fn normalize(&mut self) {
        for event in &mut self.events {
            event.id = allocator::normalize_id(&event.id);
        }
        for registrar in &mut self.registrars {
            registrar.id = allocator::normalize_id(&registrar.id);
        }
        for entry in &mut self.entries {
            entry.id = allocator::normalize_id(&entry.id);
            entry.event_id = allocator::normalize_id(&entry.event_id);
        }
    }

    /// Finds an event by normalized id.
    #[must_use]
    pub fn find_event(&self, id: &str) -> Option<&Event> {
        let id = allocator::normalize_id(id);
        self.events.iter().find(|e| e.id == id)
    }

    /// Finds an event mutably by normalized id.
    pub fn find_event_mut(&mut self, id: &str) -> Option<&mut Event> {
        let id = allocator::normalize_id(id);
        self.events.iter_mut().find(|e| e.id == id)
    }

    /// All entries belonging to the given event, in stored order.
    #[must_use]
    pub fn entries_for_event(&self, event_id: &str) -> Vec<&LedgerEntry> {
        let event_id = allocator::normalize_id(event_id);
        self.entries
            .iter()
            .filter(|e| e.event_id == event_id)
            .collect()
    }

    /// Finds an entry by event id and serial.
    #[must_use]
    pub fn find_entry(&self, event_id: &str, id: &str) -> Option<&LedgerEntry> {
        let event_id = allocator::normalize_id(event_id);
        let id = allocator::normalize_id(id);
        self.entries
            .iter()
            .find(|e| e.event_id == event_id && e.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn normalize_zero_pads_numeric_ids() {
        let mut data = Dataset {
            events: vec![Event {
                id: "7".to_string(),
                ..Event::default()
            }],
            entries: vec![LedgerEntry {
                id: "12".to_string(),
                event_id: "7".to_string(),
                ..LedgerEntry::default()
            }],
            ..Dataset::default()
        };
        data.normalize();
        let Some(event) = data.events.first() else {
            panic!("event missing");
        };
        assert_eq!(event.id, "0007");
        let Some(entry) = data.entries.first() else {
            panic!("entry missing");
        };
        assert_eq!(entry.id, "0012");
        assert_eq!(entry.event_id, "0007");
    }

    #[test]
    fn lookups_accept_unpadded_ids() {
        let mut data = Dataset::default();
        data.events.push(Event {
            id: "0003".to_string(),
            ..Event::default()
        });
        data.entries.push(LedgerEntry {
            id: "0001".to_string(),
            event_id: "0003".to_string(),
            ..LedgerEntry::default()
        });

        assert!(data.find_event("3").is_some());
        assert_eq!(data.entries_for_event("3").len(), 1);
        assert!(data.find_entry("3", "1").is_some());
    }
}
