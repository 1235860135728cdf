//! Process-wide configuration document: station assignments and defaults.
//!
//! Settings are loaded once at startup and merged at the document level on
//! save — top-level fields from the incoming document win when non-empty,
//! never a deep diff.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Personnel assigned to one intake station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationAssignment {
    /// Registrar id of the typist.
    #[serde(default)]
    pub typist: String,
    /// Registrar id of the cashier.
    #[serde(default)]
    pub cashier: String,
}

/// The single shared configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Event preselected at intake stations.
    #[serde(default)]
    pub default_event_id: String,
    /// Station id → assigned personnel.
    #[serde(default)]
    pub registrar_assignments: BTreeMap<String, StationAssignment>,
    /// Station id → printer identifier.
    #[serde(default)]
    pub printer_assignments: BTreeMap<String, String>,
    /// Persistence driver label (informational; the engine always goes
    /// through the injected ports).
    #[serde(default)]
    pub storage_driver: String,
}

impl Settings {
    /// Hard-coded fallback used when neither remote nor local cache holds
    /// a settings document.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            storage_driver: "remote".to_string(),
            ..Self::default()
        }
    }

    /// Whether the document carries no data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.default_event_id.is_empty()
            && self.registrar_assignments.is_empty()
            && self.printer_assignments.is_empty()
            && self.storage_driver.is_empty()
    }

    /// Document-level merge: each top-level field of `incoming` replaces
    /// the existing value when non-empty.
    #[must_use]
    pub fn merged_with(&self, incoming: &Self) -> Self {
        Self {
            default_event_id: pick(&self.default_event_id, &incoming.default_event_id),
            registrar_assignments: if incoming.registrar_assignments.is_empty() {
                self.registrar_assignments.clone()
            } else {
                incoming.registrar_assignments.clone()
            },
            printer_assignments: if incoming.printer_assignments.is_empty() {
                self.printer_assignments.clone()
            } else {
                incoming.printer_assignments.clone()
            },
            storage_driver: pick(&self.storage_driver, &incoming.storage_driver),
        }
    }
}

fn pick(existing: &str, incoming: &str) -> String {
    if incoming.is_empty() {
        existing.to_string()
    } else {
        incoming.to_string()
    }
}
