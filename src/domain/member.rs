//! Canonical contributor records aggregated from ledger entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A canonical contributor, folded together from one or more ledger
/// entries across events.
///
/// `member_code` is the aggregation key; comparison is case-insensitive
/// and trimmed (see [`Member::normalized_code`]). Scalar fields are merged
/// by the longest-non-empty-value rule in [`crate::aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Globally unique, stable contributor code (e.g. `MC000042`).
    #[serde(default)]
    pub member_code: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Initial prefix (e.g. `"A."`).
    #[serde(default)]
    pub initial: String,
    /// Name without the initial prefix.
    #[serde(default)]
    pub base_name: String,
    /// Initial-prefixed full name.
    #[serde(default)]
    pub full_name: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: String,
    /// Postal address.
    #[serde(default)]
    pub address: String,
    /// Town name.
    #[serde(default)]
    pub town: String,
    /// Town identifier, where the town is a known master record.
    #[serde(default)]
    pub town_id: String,
    /// Street within the town.
    #[serde(default)]
    pub street: String,
    /// Relationship to the event family (e.g. `"uncle"`).
    #[serde(default)]
    pub relationship: String,
    /// Name of the relative through whom the relationship holds.
    #[serde(default)]
    pub relation_name: String,
    /// Education details.
    #[serde(default)]
    pub education: String,
    /// Profession details.
    #[serde(default)]
    pub profession: String,
    /// Most recent contribution amount.
    #[serde(default)]
    pub amount: f64,
    /// Most recent denomination breakdown (note value → count).
    #[serde(default)]
    pub denominations: BTreeMap<String, u32>,
    /// Maternal-uncle flag (ceremonially significant contributor).
    #[serde(default)]
    pub is_maternal_uncle: bool,
    /// Free-form notes, newline-joined across merges.
    #[serde(default)]
    pub notes: String,
    /// Event through which the member was first recorded.
    #[serde(default)]
    pub source_event_id: String,
}

impl Member {
    /// Aggregation key: trimmed, lowercased member code.
    #[must_use]
    pub fn normalized_code(&self) -> String {
        self.member_code.trim().to_lowercase()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn normalized_code_trims_and_lowercases() {
        let member = Member {
            member_code: "  MC000007 ".to_string(),
            ..Member::default()
        };
        assert_eq!(member.normalized_code(), "mc000007");
    }

    #[test]
    fn sparse_member_deserializes_with_defaults() {
        let Ok(member) =
            serde_json::from_str::<Member>(r#"{"memberCode":"MC000001","name":"Ramasamy"}"#)
        else {
            panic!("sparse member should deserialize");
        };
        assert_eq!(member.amount, 0.0);
        assert!(member.denominations.is_empty());
        assert!(!member.is_maternal_uncle);
    }
}
