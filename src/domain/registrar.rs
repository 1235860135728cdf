//! Registrar records: the personnel assigned to intake stations.

use serde::{Deserialize, Serialize};

/// Role a registrar performs at a station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Designation {
    /// Records entries at the station.
    #[default]
    Typist,
    /// Handles cash and verifies denominations.
    Cashier,
}

/// A person assignable to an intake station as typist or cashier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registrar {
    /// 4-digit zero-padded identifier.
    #[serde(default)]
    pub id: String,
    /// Full name.
    #[serde(default)]
    pub name: String,
    /// Postal address.
    #[serde(default)]
    pub address: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: String,
    /// Station role.
    #[serde(default)]
    pub designation: Designation,
    /// Whether the registrar may perform gated actions without a PIN holder present.
    #[serde(default)]
    pub permission: bool,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn designation_serializes_lowercase() {
        let registrar = Registrar {
            id: "0002".to_string(),
            name: "Valli".to_string(),
            designation: Designation::Cashier,
            ..Registrar::default()
        };
        let Ok(json) = serde_json::to_string(&registrar) else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"designation\":\"cashier\""));
    }

    #[test]
    fn missing_designation_defaults_to_typist() {
        let Ok(registrar) = serde_json::from_str::<Registrar>(r#"{"id":"1","name":"Kumar"}"#)
        else {
            panic!("sparse registrar should deserialize");
        };
        assert_eq!(registrar.designation, Designation::Typist);
    }
}
