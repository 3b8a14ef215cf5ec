//! Normalised emergency profile.
//!
//! This is the shape the classifier and the payload codec work on. List fields are always
//! present (possibly empty) so downstream logic never branches on presence. Lenient parsing of
//! raw patient documents into this shape lives in `emh-core`.

use crate::{BloodGroup, HealthId};
use serde::{Deserialize, Serialize};

/// Emergency-relevant subset of a patient record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyProfile {
    #[serde(default)]
    pub full_name: String,

    #[serde(default)]
    pub blood_group: BloodGroup,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default)]
    pub critical_allergies: Vec<String>,

    #[serde(default)]
    pub critical_conditions: Vec<String>,

    #[serde(default)]
    pub current_medications: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_emergency_contact: Option<EmergencyContact>,

    /// Additional contacts. Dropped first when a QR payload exceeds its size budget.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_emergency_contacts: Vec<EmergencyContact>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_doctor: Option<PrimaryDoctor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_id: Option<HealthId>,
}

impl EmergencyProfile {
    /// Creates an otherwise empty profile for the named patient.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    /// True when there is nothing clinically relevant to evaluate.
    pub fn is_clinically_empty(&self) -> bool {
        self.critical_allergies.is_empty()
            && self.critical_conditions.is_empty()
            && self.current_medications.is_empty()
            && !self.blood_group.is_known()
    }
}

/// A person to call in an emergency.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The patient's primary doctor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryDoctor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
