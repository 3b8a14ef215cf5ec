//! Compact alias-keyed payload body and translation helpers.
//!
//! Responsibilities:
//! - Define the strict wire model for the body placed inside an envelope
//! - Translate between [`EmergencyProfile`] and the wire model
//! - Allow optional, low-priority fields to be dropped to meet a size budget
//!
//! Only the emergency subset of a profile is carried. Anything else is fetched from the
//! backend using the embedded health id.

use crate::codec::{DecodedPayload, OmittedField};
use crate::{DecodeError, EncodeError};
use chrono::{DateTime, Utc};
use emh_types::{BloodGroup, EmergencyContact, EmergencyProfile, HealthId, PrimaryDoctor};
use serde::{Deserialize, Serialize};

/// Alias-keyed body of a QR payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompactPayload {
    n: String,

    bg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    age: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    alg: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cc: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    med: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ec: Option<ContactWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sc: Vec<ContactWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    doc: Option<DoctorWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    nt: Option<String>,

    id: String,

    ts: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContactWire {
    n: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    r: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    p: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    e: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DoctorWire {
    n: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    h: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p: Option<String>,
}

impl CompactPayload {
    /// Build the compact body for `profile`, stamped with `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::MissingHealthId`] when the profile has no health id.
    pub fn from_profile(
        profile: &EmergencyProfile,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, EncodeError> {
        let id = profile
            .health_id
            .as_ref()
            .ok_or(EncodeError::MissingHealthId)?;

        Ok(Self {
            n: profile.full_name.clone(),
            bg: profile.blood_group.as_str().to_string(),
            age: profile.age,
            alg: profile.critical_allergies.clone(),
            cc: profile.critical_conditions.clone(),
            med: profile.current_medications.clone(),
            ec: profile
                .primary_emergency_contact
                .as_ref()
                .map(contact_to_wire),
            sc: profile
                .secondary_emergency_contacts
                .iter()
                .map(contact_to_wire)
                .collect(),
            doc: profile.primary_doctor.as_ref().map(|d| DoctorWire {
                n: d.name.clone(),
                h: d.hospital.clone(),
                p: d.phone.clone(),
            }),
            nt: profile.critical_notes.clone(),
            id: id.to_string(),
            ts: issued_at.timestamp_millis(),
        })
    }

    /// Drop an optional field. Returns false if the field was already absent.
    pub(crate) fn omit(&mut self, field: OmittedField) -> bool {
        match field {
            OmittedField::SecondaryContacts => !std::mem::take(&mut self.sc).is_empty(),
            OmittedField::CriticalNotes => self.nt.take().is_some(),
        }
    }

    pub(crate) fn to_json(&self) -> Result<String, EncodeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a revealed body.
    ///
    /// Uses `serde_path_to_error` so the failure names the offending alias key.
    pub(crate) fn from_json(json: &str) -> Result<Self, DecodeError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize::<_, CompactPayload>(&mut deserializer).map_err(|err| {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            DecodeError::CorruptBody(format!("body mismatch at {path}: {}", err.into_inner()))
        })
    }

    /// Translate the wire body back into domain types.
    pub(crate) fn into_decoded(self, version: u32) -> Result<DecodedPayload, DecodeError> {
        let health_id = HealthId::parse(&self.id)
            .map_err(|e| DecodeError::CorruptBody(format!("invalid id: {e}")))?;
        let issued_at = DateTime::<Utc>::from_timestamp_millis(self.ts)
            .ok_or_else(|| DecodeError::CorruptBody(format!("invalid ts: {}", self.ts)))?;

        let profile = EmergencyProfile {
            full_name: self.n,
            blood_group: BloodGroup::from_text(&self.bg),
            age: self.age,
            critical_allergies: self.alg,
            critical_conditions: self.cc,
            current_medications: self.med,
            primary_emergency_contact: self.ec.map(contact_from_wire),
            secondary_emergency_contacts: self.sc.into_iter().map(contact_from_wire).collect(),
            primary_doctor: self.doc.map(|d| PrimaryDoctor {
                name: d.n,
                hospital: d.h,
                phone: d.p,
            }),
            critical_notes: self.nt,
            health_id: Some(health_id.clone()),
        };

        Ok(DecodedPayload {
            profile,
            health_id,
            issued_at,
            version,
        })
    }
}

fn contact_to_wire(contact: &EmergencyContact) -> ContactWire {
    ContactWire {
        n: contact.name.clone(),
        r: contact.relation.clone(),
        p: contact.phone.clone(),
        e: contact.email.clone(),
    }
}

fn contact_from_wire(wire: ContactWire) -> EmergencyContact {
    EmergencyContact {
        name: wire.n,
        relation: wire.r,
        phone: wire.p,
        email: wire.e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issued_at() -> DateTime<Utc> {
        "2026-03-14T09:26:53.589Z"
            .parse::<DateTime<Utc>>()
            .expect("valid datetime")
    }

    fn profile() -> EmergencyProfile {
        EmergencyProfile {
            blood_group: BloodGroup::ANeg,
            critical_allergies: vec!["Penicillin".into()],
            primary_emergency_contact: Some(EmergencyContact {
                name: "Ravi Shah".into(),
                relation: "Brother".into(),
                phone: "+44 7700 900123".into(),
                email: None,
            }),
            health_id: Some(HealthId::parse("EMH-100200").expect("valid id")),
            ..EmergencyProfile::new("Asha Shah")
        }
    }

    #[test]
    fn uses_short_alias_keys() {
        let json = CompactPayload::from_profile(&profile(), issued_at())
            .expect("build body")
            .to_json()
            .expect("serialise");

        assert!(json.contains("\"n\":\"Asha Shah\""));
        assert!(json.contains("\"bg\":\"A-\""));
        assert!(json.contains("\"alg\":[\"Penicillin\"]"));
        assert!(json.contains("\"ec\":{\"n\":\"Ravi Shah\",\"r\":\"Brother\""));
        assert!(json.contains("\"id\":\"EMH-100200\""));
        assert!(!json.contains("criticalAllergies"));
        // Empty optional sections are not written at all.
        assert!(!json.contains("\"med\""));
        assert!(!json.contains("\"doc\""));
    }

    #[test]
    fn requires_health_id() {
        let mut p = profile();
        p.health_id = None;
        let err = CompactPayload::from_profile(&p, issued_at()).expect_err("no id");
        assert!(matches!(err, EncodeError::MissingHealthId));
    }

    #[test]
    fn rejects_unknown_body_keys_with_path() {
        let err = CompactPayload::from_json(r#"{"n":"A","bg":"O+","id":"EMH-000001","ts":0,"x":1}"#)
            .expect_err("unknown key");
        match err {
            DecodeError::CorruptBody(msg) => assert!(msg.contains('x'), "{msg}"),
            other => panic!("expected CorruptBody, got {other:?}"),
        }
    }

    #[test]
    fn reports_wrong_types_with_path() {
        let err = CompactPayload::from_json(
            r#"{"n":"A","bg":"O+","alg":"Penicillin","id":"EMH-000001","ts":0}"#,
        )
        .expect_err("wrong type");
        match err {
            DecodeError::CorruptBody(msg) => assert!(msg.contains("alg"), "{msg}"),
            other => panic!("expected CorruptBody, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_health_id() {
        let body = CompactPayload::from_json(r#"{"n":"A","bg":"O+","id":"12345","ts":0}"#)
            .expect("structurally valid");
        let err = body.into_decoded(1).expect_err("bad id");
        assert!(matches!(err, DecodeError::CorruptBody(msg) if msg.contains("invalid id")));
    }

    #[test]
    fn omit_reports_whether_anything_was_dropped() {
        let mut body = CompactPayload::from_profile(&profile(), issued_at()).expect("body");
        assert!(!body.omit(OmittedField::CriticalNotes));
        assert!(!body.omit(OmittedField::SecondaryContacts));

        let mut p = profile();
        p.critical_notes = Some("Carries EpiPen in left pocket".into());
        let mut body = CompactPayload::from_profile(&p, issued_at()).expect("body");
        assert!(body.omit(OmittedField::CriticalNotes));
        assert!(!body.to_json().expect("json").contains("EpiPen"));
    }
}
