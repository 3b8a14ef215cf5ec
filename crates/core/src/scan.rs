//! Scan handling: decode a QR payload and assess it in one call.
//!
//! [`ScanService::scan`] is the single entry point for the camera loop. It accepts one decoded
//! string at a time and returns either a full [`ScanOutcome`] or a typed [`DecodeError`]; it
//! never blocks and never returns a partially decoded profile.

use crate::blood::{self, CompatibilityInfo};
use crate::config::CoreConfig;
use crate::protocols::Protocol;
use crate::triage::{Classifier, Priority, PriorityResult};
use chrono::{DateTime, Utc};
use emh_payload::{DecodeError, DecodedPayload, EncodeResult, EncodedPayload, PayloadCodec};
use emh_types::{EmergencyProfile, HealthId};
use serde::Serialize;
use uuid::Uuid;

/// Everything a medic sees for one profile. Recomputed on every call, never cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub triage: PriorityResult,
    pub protocols: Vec<Protocol>,
    /// `None` when the blood group is unknown; the section is omitted.
    pub blood: Option<CompatibilityInfo>,
}

/// Successful scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanOutcome {
    pub decoded: DecodedPayload,
    pub assessment: Assessment,
    pub record: ScanRecord,
}

/// Metadata handed to the analytics logger. Carries no medical free text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub scan_id: Uuid,
    pub health_id: HealthId,
    pub priority: Priority,
    pub alert_count: usize,
    pub critical_alert_count: usize,
    pub payload_version: u32,
    pub issued_at: DateTime<Utc>,
    pub scanned_at: DateTime<Utc>,
}

/// Combines the payload codec with the classifier.
#[derive(Clone, Debug, Default)]
pub struct ScanService {
    codec: PayloadCodec,
    classifier: Classifier,
}

impl ScanService {
    pub fn new(codec: PayloadCodec, classifier: Classifier) -> Self {
        Self { codec, classifier }
    }

    /// Service using the standard tables and a codec built from `config`.
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.codec(), Classifier::standard())
    }

    pub fn codec(&self) -> &PayloadCodec {
        &self.codec
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify, select protocols and resolve blood compatibility for `profile`.
    pub fn assess(&self, profile: &EmergencyProfile) -> Assessment {
        Assessment {
            triage: self.classifier.classify(profile),
            protocols: self.classifier.select_protocols(profile),
            blood: blood::resolve(profile.blood_group),
        }
    }

    /// Build the QR payload for `profile`.
    pub fn encode(
        &self,
        profile: &EmergencyProfile,
        issued_at: DateTime<Utc>,
    ) -> EncodeResult<EncodedPayload> {
        let encoded = self.codec.encode(profile, issued_at)?;
        tracing::info!(
            bytes = encoded.qr_text.len(),
            omitted = encoded.omitted.len(),
            "encoded QR payload"
        );
        Ok(encoded)
    }

    /// Decode and assess scanned QR text.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] from the codec. Use [`DecodeError::kind`] to tell a foreign
    /// QR code from a damaged or unsupported one, and [`DecodeError::user_message`] for the
    /// prompt shown to the medic.
    pub fn scan(&self, raw: &str, scanned_at: DateTime<Utc>) -> Result<ScanOutcome, DecodeError> {
        let decoded = match self.codec.decode(raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(kind = %err.kind(), error = %err, "rejected scan");
                return Err(err);
            }
        };

        let assessment = self.assess(&decoded.profile);
        let record = ScanRecord {
            scan_id: Uuid::new_v4(),
            health_id: decoded.health_id.clone(),
            priority: assessment.triage.priority,
            alert_count: assessment.triage.alerts.len(),
            critical_alert_count: assessment.triage.critical_alert_count(),
            payload_version: decoded.version,
            issued_at: decoded.issued_at,
            scanned_at,
        };

        tracing::info!(
            scan_id = %record.scan_id,
            health_id = %record.health_id,
            priority = %record.priority,
            alerts = record.alert_count,
            "accepted scan"
        );

        Ok(ScanOutcome {
            decoded,
            assessment,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emh_payload::DecodeFailureKind;
    use emh_types::BloodGroup;

    fn at(text: &str) -> DateTime<Utc> {
        text.parse().expect("valid datetime")
    }

    fn profile() -> EmergencyProfile {
        EmergencyProfile {
            blood_group: BloodGroup::ONeg,
            critical_allergies: vec!["Penicillin".into()],
            critical_conditions: vec!["Type 2 Diabetes".into()],
            current_medications: vec!["Metformin 500mg".into()],
            health_id: Some(HealthId::parse("EMH-424242").expect("valid id")),
            ..EmergencyProfile::new("Noor Haddad")
        }
    }

    #[test]
    fn encode_then_scan_assesses_the_decoded_profile() {
        let service = ScanService::default();
        let issued_at = at("2026-05-01T08:00:00Z");
        let scanned_at = at("2026-05-02T17:30:00Z");

        let encoded = service.encode(&profile(), issued_at).expect("encode");
        let outcome = service.scan(&encoded.qr_text, scanned_at).expect("scan");

        assert_eq!(outcome.decoded.profile, profile());
        assert_eq!(outcome.assessment, service.assess(&profile()));
        assert_eq!(outcome.assessment.triage.priority, Priority::Critical);
        assert_eq!(
            outcome.assessment.blood.map(|b| b.universal_donor),
            Some(true)
        );
        assert_eq!(outcome.assessment.protocols.len(), 2);

        let record = &outcome.record;
        assert_eq!(record.health_id.as_str(), "EMH-424242");
        assert_eq!(record.priority, Priority::Critical);
        assert_eq!(record.alert_count, 4);
        assert_eq!(record.critical_alert_count, 1);
        assert_eq!(record.issued_at, issued_at);
        assert_eq!(record.scanned_at, scanned_at);
    }

    #[test]
    fn each_scan_gets_a_fresh_id() {
        let service = ScanService::default();
        let text = service
            .encode(&profile(), at("2026-05-01T08:00:00Z"))
            .expect("encode")
            .qr_text;
        let now = at("2026-05-01T09:00:00Z");
        let a = service.scan(&text, now).expect("first scan");
        let b = service.scan(&text, now).expect("second scan");
        assert_ne!(a.record.scan_id, b.record.scan_id);
        assert_eq!(a.assessment, b.assessment);
    }

    #[test]
    fn foreign_qr_is_a_format_failure() {
        let err = ScanService::default()
            .scan("https://example.com", at("2026-05-01T09:00:00Z"))
            .expect_err("not ours");
        assert_eq!(err.kind(), DecodeFailureKind::Format);
    }

    #[test]
    fn unknown_blood_group_omits_blood_section() {
        let assessment = ScanService::default().assess(&EmergencyProfile::default());
        assert_eq!(assessment.blood, None);
        assert!(assessment.protocols.is_empty());
        assert_eq!(assessment.triage, PriorityResult::default());
    }

    #[test]
    fn record_serialises_without_medical_text() {
        let service = ScanService::default();
        let text = service
            .encode(&profile(), at("2026-05-01T08:00:00Z"))
            .expect("encode")
            .qr_text;
        let outcome = service
            .scan(&text, at("2026-05-01T09:00:00Z"))
            .expect("scan");
        let json = serde_json::to_string(&outcome.record).expect("serialise record");
        assert!(json.contains("\"healthId\":\"EMH-424242\""));
        assert!(json.contains("\"priority\":\"critical\""));
        assert!(!json.contains("Penicillin"));
        assert!(!json.contains("Noor"));
    }
}
