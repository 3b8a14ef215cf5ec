//! Encode and decode QR payloads.

use crate::compact::CompactPayload;
use crate::envelope::ObscuredEnvelope;
use crate::{
    DecodeResult, EncodeError, EncodeResult, CURRENT_VERSION, DEFAULT_MAX_ENVELOPE_BYTES,
};
use chrono::{DateTime, Utc};
use emh_types::{EmergencyProfile, HealthId};

/// Optional profile fields the encoder may drop, in the order it drops them.
///
/// Allergies, conditions, medications, blood group, contact, doctor and id are never dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OmittedField {
    SecondaryContacts,
    CriticalNotes,
}

impl OmittedField {
    pub const DROP_ORDER: [OmittedField; 2] =
        [OmittedField::SecondaryContacts, OmittedField::CriticalNotes];

    pub fn as_str(self) -> &'static str {
        match self {
            OmittedField::SecondaryContacts => "secondaryEmergencyContacts",
            OmittedField::CriticalNotes => "criticalNotes",
        }
    }
}

/// Result of a successful encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPayload {
    pub envelope: ObscuredEnvelope,
    /// Text to hand to the QR image generator.
    pub qr_text: String,
    /// Fields dropped to meet the size budget, in drop order.
    pub omitted: Vec<OmittedField>,
}

/// Result of a successful decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Emergency subset carried in the QR code. `health_id` is always `Some`.
    pub profile: EmergencyProfile,
    /// Key for the authenticated full-record lookup.
    pub health_id: HealthId,
    pub issued_at: DateTime<Utc>,
    pub version: u32,
}

/// QR payload codec.
///
/// Holds no state besides its limits, so one instance can serve any number of threads.
#[derive(Clone, Debug)]
pub struct PayloadCodec {
    max_envelope_bytes: usize,
    supported_versions: Vec<u32>,
}

impl Default for PayloadCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENVELOPE_BYTES)
    }
}

impl PayloadCodec {
    /// Codec reading the current version only, with the given QR text budget.
    pub fn new(max_envelope_bytes: usize) -> Self {
        Self {
            max_envelope_bytes,
            supported_versions: vec![CURRENT_VERSION],
        }
    }

    /// Replace the set of versions accepted on decode.
    pub fn with_supported_versions(mut self, versions: impl IntoIterator<Item = u32>) -> Self {
        self.supported_versions = versions.into_iter().collect();
        self
    }

    pub fn max_envelope_bytes(&self) -> usize {
        self.max_envelope_bytes
    }

    pub fn supported_versions(&self) -> &[u32] {
        &self.supported_versions
    }

    /// Build the QR payload for `profile`.
    ///
    /// When the QR text exceeds the budget, optional fields are dropped one at a time in
    /// [`OmittedField::DROP_ORDER`] until it fits.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::MissingHealthId`] if the profile has no health id.
    /// - [`EncodeError::PayloadTooLarge`] if the text is still over budget once every
    ///   optional field is gone.
    pub fn encode(
        &self,
        profile: &EmergencyProfile,
        issued_at: DateTime<Utc>,
    ) -> EncodeResult<EncodedPayload> {
        let mut body = CompactPayload::from_profile(profile, issued_at)?;
        let mut omitted = Vec::new();
        let mut drop_order = OmittedField::DROP_ORDER.into_iter();

        loop {
            let envelope = ObscuredEnvelope::seal(CURRENT_VERSION, &body.to_json()?);
            let qr_text = envelope.to_qr_text();
            if qr_text.len() <= self.max_envelope_bytes {
                return Ok(EncodedPayload {
                    envelope,
                    qr_text,
                    omitted,
                });
            }

            let dropped = loop {
                match drop_order.next() {
                    Some(field) if body.omit(field) => break Some(field),
                    Some(_) => continue,
                    None => break None,
                }
            };

            match dropped {
                Some(field) => {
                    tracing::warn!(
                        field = field.as_str(),
                        size = qr_text.len(),
                        budget = self.max_envelope_bytes,
                        "dropping optional field to fit QR payload budget"
                    );
                    omitted.push(field);
                }
                None => {
                    return Err(EncodeError::PayloadTooLarge {
                        size: qr_text.len(),
                        budget: self.max_envelope_bytes,
                    });
                }
            }
        }
    }

    /// Read scanned QR text.
    ///
    /// # Errors
    ///
    /// See [`crate::DecodeError`]. Any failure rejects the whole payload.
    pub fn decode(&self, raw: &str) -> DecodeResult<DecodedPayload> {
        let envelope = ObscuredEnvelope::parse(raw, &self.supported_versions)?;
        let body_json = envelope.reveal()?;
        let body = CompactPayload::from_json(&body_json)?;
        body.into_decoded(envelope.version())
    }
}
