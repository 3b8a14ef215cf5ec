//! Obscured envelope: the exact text placed inside the QR code.
//!
//! Parsing an envelope only checks shape, app marker and version. The integrity tag is
//! checked by [`ObscuredEnvelope::reveal`], which is the only way to get at the body.

use crate::{DecodeError, APP_MARKER};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Fixed XOR mask applied before base64. Not a secret.
const OBSCURE_MASK: &[u8] = b"emh-qr-obscure-v1";

/// Bytes of SHA-256 kept in the integrity tag (rendered as hex).
const TAG_BYTES: usize = 8;

/// Envelope as carried in the QR code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObscuredEnvelope {
    version: u32,
    integrity_tag: String,
    obscured_body: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnvelopeWire {
    e: String,
    i: String,
    a: String,
    v: u32,
}

impl ObscuredEnvelope {
    /// Obscure `body_json` and tag it.
    pub(crate) fn seal(version: u32, body_json: &str) -> Self {
        let obscured_body = general_purpose::STANDARD.encode(mask(body_json.as_bytes()));
        let integrity_tag = integrity_tag(version, &obscured_body);
        Self {
            version,
            integrity_tag,
            obscured_body,
        }
    }

    /// Parse scanned QR text.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::NotOurFormat`] for non-JSON text, a non-object, missing or mistyped
    ///   `e`/`i`/`a`/`v` keys, extra keys, or a foreign app marker.
    /// - [`DecodeError::UnsupportedVersion`] when `v` is not in `supported_versions`.
    pub fn parse(raw: &str, supported_versions: &[u32]) -> Result<Self, DecodeError> {
        let wire: EnvelopeWire = serde_json::from_str(raw.trim())
            .map_err(|e| DecodeError::NotOurFormat(e.to_string()))?;

        if wire.a != APP_MARKER {
            return Err(DecodeError::NotOurFormat(format!(
                "unrecognised app marker '{}'",
                wire.a
            )));
        }

        if !supported_versions.contains(&wire.v) {
            return Err(DecodeError::UnsupportedVersion { found: wire.v });
        }

        Ok(Self {
            version: wire.v,
            integrity_tag: wire.i,
            obscured_body: wire.e,
        })
    }

    /// Check the integrity tag and reverse the obscuring step.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::IntegrityMismatch`] if the tag does not match.
    /// - [`DecodeError::CorruptBody`] if the body is not valid base64 or UTF-8.
    pub fn reveal(&self) -> Result<String, DecodeError> {
        if integrity_tag(self.version, &self.obscured_body) != self.integrity_tag {
            return Err(DecodeError::IntegrityMismatch);
        }

        let masked = general_purpose::STANDARD
            .decode(self.obscured_body.as_bytes())
            .map_err(|e| DecodeError::CorruptBody(format!("body is not base64: {e}")))?;

        String::from_utf8(mask(&masked))
            .map_err(|e| DecodeError::CorruptBody(format!("body is not UTF-8: {e}")))
    }

    /// Render the envelope as compact JSON for the QR image generator.
    pub fn to_qr_text(&self) -> String {
        serde_json::json!({
            "e": self.obscured_body,
            "i": self.integrity_tag,
            "a": APP_MARKER,
            "v": self.version,
        })
        .to_string()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn integrity_tag(&self) -> &str {
        &self.integrity_tag
    }

    pub fn obscured_body(&self) -> &str {
        &self.obscured_body
    }
}

/// Symmetric: applying the mask twice yields the input.
fn mask(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .zip(OBSCURE_MASK.iter().cycle())
        .map(|(b, k)| b ^ k)
        .collect()
}

fn integrity_tag(version: u32, obscured_body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(version.to_be_bytes());
    hasher.update(APP_MARKER.as_bytes());
    hasher.update(obscured_body.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..TAG_BYTES])
}
