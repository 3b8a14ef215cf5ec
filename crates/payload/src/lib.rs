//! QR payload wire support for emergency health profiles.
//!
//! This crate owns the one bit-exact contract in the system: the text placed inside a
//! patient's QR code. It provides:
//! - a compact, alias-keyed body ([`CompactPayload`]) carrying the emergency-critical subset
//!   of an [`EmergencyProfile`]
//! - an envelope ([`ObscuredEnvelope`]) holding the obscured body, an integrity tag, an app
//!   marker and a version number
//! - a codec ([`PayloadCodec`]) that enforces a size budget on encode and fails closed on
//!   decode
//!
//! ## Wire format
//!
//! Envelope (JSON object, all keys required):
//!
//! | key | meaning |
//! |-----|---------|
//! | `e` | obscured body |
//! | `i` | integrity tag |
//! | `a` | app marker, always `EMH` |
//! | `v` | payload version |
//!
//! Body (JSON object, before obscuring):
//!
//! | key | field |
//! |-----|-------|
//! | `n` | full name |
//! | `bg` | blood group |
//! | `age` | age in years |
//! | `alg` | critical allergies |
//! | `cc` | critical conditions |
//! | `med` | current medications |
//! | `ec` | primary emergency contact (`n`, `r`, `p`, `e`) |
//! | `sc` | secondary emergency contacts (same sub-keys) |
//! | `doc` | primary doctor (`n`, `h`, `p`) |
//! | `nt` | critical notes |
//! | `id` | health id |
//! | `ts` | issued-at, Unix epoch milliseconds |
//!
//! ## Known limitation
//!
//! Obscuring is a fixed XOR mask followed by base64. It stops a QR image from showing medical
//! data as plain text and nothing more: anyone holding this crate can reverse it. Access
//! control for the full record is enforced by the backend lookup keyed by the embedded id.

mod codec;
mod compact;
mod envelope;

pub use codec::{DecodedPayload, EncodedPayload, OmittedField, PayloadCodec};
pub use compact::CompactPayload;
pub use envelope::ObscuredEnvelope;

pub use emh_types::{EmergencyProfile, HealthId};

/// Marker written to the `a` key of every envelope.
pub const APP_MARKER: &str = "EMH";

/// Version written by this encoder.
pub const CURRENT_VERSION: u32 = 1;

/// Default upper bound on the QR text length, in bytes.
///
/// Well inside the byte-mode capacity of a version 40 QR code at error-correction level M,
/// while keeping codes small enough to scan from a phone lock screen.
pub const DEFAULT_MAX_ENVELOPE_BYTES: usize = 1200;

/// Errors returned when building a payload.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("profile has no health id; a QR payload must carry one")]
    MissingHealthId,

    #[error("payload is {size} bytes after dropping optional fields; budget is {budget}")]
    PayloadTooLarge { size: usize, budget: usize },

    #[error("failed to serialise payload body: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broad class of a decode failure.
///
/// Operators track these separately: a rise in `Format` means people are scanning the wrong
/// codes, a rise in `Integrity` points at damaged or tampered codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecodeFailureKind {
    Format,
    Integrity,
}

impl DecodeFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DecodeFailureKind::Format => "format",
            DecodeFailureKind::Integrity => "integrity",
        }
    }
}

impl std::fmt::Display for DecodeFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned when reading scanned QR text.
///
/// A decode either yields a complete payload or one of these; it never yields partial data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The text is not an emergency health envelope at all.
    #[error("not an emergency health QR payload: {0}")]
    NotOurFormat(String),

    /// The envelope is ours but carries a version this decoder does not read.
    #[error("unsupported payload version {found}")]
    UnsupportedVersion { found: u32 },

    /// The integrity tag does not match the envelope contents.
    #[error("payload integrity tag does not match")]
    IntegrityMismatch,

    /// The tag matched but the body could not be revealed or translated.
    #[error("corrupted payload body: {0}")]
    CorruptBody(String),
}

impl DecodeError {
    pub fn kind(&self) -> DecodeFailureKind {
        match self {
            DecodeError::NotOurFormat(_) => DecodeFailureKind::Format,
            DecodeError::UnsupportedVersion { .. }
            | DecodeError::IntegrityMismatch
            | DecodeError::CorruptBody(_) => DecodeFailureKind::Integrity,
        }
    }

    /// Prompt shown to the medic. Never contains technical detail.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            DecodeFailureKind::Format => {
                "This is not a valid medical QR code. Please try scanning again."
            }
            DecodeFailureKind::Integrity => {
                "This medical QR code could not be read. Please rescan, or ask the patient to \
                 refresh their code."
            }
        }
    }
}

/// Type alias for encode results.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Type alias for decode results.
pub type DecodeResult<T> = Result<T, DecodeError>;
