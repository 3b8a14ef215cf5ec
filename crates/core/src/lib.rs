//! # EMH Core
//!
//! Clinical logic for the emergency medical QR system.
//!
//! This crate takes an [`EmergencyProfile`] (or the raw patient document it is normalised from)
//! and answers the questions a medic has at the scene:
//! - How urgent is this patient? ([`Classifier::classify`])
//! - What must I watch out for? (the ordered alerts in a [`PriorityResult`])
//! - What should I do? ([`Classifier::select_protocols`])
//! - What blood can they take? ([`blood::resolve`])
//!
//! Everything here is pure and synchronous. Tables are immutable and injected through a
//! [`KnowledgeBase`]; nothing reads global state or performs I/O apart from
//! [`normalise::load_profile_file`].
//!
//! **No transport concerns**: HTTP routing, QR image rendering and camera access live in the
//! binaries or outside the system entirely.

pub mod blood;
pub mod config;
pub mod constants;
mod error;
pub mod interactions;
pub mod knowledge;
pub mod matching;
pub mod normalise;
pub mod protocols;
pub mod scan;
pub mod triage;

pub use blood::{CompatibilityInfo, Rarity};
pub use config::CoreConfig;
pub use error::{ConfigError, ConfigResult, ProfileError, ProfileResult};
pub use knowledge::{KnowledgeBase, ProtocolId};
pub use matching::{matches_keyword, KeywordMatcher, SubstringMatcher};
pub use protocols::Protocol;
pub use scan::{Assessment, ScanOutcome, ScanRecord, ScanService};
pub use triage::{Alert, AlertType, Classifier, Priority, PriorityResult, Severity};

pub use emh_payload::{
    DecodeError, DecodeFailureKind, DecodedPayload, EncodeError, EncodedPayload, OmittedField,
    PayloadCodec,
};
pub use emh_types::{BloodGroup, EmergencyContact, EmergencyProfile, HealthId, PrimaryDoctor};
