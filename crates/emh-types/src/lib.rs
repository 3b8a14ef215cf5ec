//! # EMH Types
//!
//! Shared vocabulary for the emergency health QR workspace.
//!
//! These types are used by both the wire crate (`emh-payload`) and the clinical crate
//! (`emh-core`), so they live here to avoid a dependency cycle:
//! - [`HealthId`]: the stable `EMH-######` identifier embedded in every QR payload
//! - [`BloodGroup`]: ABO/Rh blood group, with `Unknown` for missing or unparseable input
//! - [`EmergencyProfile`] and its contact/doctor parts: the normalised emergency record
//!
//! Nothing in this crate performs I/O.

mod blood;
mod health_id;
mod profile;

pub use blood::BloodGroup;
pub use health_id::HealthId;
pub use profile::{EmergencyContact, EmergencyProfile, PrimaryDoctor};

/// Errors that can occur when constructing validated identifier types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HealthIdError {
    /// The input was not in the canonical `EMH-######` form.
    #[error("health id must be 'EMH-' followed by 6 digits, got: '{0}'")]
    InvalidFormat(String),

    /// A numeric id was outside the 6-digit range.
    #[error("health id number {0} does not fit in 6 digits")]
    OutOfRange(u32),
}

/// Result type for identifier operations.
pub type HealthIdResult<T> = Result<T, HealthIdError>;
