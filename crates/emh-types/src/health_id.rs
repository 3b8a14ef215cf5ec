//! Stable external patient identifier.
//!
//! Every QR payload embeds the patient's health id so a medic's device can request the full
//! record from the backend after a scan. The canonical form is fixed:
//!
//! - Prefix: `EMH-` (uppercase)
//! - Body: exactly 6 ASCII digits
//! - Example: `EMH-004217`
//!
//! Non-canonical values (lowercase prefix, missing zero padding, surrounding whitespace) are
//! rejected rather than normalised, so that the identifier printed on the QR and the
//! identifier in the patient store are always byte-identical.

use crate::{HealthIdError, HealthIdResult};
use rand::Rng;
use std::{fmt, str::FromStr};

/// A validated `EMH-######` identifier.
///
/// Once constructed the inner string is guaranteed canonical.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HealthId(String);

impl HealthId {
    /// Required prefix of every health id.
    pub const PREFIX: &'static str = "EMH-";

    /// Number of digits following the prefix.
    pub const DIGITS: usize = 6;

    const MAX_NUMBER: u32 = 999_999;

    /// Validates and wraps an externally supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HealthIdError::InvalidFormat`] if `input` is not canonical.
    pub fn parse(input: &str) -> HealthIdResult<Self> {
        if Self::is_canonical(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(HealthIdError::InvalidFormat(input.to_owned()))
    }

    /// Builds an identifier from its numeric part, zero-padding to 6 digits.
    ///
    /// # Errors
    ///
    /// Returns [`HealthIdError::OutOfRange`] for numbers above 999999.
    pub fn from_number(number: u32) -> HealthIdResult<Self> {
        if number > Self::MAX_NUMBER {
            return Err(HealthIdError::OutOfRange(number));
        }
        Ok(Self(format!("{}{:06}", Self::PREFIX, number)))
    }

    /// Allocates a random identifier.
    ///
    /// Collision checks against existing patients belong to the patient store.
    pub fn generate() -> Self {
        let number = rand::thread_rng().gen_range(0..=Self::MAX_NUMBER);
        Self(format!("{}{:06}", Self::PREFIX, number))
    }

    /// Returns true if `input` is in canonical `EMH-######` form.
    pub fn is_canonical(input: &str) -> bool {
        match input.strip_prefix(Self::PREFIX) {
            Some(digits) => {
                digits.len() == Self::DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
            }
            None => false,
        }
    }

    /// Numeric part of the identifier.
    pub fn number(&self) -> u32 {
        // Canonical form guarantees 6 ASCII digits.
        self.0[Self::PREFIX.len()..]
            .bytes()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HealthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for HealthId {
    type Err = HealthIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HealthId::parse(s)
    }
}

impl AsRef<str> for HealthId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for HealthId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for HealthId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HealthId::parse(&s).map_err(serde::de::Error::custom)
    }
}
