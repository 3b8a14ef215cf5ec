//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handling never reads process-wide environment variables;
//! the binaries read them once and hand the raw values to the pure helpers below.

use crate::constants::{MIN_PAYLOAD_BYTES, QR_BYTE_CAPACITY};
use crate::{ConfigError, ConfigResult};
use emh_payload::{PayloadCodec, CURRENT_VERSION, DEFAULT_MAX_ENVELOPE_BYTES};

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    max_payload_bytes: usize,
    supported_versions: Vec<u32>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_ENVELOPE_BYTES,
            supported_versions: vec![CURRENT_VERSION],
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the budget is outside
    /// `MIN_PAYLOAD_BYTES..=QR_BYTE_CAPACITY`, or if `supported_versions` is empty or does not
    /// include the version this build writes.
    pub fn new(max_payload_bytes: usize, supported_versions: Vec<u32>) -> ConfigResult<Self> {
        if !(MIN_PAYLOAD_BYTES..=QR_BYTE_CAPACITY).contains(&max_payload_bytes) {
            return Err(ConfigError::Invalid(format!(
                "max payload bytes must be between {MIN_PAYLOAD_BYTES} and {QR_BYTE_CAPACITY}, got {max_payload_bytes}"
            )));
        }

        if !supported_versions.contains(&CURRENT_VERSION) {
            return Err(ConfigError::Invalid(format!(
                "supported versions must include the current version {CURRENT_VERSION}"
            )));
        }

        Ok(Self {
            max_payload_bytes,
            supported_versions,
        })
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    pub fn supported_versions(&self) -> &[u32] {
        &self.supported_versions
    }

    /// A payload codec honouring this configuration.
    pub fn codec(&self) -> PayloadCodec {
        PayloadCodec::new(self.max_payload_bytes)
            .with_supported_versions(self.supported_versions.iter().copied())
    }
}

/// Resolve the payload budget from an optional raw environment value.
///
/// Missing or blank values fall back to the default.
pub fn max_payload_bytes_from_env_value(value: Option<String>) -> ConfigResult<usize> {
    let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(DEFAULT_MAX_ENVELOPE_BYTES);
    };

    raw.trim().parse::<usize>().map_err(|_| {
        ConfigError::Invalid(format!("max payload bytes is not a number: '{raw}'"))
    })
}

/// Resolve accepted payload versions from an optional comma-separated environment value.
pub fn supported_versions_from_env_value(value: Option<String>) -> ConfigResult<Vec<u32>> {
    let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(vec![CURRENT_VERSION]);
    };

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>().map_err(|_| {
                ConfigError::Invalid(format!("payload version is not a number: '{part}'"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_codec_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.max_payload_bytes(), DEFAULT_MAX_ENVELOPE_BYTES);
        assert_eq!(config.supported_versions(), &[CURRENT_VERSION]);
        let codec = config.codec();
        assert_eq!(codec.max_envelope_bytes(), DEFAULT_MAX_ENVELOPE_BYTES);
        assert_eq!(codec.supported_versions(), &[CURRENT_VERSION]);
    }

    #[test]
    fn rejects_out_of_range_budget() {
        for bytes in [0, MIN_PAYLOAD_BYTES - 1, QR_BYTE_CAPACITY + 1] {
            let err = CoreConfig::new(bytes, vec![CURRENT_VERSION]).expect_err("out of range");
            assert!(matches!(err, ConfigError::Invalid(_)), "{bytes}");
        }
        assert!(CoreConfig::new(MIN_PAYLOAD_BYTES, vec![CURRENT_VERSION]).is_ok());
        assert!(CoreConfig::new(QR_BYTE_CAPACITY, vec![CURRENT_VERSION]).is_ok());
    }

    #[test]
    fn requires_current_version() {
        assert!(CoreConfig::new(800, vec![]).is_err());
        assert!(CoreConfig::new(800, vec![CURRENT_VERSION + 1]).is_err());
        let config =
            CoreConfig::new(800, vec![CURRENT_VERSION, CURRENT_VERSION + 1]).expect("valid");
        assert_eq!(config.codec().supported_versions().len(), 2);
    }

    #[test]
    fn budget_env_value_parsing() {
        assert_eq!(
            max_payload_bytes_from_env_value(None).expect("default"),
            DEFAULT_MAX_ENVELOPE_BYTES
        );
        assert_eq!(
            max_payload_bytes_from_env_value(Some("  ".into())).expect("blank"),
            DEFAULT_MAX_ENVELOPE_BYTES
        );
        assert_eq!(
            max_payload_bytes_from_env_value(Some(" 900 ".into())).expect("number"),
            900
        );
        assert!(max_payload_bytes_from_env_value(Some("lots".into())).is_err());
    }

    #[test]
    fn versions_env_value_parsing() {
        assert_eq!(
            supported_versions_from_env_value(None).expect("default"),
            vec![CURRENT_VERSION]
        );
        assert_eq!(
            supported_versions_from_env_value(Some("1, 2,".into())).expect("list"),
            vec![1, 2]
        );
        assert!(supported_versions_from_env_value(Some("1,two".into())).is_err());
    }
}
