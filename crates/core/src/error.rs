/// Failure to turn a raw patient document into an [`emh_types::EmergencyProfile`].
///
/// A profile that cannot be normalised is never classified: a wrong-typed field must not turn
/// into an empty list and a `normal` priority.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("invalid profile field {path}: {reason}")]
    InvalidField { path: String, reason: String },
    #[error("profile document must be an object, found {0}")]
    NotAnObject(&'static str),
    #[error("failed to parse profile JSON: {0}")]
    Json(serde_json::Error),
    #[error("failed to parse profile YAML: {0}")]
    Yaml(serde_yaml::Error),
    #[error("failed to read profile file: {0}")]
    FileRead(std::io::Error),
}

impl ProfileError {
    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ProfileError::InvalidField {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type ProfileResult<T> = std::result::Result<T, ProfileError>;

/// Rejected runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
