//! Constants used throughout the EMH core crate.

/// Environment variable holding the REST listen address.
pub const REST_ADDR_ENV: &str = "EMH_REST_ADDR";

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Environment variable overriding the maximum QR text size in bytes.
pub const MAX_PAYLOAD_BYTES_ENV: &str = "EMH_MAX_PAYLOAD_BYTES";

/// Environment variable listing accepted payload versions, comma separated.
pub const SUPPORTED_VERSIONS_ENV: &str = "EMH_SUPPORTED_VERSIONS";

/// Byte capacity of the largest QR code (version 40, low error correction, byte mode).
pub const QR_BYTE_CAPACITY: usize = 2953;

/// Smallest budget that still fits the mandatory fields of a typical profile.
pub const MIN_PAYLOAD_BYTES: usize = 256;

/// Default tracing filter directive for the binaries.
pub const DEFAULT_LOG_FILTER: &str = "emh=info";
