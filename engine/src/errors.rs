//! Error types for discovery, backup and restore
//!
//! Operations return `anyhow::Result`; the failures they can produce are
//! the variants below, so callers may `downcast_ref::<EngineError>()` to
//! tell an unsupported endpoint apart from an unreachable one.

use std::fmt;

/// Main error type for the engine
#[derive(Debug)]
pub enum EngineError {
    /// Endpoint could not be reached or its answer could not be understood
    Connectivity(ConnectivityError),

    /// Endpoint answered but its distribution cannot be derived
    Classification(ClassificationError),

    /// Endpoint speaks a protocol this operation does not handle
    Version(VersionError),

    /// A single key was rejected
    Key(KeyError),

    /// The mirror or archive could not be produced or read
    Structural(StructuralError),

    /// Configuration errors
    Config(ConfigError),
}

#[derive(Debug)]
pub enum ConnectivityError {
    /// Endpoint is not a valid URL
    InvalidEndpoint { endpoint: String, reason: String },

    /// Request could not be sent or no response arrived
    RequestFailed { url: String, reason: String },

    /// Member answered with an unexpected status
    UnexpectedStatus { url: String, status: u16, body: String },

    /// Response body could not be decoded
    DecodeFailed { url: String, reason: String },

    /// Client certificate or key could not be loaded
    TlsIdentity { path: String, reason: String },
}

#[derive(Debug)]
pub enum ClassificationError {
    CannotDetermineDistro { endpoint: String, version: String },
}

#[derive(Debug)]
pub enum VersionError {
    /// Recognized protocol the operation refuses to speak
    Unsupported { endpoint: String, version: String },

    /// Leading version segment is neither 2 nor 3
    Unrecognized { endpoint: String, version: String },
}

#[derive(Debug)]
pub enum KeyError {
    /// Key cannot be mapped onto the mirror
    InvalidKey { key: String, reason: String },

    /// Create with must-not-exist semantics hit an existing key
    KeyExists { key: String },
}

#[derive(Debug)]
pub enum StructuralError {
    /// Sealing the mirror failed
    ArchiveFailed { path: String, reason: String },

    /// Unpacking the archive failed
    UnpackFailed { path: String, reason: String },

    /// Walking the unpacked mirror failed
    TraversalFailed { path: String, reason: String },

    /// Mirror root could not be prepared
    MirrorFailed { path: String, reason: String },
}

#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Missing required configuration
    MissingRequired { field: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

impl EngineError {
    pub fn is_unsupported_version(&self) -> bool {
        matches!(self, EngineError::Version(VersionError::Unsupported { .. }))
    }

    pub fn is_key_exists(&self) -> bool {
        matches!(self, EngineError::Key(KeyError::KeyExists { .. }))
    }

    pub fn is_invalid_key(&self) -> bool {
        matches!(self, EngineError::Key(KeyError::InvalidKey { .. }))
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Connectivity(e) => write!(f, "Connectivity error: {}", e),
            EngineError::Classification(e) => write!(f, "Classification error: {}", e),
            EngineError::Version(e) => write!(f, "Version error: {}", e),
            EngineError::Key(e) => write!(f, "Key error: {}", e),
            EngineError::Structural(e) => write!(f, "Structural error: {}", e),
            EngineError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityError::InvalidEndpoint { endpoint, reason } => {
                write!(f, "Can't parse endpoint {}: {}", endpoint, reason)
            }
            ConnectivityError::RequestFailed { url, reason } => {
                write!(f, "Can't query {}: {}", url, reason)
            }
            ConnectivityError::UnexpectedStatus { url, status, body } => {
                write!(f, "{} answered with status {}: {}", url, status, body)
            }
            ConnectivityError::DecodeFailed { url, reason } => {
                write!(f, "Can't decode response from {}: {}", url, reason)
            }
            ConnectivityError::TlsIdentity { path, reason } => {
                write!(f, "Can't load client identity from {}: {}", path, reason)
            }
        }
    }
}

impl fmt::Display for ClassificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationError::CannotDetermineDistro { endpoint, version } => write!(
                f,
                "Can't determine Kubernetes distro of {} (etcd version '{}')",
                endpoint, version
            ),
        }
    }
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::Unsupported { endpoint, version } => {
                write!(f, "Endpoint {} version {} not supported", endpoint, version)
            }
            VersionError::Unrecognized { endpoint, version } => {
                write!(f, "Endpoint {} reports unrecognized version '{}'", endpoint, version)
            }
        }
    }
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::InvalidKey { key, reason } => write!(f, "Invalid key '{}': {}", key, reason),
            KeyError::KeyExists { key } => write!(f, "Key {} already exists", key),
        }
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::ArchiveFailed { path, reason } => {
                write!(f, "Can't archive {}: {}", path, reason)
            }
            StructuralError::UnpackFailed { path, reason } => {
                write!(f, "Can't unpack archive {}: {}", path, reason)
            }
            StructuralError::TraversalFailed { path, reason } => {
                write!(f, "Can't traverse directory {}: {}", path, reason)
            }
            StructuralError::MirrorFailed { path, reason } => {
                write!(f, "Can't prepare mirror {}: {}", path, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required field: {}", field)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl std::error::Error for EngineError {}
impl std::error::Error for ConnectivityError {}
impl std::error::Error for ClassificationError {}
impl std::error::Error for VersionError {}
impl std::error::Error for KeyError {}
impl std::error::Error for StructuralError {}
impl std::error::Error for ConfigError {}

impl From<ConnectivityError> for EngineError {
    fn from(err: ConnectivityError) -> Self {
        EngineError::Connectivity(err)
    }
}

impl From<ClassificationError> for EngineError {
    fn from(err: ClassificationError) -> Self {
        EngineError::Classification(err)
    }
}

impl From<VersionError> for EngineError {
    fn from(err: VersionError) -> Self {
        EngineError::Version(err)
    }
}

impl From<KeyError> for EngineError {
    fn from(err: KeyError) -> Self {
        EngineError::Key(err)
    }
}

impl From<StructuralError> for EngineError {
    fn from(err: StructuralError) -> Self {
        EngineError::Structural(err)
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Config(err)
    }
}

/// Finds the engine error behind an `anyhow::Error`, if there is one
pub fn engine_error(err: &anyhow::Error) -> Option<&EngineError> {
    err.downcast_ref::<EngineError>()
}
