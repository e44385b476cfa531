//! Fixed names, prefixes and limits shared by discovery, backup and restore

use std::time::Duration;

/// etcd endpoint conventions
pub mod etcd {
    /// Path of the version document served by every etcd member
    pub const VERSION_PATH: &str = "/version";

    /// Root of the Kubernetes control plane state
    pub const KUBERNETES_PREFIX: &str = "/registry";

    /// Root of the OpenShift specific state
    pub const OPENSHIFT_PREFIX: &str = "/openshift.io";

    /// etcd v2 error code for a failed `prevExist=false` create
    pub const V2_NODE_EXIST: u64 = 105;
}

/// Filesystem mirror layout
pub mod mirror {
    /// Placeholder written to disk in place of `:` in a key segment
    pub const ESCAPE_COLON: &str = "ESC_COLON";

    /// Name of the sentinel file holding a leaf key's value
    pub const CONTENT_FILE: &str = "content";

    /// Extension of sealed mirrors
    pub const ARCHIVE_EXTENSION: &str = "zip";
}

/// Environment variables consulted for secure endpoints
pub mod env {
    pub const CLIENT_CERT: &str = "RS_ETCD_CLIENT_CERT";
    pub const CLIENT_KEY: &str = "RS_ETCD_CLIENT_KEY";
}

/// HTTP client timeout constants
pub mod http {
    use super::Duration;

    /// Timeout for a single request against an etcd member
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Timeout for establishing the connection
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}
