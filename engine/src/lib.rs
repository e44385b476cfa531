pub mod archive;
pub mod backup;
pub mod client;
pub mod codec;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod errors;
pub mod report;
pub mod restore;

// Re-export commonly used types
pub use backup::{backup, backup_named, store, BackupOutcome};
pub use client::{KeyNode, KeyStore};
pub use config::{Config, ConfigManager, TlsConfig};
pub use discovery::{classify, explore, probe_etcd, Distro, EtcdApi, Exploration, Probe};
pub use errors::EngineError;
pub use report::{KeyFailure, WalkReport};
pub use restore::{restore, restore_with_report};
