//! Reusable test utilities:
//! - Mock etcd members (version endpoint, v2 keys API, v3 gateway reads)
//! - A TLS etcd member for https endpoints
//! - Mirror and archive helpers

// Each test binary uses a different subset of the fixtures
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mirror;
pub mod mock_etcd;
pub mod tls_etcd;

pub use mirror::*;
pub use mock_etcd::MockEtcd;
pub use tls_etcd::{tls_data, TlsEtcd};
