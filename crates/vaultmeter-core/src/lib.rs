//! vaultmeter-core — shared library for the vaultmeter ecosystem.
//!
//! Provides:
//! - `decoder` — chunked record decoder for Vault backup streams
//! - `mounts` — immutable mount directory (auth backends, secrets engines)
//! - `classify` — key-path classification into metric events
//! - `metrics` — labeled count/size counter registry + pushgateway export
//! - `vault` — Vault admin API client (mount table retrieval)
//! - `analyzer` — the sequential decode → classify → apply pipeline

pub mod analyzer;
pub mod classify;
pub mod decoder;
pub mod metrics;
pub mod mounts;
pub mod vault;

pub use analyzer::{AnalyzeError, AnalyzeStats, analyze_backup, analyze_file};
pub use classify::{ClassifyError, classify};
pub use decoder::{DecodeError, Record, RecordStream};
pub use metrics::{MetricError, MetricEvent, MetricFamily, MetricSet, PushTarget};
pub use mounts::{MountDirectory, MountEntry};
pub use vault::{VaultClient, VaultError};
