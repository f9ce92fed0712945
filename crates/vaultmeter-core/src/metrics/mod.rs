//! Labeled count/size counter registry and pushgateway export.
//!
//! Every metric family is declared up front with a fixed label schema; the
//! classifier can only emit events for families in the closed
//! [`MetricFamily`] enum, and a label arity mismatch is a programming
//! error, not a recoverable condition. Each family owns a `_count` and a
//! `_size` counter pair that are always incremented together.

use std::collections::HashMap;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::info;

/// Metric name prefix shared by every family.
const PREFIX: &str = "vaultmeter";

/// Label schema for auth backend families.
const AUTH_LABELS: &[&str] = &["type", "mount_point"];
/// Label schema for secrets engine families.
const ENGINE_LABELS: &[&str] = &["type", "mount_point", "version"];
/// Label schema for system families.
const SYSTEM_LABELS: &[&str] = &["type"];

/// The closed set of declared metric families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    AuthBackendObjects,
    AuthBackendUsers,
    AuthBackendGroups,
    AuthBackendRoles,
    AuthBackendRoleIds,
    AuthBackendSecretIds,
    AuthBackendSecretIdsAccessors,
    AuthBackendTokens,
    AuthBackendTokenAccessors,
    AuthBackendTokenRenewSelf,
    SecretsEngineObjects,
    SecretsEngineSecrets,
    SecretsEngineSecretsVersions,
    SecretsEngineSecretsArchives,
    SecretsEngineSecretsPolicies,
    SystemObjects,
}

impl MetricFamily {
    /// Every declared family, in registration order.
    pub const ALL: &'static [MetricFamily] = &[
        MetricFamily::AuthBackendObjects,
        MetricFamily::AuthBackendUsers,
        MetricFamily::AuthBackendGroups,
        MetricFamily::AuthBackendRoles,
        MetricFamily::AuthBackendRoleIds,
        MetricFamily::AuthBackendSecretIds,
        MetricFamily::AuthBackendSecretIdsAccessors,
        MetricFamily::AuthBackendTokens,
        MetricFamily::AuthBackendTokenAccessors,
        MetricFamily::AuthBackendTokenRenewSelf,
        MetricFamily::SecretsEngineObjects,
        MetricFamily::SecretsEngineSecrets,
        MetricFamily::SecretsEngineSecretsVersions,
        MetricFamily::SecretsEngineSecretsArchives,
        MetricFamily::SecretsEngineSecretsPolicies,
        MetricFamily::SystemObjects,
    ];

    /// Family name without prefix or `_count`/`_size` suffix.
    pub fn name(self) -> &'static str {
        match self {
            MetricFamily::AuthBackendObjects => "auth_backend_objects",
            MetricFamily::AuthBackendUsers => "auth_backend_users",
            MetricFamily::AuthBackendGroups => "auth_backend_groups",
            MetricFamily::AuthBackendRoles => "auth_backend_roles",
            MetricFamily::AuthBackendRoleIds => "auth_backend_role_ids",
            MetricFamily::AuthBackendSecretIds => "auth_backend_secret_ids",
            MetricFamily::AuthBackendSecretIdsAccessors => "auth_backend_secret_ids_accessors",
            MetricFamily::AuthBackendTokens => "auth_backend_tokens",
            MetricFamily::AuthBackendTokenAccessors => "auth_backend_token_accessors",
            MetricFamily::AuthBackendTokenRenewSelf => "auth_backend_token_renew_self",
            MetricFamily::SecretsEngineObjects => "secrets_engine_objects",
            MetricFamily::SecretsEngineSecrets => "secrets_engine_secrets",
            MetricFamily::SecretsEngineSecretsVersions => "secrets_engine_secrets_versions",
            MetricFamily::SecretsEngineSecretsArchives => "secrets_engine_secrets_archives",
            MetricFamily::SecretsEngineSecretsPolicies => "secrets_engine_secrets_policies",
            MetricFamily::SystemObjects => "system_objects",
        }
    }

    /// Fixed label-name schema for this family.
    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            MetricFamily::AuthBackendObjects
            | MetricFamily::AuthBackendUsers
            | MetricFamily::AuthBackendGroups
            | MetricFamily::AuthBackendRoles
            | MetricFamily::AuthBackendRoleIds
            | MetricFamily::AuthBackendSecretIds
            | MetricFamily::AuthBackendSecretIdsAccessors
            | MetricFamily::AuthBackendTokens
            | MetricFamily::AuthBackendTokenAccessors
            | MetricFamily::AuthBackendTokenRenewSelf => AUTH_LABELS,
            MetricFamily::SecretsEngineObjects
            | MetricFamily::SecretsEngineSecrets
            | MetricFamily::SecretsEngineSecretsVersions
            | MetricFamily::SecretsEngineSecretsArchives
            | MetricFamily::SecretsEngineSecretsPolicies => ENGINE_LABELS,
            MetricFamily::SystemObjects => SYSTEM_LABELS,
        }
    }
}

/// One unit of classification output: +1 object of `size_delta` bytes on a
/// specific labeled counter pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricEvent {
    pub family: MetricFamily,
    pub labels: Vec<String>,
    pub count_delta: u64,
    pub size_delta: u64,
}

impl MetricEvent {
    /// The common case: one object of `size` bytes.
    pub fn new(family: MetricFamily, labels: Vec<String>, size: u64) -> Self {
        Self {
            family,
            labels,
            count_delta: 1,
            size_delta: size,
        }
    }
}

/// Metric subsystem failure.
#[derive(Debug)]
pub enum MetricError {
    /// Event label values do not match the family's declared schema.
    SchemaMismatch {
        family: &'static str,
        expected: usize,
        got: usize,
    },
    /// Registry-level failure (registration or label resolution).
    Registry(prometheus::Error),
    /// Pushgateway transport or status failure.
    Push(String),
}

impl std::fmt::Display for MetricError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricError::SchemaMismatch {
                family,
                expected,
                got,
            } => write!(
                f,
                "metric '{}' expects {} label values, got {}",
                family, expected, got
            ),
            MetricError::Registry(e) => write!(f, "metric registry error: {}", e),
            MetricError::Push(msg) => write!(f, "pushgateway error: {}", msg),
        }
    }
}

impl std::error::Error for MetricError {}

impl From<prometheus::Error> for MetricError {
    fn from(e: prometheus::Error) -> Self {
        MetricError::Registry(e)
    }
}

/// A `_count`/`_size` counter pair for one family.
struct CounterPair {
    count: IntCounterVec,
    size: IntCounterVec,
}

/// The pre-declared counter registry accumulating one run's totals.
///
/// Counts only grow; final state is read whole by the export step.
pub struct MetricSet {
    registry: Registry,
    counters: HashMap<MetricFamily, CounterPair>,
}

impl MetricSet {
    /// Declare every family on a fresh private registry.
    pub fn new() -> Result<Self, MetricError> {
        let registry = Registry::new();
        let mut counters = HashMap::new();

        for &family in MetricFamily::ALL {
            let count = IntCounterVec::new(
                Opts::new(
                    format!("{}_{}_count", PREFIX, family.name()),
                    format!("Number of {} entries in the backup", family.name()),
                ),
                family.label_names(),
            )?;
            let size = IntCounterVec::new(
                Opts::new(
                    format!("{}_{}_size", PREFIX, family.name()),
                    format!("Total value bytes of {} entries in the backup", family.name()),
                ),
                family.label_names(),
            )?;
            registry.register(Box::new(count.clone()))?;
            registry.register(Box::new(size.clone()))?;
            counters.insert(family, CounterPair { count, size });
        }

        Ok(Self { registry, counters })
    }

    /// Apply one event: increment the `_count` and `_size` counters of the
    /// labeled series together, creating the series on first use.
    pub fn apply(&self, event: &MetricEvent) -> Result<(), MetricError> {
        let expected = event.family.label_names().len();
        if event.labels.len() != expected {
            return Err(MetricError::SchemaMismatch {
                family: event.family.name(),
                expected,
                got: event.labels.len(),
            });
        }

        // Families are a closed enum registered in new(); the lookup
        // cannot miss unless the registration table is broken.
        let pair = self
            .counters
            .get(&event.family)
            .ok_or(MetricError::SchemaMismatch {
                family: event.family.name(),
                expected,
                got: event.labels.len(),
            })?;

        let labels: Vec<&str> = event.labels.iter().map(String::as_str).collect();
        pair.count
            .get_metric_with_label_values(&labels)?
            .inc_by(event.count_delta);
        pair.size
            .get_metric_with_label_values(&labels)?
            .inc_by(event.size_delta);
        Ok(())
    }

    /// Current `(count, size)` totals of one labeled series, if it exists.
    pub fn read(&self, family: MetricFamily, labels: &[&str]) -> Option<(u64, u64)> {
        let pair = self.counters.get(&family)?;
        let count = pair.count.get_metric_with_label_values(labels).ok()?.get();
        let size = pair.size.get_metric_with_label_values(labels).ok()?.get();
        Some((count, size))
    }

    /// Render the whole registry in Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, MetricError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| MetricError::Push(format!("non-UTF8 exposition output: {}", e)))
    }
}

/// Pushgateway destination: address, job name, and grouping labels.
///
/// The process hostname is always part of the grouping key as `instance`,
/// alongside any caller-supplied labels.
pub struct PushTarget {
    gateway: String,
    job: String,
    grouping: Vec<(String, String)>,
}

impl PushTarget {
    /// Target `gateway` (host:port or full http URL) under `job`.
    pub fn new(gateway: &str, job: &str) -> Self {
        let instance = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            gateway: gateway.trim_end_matches('/').to_string(),
            job: job.to_string(),
            grouping: vec![("instance".to_string(), instance)],
        }
    }

    /// Add one caller-supplied grouping label.
    pub fn add_label(&mut self, name: &str, value: &str) {
        self.grouping.push((name.to_string(), value.to_string()));
    }

    /// Push the full metric set in one batch. PUT replaces the grouping
    /// key's previous series on the gateway, matching one-shot batch jobs.
    pub fn push(&self, metrics: &MetricSet) -> Result<(), MetricError> {
        let body = metrics.encode_text()?;

        let base = if self.gateway.starts_with("http://") || self.gateway.starts_with("https://") {
            self.gateway.clone()
        } else {
            format!("http://{}", self.gateway)
        };
        let mut url = format!("{}/metrics/job/{}", base, self.job);
        for (name, value) in &self.grouping {
            url.push_str(&format!("/{}/{}", name, value));
        }

        let response = ureq::put(&url)
            .set("Content-Type", "text/plain; version=0.0.4")
            .send_string(&body)
            .map_err(|e| MetricError::Push(e.to_string()))?;

        info!(
            url = %url,
            status = response.status(),
            "metrics pushed"
        );
        Ok(())
    }
}
