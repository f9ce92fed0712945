//! Key-path classification.
//!
//! Maps one decoded [`Record`] onto zero or more [`MetricEvent`]s using the
//! mount directory for identity resolution. Classification is a pure
//! function of `(key_path, directory)`: no state is carried between
//! records, and calling it twice on the same inputs yields the same
//! events.
//!
//! Path layout: segment 0 is always empty (leading slash), segment 1 is
//! the storage domain (`audit`, `core`, `auth`, `logical`, `sys`), and the
//! remaining segments route per domain. Unknown domains and unknown
//! sub-resources of known kinds are classification gaps: the record is
//! logged and dropped from metrics, the run continues. A mount reference
//! the directory cannot resolve is fatal — the directory snapshot does not
//! match the backup.

use tracing::{debug, warn};

use crate::decoder::Record;
use crate::metrics::{MetricEvent, MetricFamily};
use crate::mounts::{MountDirectory, MountEntry};

/// Fatal mismatch between the backup and the mount directory snapshot.
#[derive(Debug)]
pub enum ClassifyError {
    /// An `/auth/<accessor>/...` path references an unknown auth accessor.
    UnresolvedAuthAccessor { accessor: String, key_path: String },
    /// A `/logical/<accessor>/...` path references an unknown engine accessor.
    UnresolvedEngineAccessor { accessor: String, key_path: String },
    /// No auth backend of the needed plugin type is mounted.
    UnresolvedAuthKind { kind: String, key_path: String },
    /// An expiration path names an auth mount the directory does not know.
    UnresolvedAuthName { name: String, key_path: String },
}

impl std::fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifyError::UnresolvedAuthAccessor { accessor, key_path } => write!(
                f,
                "unknown auth backend accessor '{}' in '{}'",
                accessor, key_path
            ),
            ClassifyError::UnresolvedEngineAccessor { accessor, key_path } => write!(
                f,
                "unknown secrets engine accessor '{}' in '{}'",
                accessor, key_path
            ),
            ClassifyError::UnresolvedAuthKind { kind, key_path } => {
                write!(f, "no auth backend of type '{}' for '{}'", kind, key_path)
            }
            ClassifyError::UnresolvedAuthName { name, key_path } => {
                write!(f, "unknown auth mount '{}' in '{}'", name, key_path)
            }
        }
    }
}

impl std::error::Error for ClassifyError {}

/// Top-level storage domain (path segment 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
    Audit,
    Core,
    Auth,
    Logical,
    Sys,
    Unknown,
}

impl Domain {
    fn parse(segment: &str) -> Self {
        match segment {
            "audit" => Domain::Audit,
            "core" => Domain::Core,
            "auth" => Domain::Auth,
            "logical" => Domain::Logical,
            "sys" => Domain::Sys,
            _ => Domain::Unknown,
        }
    }
}

/// Auth backend plugin types with dedicated sub-resource routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthKind {
    Userpass,
    Ldap,
    Approle,
    /// Token backend and any unrecognized type: generic event only.
    Other,
}

impl AuthKind {
    fn parse(kind: &str) -> Self {
        match kind {
            "userpass" => AuthKind::Userpass,
            "ldap" => AuthKind::Ldap,
            "approle" => AuthKind::Approle,
            _ => AuthKind::Other,
        }
    }
}

/// Secrets engine plugin types with dedicated routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineKind {
    Cubbyhole,
    Identity,
    Kv,
    Transit,
    Unknown,
}

impl EngineKind {
    fn parse(kind: &str) -> Self {
        match kind {
            "cubbyhole" => EngineKind::Cubbyhole,
            "identity" => EngineKind::Identity,
            "kv" => EngineKind::Kv,
            "transit" => EngineKind::Transit,
            _ => EngineKind::Unknown,
        }
    }
}

/// Classify one record into its metric events.
///
/// Returns an empty vector for classification gaps (unknown domain or
/// sub-resource); those records are logged here and left uncounted.
pub fn classify(
    record: &Record,
    directory: &MountDirectory,
) -> Result<Vec<MetricEvent>, ClassifyError> {
    let segments: Vec<&str> = record.key_path.split('/').collect();
    let size = record.value_size;
    let mut events = Vec::new();

    match Domain::parse(segment(&segments, 1)) {
        Domain::Audit => events.push(system_event("audit_device", size)),
        Domain::Core => events.push(system_event("core", size)),
        Domain::Auth => classify_auth(record, &segments, directory, &mut events)?,
        Domain::Logical => classify_logical(record, &segments, directory, &mut events)?,
        Domain::Sys => classify_sys(record, &segments, directory, &mut events)?,
        Domain::Unknown => {
            warn!(path = %record.key_path, "unrecognized top-level path segment, record not counted");
        }
    }

    Ok(events)
}

/// `/auth/<accessor>/<sub-resource>/...`
fn classify_auth(
    record: &Record,
    segments: &[&str],
    directory: &MountDirectory,
    events: &mut Vec<MetricEvent>,
) -> Result<(), ClassifyError> {
    let accessor = segment(segments, 2);
    if accessor.is_empty() {
        debug!(path = %record.key_path, "auth path without accessor segment");
        return Ok(());
    }
    let entry =
        directory
            .lookup_auth(accessor)
            .ok_or_else(|| ClassifyError::UnresolvedAuthAccessor {
                accessor: accessor.to_string(),
                key_path: record.key_path.clone(),
            })?;

    let size = record.value_size;
    events.push(auth_event(MetricFamily::AuthBackendObjects, entry, size));

    let sub = segment(segments, 3);
    match AuthKind::parse(&entry.kind) {
        AuthKind::Userpass => {
            if sub == "user" {
                events.push(auth_event(MetricFamily::AuthBackendUsers, entry, size));
            }
        }
        AuthKind::Ldap => match sub {
            "user" => events.push(auth_event(MetricFamily::AuthBackendUsers, entry, size)),
            "group" => events.push(auth_event(MetricFamily::AuthBackendGroups, entry, size)),
            // Backend bookkeeping, already covered by the objects event.
            "config" | "salt" => {}
            _ => {}
        },
        AuthKind::Approle => match sub {
            "accessor" => events.push(auth_event(
                MetricFamily::AuthBackendSecretIdsAccessors,
                entry,
                size,
            )),
            "role_id" => events.push(auth_event(MetricFamily::AuthBackendRoleIds, entry, size)),
            "secret_id" => events.push(auth_event(MetricFamily::AuthBackendSecretIds, entry, size)),
            "role" => events.push(auth_event(MetricFamily::AuthBackendRoles, entry, size)),
            "config" | "salt" => {}
            _ => {}
        },
        AuthKind::Other => {}
    }
    Ok(())
}

/// `/logical/<accessor>/...` — routed by the engine's plugin type.
fn classify_logical(
    record: &Record,
    segments: &[&str],
    directory: &MountDirectory,
    events: &mut Vec<MetricEvent>,
) -> Result<(), ClassifyError> {
    let accessor = segment(segments, 2);
    if accessor.is_empty() {
        debug!(path = %record.key_path, "logical path without accessor segment");
        return Ok(());
    }
    let entry = directory.lookup_secrets_engine(accessor).ok_or_else(|| {
        ClassifyError::UnresolvedEngineAccessor {
            accessor: accessor.to_string(),
            key_path: record.key_path.clone(),
        }
    })?;

    let size = record.value_size;
    match EngineKind::parse(&entry.kind) {
        EngineKind::Cubbyhole | EngineKind::Identity => {
            events.push(engine_event(
                MetricFamily::SecretsEngineObjects,
                &entry.kind,
                &entry.name,
                "",
                size,
            ));
            events.push(engine_event(
                MetricFamily::SecretsEngineSecrets,
                &entry.kind,
                &entry.name,
                "",
                size,
            ));
        }
        EngineKind::Kv => classify_kv(record, segments, entry, events),
        EngineKind::Transit => {
            events.push(engine_event(
                MetricFamily::SecretsEngineObjects,
                &entry.kind,
                &entry.name,
                "",
                size,
            ));
            match segment(segments, 3) {
                "archive" => events.push(engine_event(
                    MetricFamily::SecretsEngineSecretsArchives,
                    &entry.kind,
                    &entry.name,
                    "2",
                    size,
                )),
                "policy" => events.push(engine_event(
                    MetricFamily::SecretsEngineSecretsPolicies,
                    &entry.kind,
                    &entry.name,
                    "2",
                    size,
                )),
                _ => {}
            }
        }
        EngineKind::Unknown => {
            warn!(
                kind = %entry.kind,
                path = %record.key_path,
                "unrecognized secrets engine kind, record not counted"
            );
        }
    }
    Ok(())
}

/// kv engine routing. Version 2 is signaled by `options["version"] == "2"`
/// and a path deep enough to carry the v2 sub-tree (metadata, versions,
/// archive, policy); everything else is counted as version 1.
fn classify_kv(record: &Record, segments: &[&str], entry: &MountEntry, events: &mut Vec<MetricEvent>) {
    let size = record.value_size;
    let v2 = entry.options.get("version").map(String::as_str) == Some("2") && segments.len() > 4;

    if !v2 {
        events.push(engine_event(
            MetricFamily::SecretsEngineObjects,
            &entry.kind,
            &entry.name,
            "1",
            size,
        ));
        events.push(engine_event(
            MetricFamily::SecretsEngineSecrets,
            &entry.kind,
            &entry.name,
            "1",
            size,
        ));
        return;
    }

    events.push(engine_event(
        MetricFamily::SecretsEngineObjects,
        &entry.kind,
        &entry.name,
        "2",
        size,
    ));
    match segment(segments, 4) {
        "metadata" => events.push(engine_event(
            MetricFamily::SecretsEngineSecrets,
            &entry.kind,
            &entry.name,
            "2",
            size,
        )),
        "versions" => events.push(engine_event(
            MetricFamily::SecretsEngineSecretsVersions,
            &entry.kind,
            &entry.name,
            "2",
            size,
        )),
        "archive" => events.push(engine_event(
            MetricFamily::SecretsEngineSecretsArchives,
            &entry.kind,
            &entry.name,
            "2",
            size,
        )),
        "policy" => events.push(engine_event(
            MetricFamily::SecretsEngineSecretsPolicies,
            &entry.kind,
            &entry.name,
            "2",
            size,
        )),
        // Engine bookkeeping, already covered by the objects event.
        "config" | "salt" | "upgrading" => {}
        other => {
            debug!(
                sub = %other,
                path = %record.key_path,
                "unclassified kv v2 sub-path"
            );
        }
    }
}

/// `/sys/...` — routed by segment 2.
fn classify_sys(
    record: &Record,
    segments: &[&str],
    directory: &MountDirectory,
    events: &mut Vec<MetricEvent>,
) -> Result<(), ClassifyError> {
    let size = record.value_size;
    match segment(segments, 2) {
        "counters" => events.push(system_event("counters", size)),
        "policy" => events.push(system_event("policies", size)),
        "config" => events.push(system_event("config", size)),
        "token" => {
            // The token subsystem is addressed by plugin type, not accessor.
            let entry = directory.find_auth_by_kind("token").ok_or_else(|| {
                ClassifyError::UnresolvedAuthKind {
                    kind: "token".to_string(),
                    key_path: record.key_path.clone(),
                }
            })?;
            events.push(auth_event(MetricFamily::AuthBackendObjects, entry, size));
            match segment(segments, 3) {
                "accessor" => {
                    events.push(auth_event(MetricFamily::AuthBackendTokenAccessors, entry, size));
                }
                "id" => events.push(auth_event(MetricFamily::AuthBackendTokens, entry, size)),
                _ => {}
            }
        }
        "expire" => classify_expire(record, segments, directory, events)?,
        other => {
            debug!(sub = %other, path = %record.key_path, "unclassified sys sub-path");
        }
    }
    Ok(())
}

/// `/sys/expire/id/...` — the lease expiration index.
///
/// Leases under `auth/` carry the auth mount's name at segment 5 (the
/// directory also accepts an accessor there, for backups written with
/// accessor-addressed leases). Anything else at segment 4 is a lease on a
/// secrets engine path, counted under that engine's name with an "expire"
/// mount-point marker.
fn classify_expire(
    record: &Record,
    segments: &[&str],
    directory: &MountDirectory,
    events: &mut Vec<MetricEvent>,
) -> Result<(), ClassifyError> {
    if segment(segments, 3) != "id" {
        debug!(path = %record.key_path, "unclassified expire sub-path");
        return Ok(());
    }

    let size = record.value_size;
    let target = segment(segments, 4);
    if target == "auth" {
        let name = segment(segments, 5);
        let entry = directory
            .find_auth_by_name(name)
            .or_else(|| directory.lookup_auth(name))
            .ok_or_else(|| ClassifyError::UnresolvedAuthName {
                name: name.to_string(),
                key_path: record.key_path.clone(),
            })?;
        events.push(auth_event(MetricFamily::AuthBackendObjects, entry, size));
        match segment(segments, 6) {
            "login" => events.push(auth_event(MetricFamily::AuthBackendTokens, entry, size)),
            "renew-self" => {
                events.push(auth_event(MetricFamily::AuthBackendTokenRenewSelf, entry, size));
            }
            _ => {}
        }
    } else if !target.is_empty() {
        // Secrets engine lease, keyed by engine name regardless of its
        // registered kind.
        events.push(engine_event(
            MetricFamily::SecretsEngineObjects,
            target,
            "expire",
            "",
            size,
        ));
        events.push(engine_event(
            MetricFamily::SecretsEngineSecrets,
            target,
            "expire",
            "",
            size,
        ));
    } else {
        debug!(path = %record.key_path, "expire path without lease target");
    }
    Ok(())
}

fn segment<'a>(segments: &[&'a str], index: usize) -> &'a str {
    segments.get(index).copied().unwrap_or("")
}

fn system_event(label: &str, size: u64) -> MetricEvent {
    MetricEvent::new(MetricFamily::SystemObjects, vec![label.to_string()], size)
}

fn auth_event(family: MetricFamily, entry: &MountEntry, size: u64) -> MetricEvent {
    MetricEvent::new(
        family,
        vec![entry.kind.clone(), entry.name.clone()],
        size,
    )
}

fn engine_event(family: MetricFamily, kind: &str, name: &str, version: &str, size: u64) -> MetricEvent {
    MetricEvent::new(
        family,
        vec![kind.to_string(), name.to_string(), version.to_string()],
        size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record(path: &str) -> Record {
        Record {
            key_path: path.to_string(),
            value_size: 3,
        }
    }

    fn directory() -> MountDirectory {
        let mut kv2_opts = HashMap::new();
        kv2_opts.insert("version".to_string(), "2".to_string());
        MountDirectory::new(
            vec![
                MountEntry::new("abc123", "userpass", "project"),
                MountEntry::new("ldap99", "ldap", "corp"),
                MountEntry::new("appr01", "approle", "ci"),
                MountEntry::new("tok001", "token", "token"),
            ],
            vec![
                MountEntry::with_options("kv2acc", "kv", "project-kv2", kv2_opts),
                MountEntry::new("kv1acc", "kv", "legacy-kv"),
                MountEntry::new("cubacc", "cubbyhole", "cubbyhole"),
                MountEntry::new("idacc", "identity", "identity"),
                MountEntry::new("tracc", "transit", "transit"),
                MountEntry::new("unkacc", "nomad", "nomad"),
            ],
        )
    }

    fn families(events: &[MetricEvent]) -> Vec<MetricFamily> {
        events.iter().map(|e| e.family).collect()
    }

    #[test]
    fn test_audit_and_core_domains() {
        let dir = directory();
        let events = classify(&record("/audit/dev1/log"), &dir).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].family, MetricFamily::SystemObjects);
        assert_eq!(events[0].labels, vec!["audit_device"]);

        let events = classify(&record("/core/master"), &dir).unwrap();
        assert_eq!(events[0].labels, vec!["core"]);
        assert_eq!(events[0].size_delta, 3);
    }

    #[test]
    fn test_userpass_user_counted() {
        let dir = directory();
        let events = classify(&record("/auth/abc123/user/alice"), &dir).unwrap();
        assert_eq!(
            families(&events),
            vec![
                MetricFamily::AuthBackendObjects,
                MetricFamily::AuthBackendUsers
            ]
        );
        for event in &events {
            assert_eq!(event.labels, vec!["userpass", "project"]);
            assert_eq!(event.count_delta, 1);
            assert_eq!(event.size_delta, 3);
        }
    }

    #[test]
    fn test_userpass_other_subresource_generic_only() {
        let dir = directory();
        let events = classify(&record("/auth/abc123/config"), &dir).unwrap();
        assert_eq!(families(&events), vec![MetricFamily::AuthBackendObjects]);
    }

    #[test]
    fn test_ldap_routing() {
        let dir = directory();
        let events = classify(&record("/auth/ldap99/group/admins"), &dir).unwrap();
        assert_eq!(
            families(&events),
            vec![
                MetricFamily::AuthBackendObjects,
                MetricFamily::AuthBackendGroups
            ]
        );
        let events = classify(&record("/auth/ldap99/salt"), &dir).unwrap();
        assert_eq!(families(&events), vec![MetricFamily::AuthBackendObjects]);
    }

    #[test]
    fn test_approle_routing() {
        let dir = directory();
        let cases = [
            ("accessor", MetricFamily::AuthBackendSecretIdsAccessors),
            ("role_id", MetricFamily::AuthBackendRoleIds),
            ("secret_id", MetricFamily::AuthBackendSecretIds),
            ("role", MetricFamily::AuthBackendRoles),
        ];
        for (sub, family) in cases {
            let path = format!("/auth/appr01/{}/x", sub);
            let events = classify(&record(&path), &dir).unwrap();
            assert_eq!(
                families(&events),
                vec![MetricFamily::AuthBackendObjects, family],
                "sub-resource {}",
                sub
            );
        }
    }

    #[test]
    fn test_unresolved_auth_accessor_is_fatal() {
        let dir = directory();
        let err = classify(&record("/auth/nope/user/bob"), &dir).unwrap_err();
        assert!(matches!(err, ClassifyError::UnresolvedAuthAccessor { .. }));
    }

    #[test]
    fn test_cubbyhole_and_identity_emit_objects_and_secrets() {
        let dir = directory();
        for accessor in ["cubacc", "idacc"] {
            let path = format!("/logical/{}/some/key", accessor);
            let events = classify(&record(&path), &dir).unwrap();
            assert_eq!(
                families(&events),
                vec![
                    MetricFamily::SecretsEngineObjects,
                    MetricFamily::SecretsEngineSecrets
                ]
            );
            assert_eq!(events[0].labels[2], "");
        }
    }

    #[test]
    fn test_kv2_metadata_two_events_version_2() {
        let dir = directory();
        let events = classify(&record("/logical/kv2acc/x/metadata/app"), &dir).unwrap();
        assert_eq!(
            families(&events),
            vec![
                MetricFamily::SecretsEngineObjects,
                MetricFamily::SecretsEngineSecrets
            ]
        );
        for event in &events {
            assert_eq!(event.labels, vec!["kv", "project-kv2", "2"]);
            assert_eq!(event.count_delta, 1);
        }
    }

    #[test]
    fn test_kv2_subtree_routing() {
        let dir = directory();
        let cases = [
            ("versions", Some(MetricFamily::SecretsEngineSecretsVersions)),
            ("archive", Some(MetricFamily::SecretsEngineSecretsArchives)),
            ("policy", Some(MetricFamily::SecretsEngineSecretsPolicies)),
            ("config", None),
            ("salt", None),
            ("upgrading", None),
            ("mystery", None),
        ];
        for (sub, extra) in cases {
            let path = format!("/logical/kv2acc/x/{}/app", sub);
            let events = classify(&record(&path), &dir).unwrap();
            let mut expected = vec![MetricFamily::SecretsEngineObjects];
            expected.extend(extra);
            assert_eq!(families(&events), expected, "sub-path {}", sub);
        }
    }

    #[test]
    fn test_kv2_short_path_counted_as_v1() {
        let dir = directory();
        // 4 segments only: the v2 sub-tree marker is missing.
        let events = classify(&record("/logical/kv2acc/app"), &dir).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].labels, vec!["kv", "project-kv2", "1"]);
    }

    #[test]
    fn test_kv_without_version_option_is_v1() {
        let dir = directory();
        let events = classify(&record("/logical/kv1acc/app/secret/deep"), &dir).unwrap();
        assert_eq!(
            families(&events),
            vec![
                MetricFamily::SecretsEngineObjects,
                MetricFamily::SecretsEngineSecrets
            ]
        );
        assert_eq!(events[0].labels, vec!["kv", "legacy-kv", "1"]);
        assert_eq!(events[1].labels, vec!["kv", "legacy-kv", "1"]);
    }

    #[test]
    fn test_transit_routing() {
        let dir = directory();
        let events = classify(&record("/logical/tracc/archive/mykey"), &dir).unwrap();
        assert_eq!(
            families(&events),
            vec![
                MetricFamily::SecretsEngineObjects,
                MetricFamily::SecretsEngineSecretsArchives
            ]
        );
        assert_eq!(events[0].labels, vec!["transit", "transit", ""]);
        assert_eq!(events[1].labels, vec!["transit", "transit", "2"]);

        let events = classify(&record("/logical/tracc/keys/mykey"), &dir).unwrap();
        assert_eq!(families(&events), vec![MetricFamily::SecretsEngineObjects]);
    }

    #[test]
    fn test_unknown_engine_kind_is_uncounted_gap() {
        let dir = directory();
        let events = classify(&record("/logical/unkacc/jobs/x"), &dir).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_unresolved_engine_accessor_is_fatal() {
        let dir = directory();
        let err = classify(&record("/logical/ghost/x"), &dir).unwrap_err();
        assert!(matches!(err, ClassifyError::UnresolvedEngineAccessor { .. }));
    }

    #[test]
    fn test_sys_static_areas() {
        let dir = directory();
        let cases = [
            ("/sys/counters/requests", "counters"),
            ("/sys/policy/default", "policies"),
            ("/sys/config/cors", "config"),
        ];
        for (path, label) in cases {
            let events = classify(&record(path), &dir).unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].family, MetricFamily::SystemObjects);
            assert_eq!(events[0].labels, vec![label]);
        }
    }

    #[test]
    fn test_sys_token_resolved_by_kind() {
        let dir = directory();
        let events = classify(&record("/sys/token/accessor/h123"), &dir).unwrap();
        assert_eq!(
            families(&events),
            vec![
                MetricFamily::AuthBackendObjects,
                MetricFamily::AuthBackendTokenAccessors
            ]
        );
        assert_eq!(events[0].labels, vec!["token", "token"]);

        let events = classify(&record("/sys/token/id/h456"), &dir).unwrap();
        assert_eq!(
            families(&events),
            vec![
                MetricFamily::AuthBackendObjects,
                MetricFamily::AuthBackendTokens
            ]
        );
    }

    #[test]
    fn test_expire_auth_login_resolved_by_name() {
        let dir = directory();
        let events = classify(&record("/sys/expire/id/auth/project/login/h1"), &dir).unwrap();
        assert_eq!(
            families(&events),
            vec![
                MetricFamily::AuthBackendObjects,
                MetricFamily::AuthBackendTokens
            ]
        );
        assert_eq!(events[0].labels, vec!["userpass", "project"]);
    }

    #[test]
    fn test_expire_auth_accepts_accessor_fallback() {
        let dir = directory();
        let events = classify(&record("/sys/expire/id/auth/abc123/login/h1"), &dir).unwrap();
        assert_eq!(events[0].labels, vec!["userpass", "project"]);
        assert_eq!(events[1].family, MetricFamily::AuthBackendTokens);
    }

    #[test]
    fn test_expire_auth_renew_self() {
        let dir = directory();
        let events =
            classify(&record("/sys/expire/id/auth/project/renew-self/h1"), &dir).unwrap();
        assert_eq!(
            families(&events),
            vec![
                MetricFamily::AuthBackendObjects,
                MetricFamily::AuthBackendTokenRenewSelf
            ]
        );
    }

    #[test]
    fn test_expire_auth_other_leaf_objects_only() {
        let dir = directory();
        let events = classify(&record("/sys/expire/id/auth/project/other/h1"), &dir).unwrap();
        assert_eq!(families(&events), vec![MetricFamily::AuthBackendObjects]);
    }

    #[test]
    fn test_expire_unknown_auth_name_is_fatal() {
        let dir = directory();
        let err = classify(&record("/sys/expire/id/auth/ghost/login/h1"), &dir).unwrap_err();
        assert!(matches!(err, ClassifyError::UnresolvedAuthName { .. }));
    }

    #[test]
    fn test_expire_engine_lease_uses_expire_marker() {
        let dir = directory();
        let events = classify(&record("/sys/expire/id/project-kv2/app/h1"), &dir).unwrap();
        assert_eq!(
            families(&events),
            vec![
                MetricFamily::SecretsEngineObjects,
                MetricFamily::SecretsEngineSecrets
            ]
        );
        for event in &events {
            assert_eq!(event.labels, vec!["project-kv2", "expire", ""]);
        }
    }

    #[test]
    fn test_unknown_domain_yields_no_events() {
        let dir = directory();
        assert!(classify(&record("/wal/segment/1"), &dir).unwrap().is_empty());
        assert!(classify(&record("/sys/internal/ui"), &dir).unwrap().is_empty());
    }

    #[test]
    fn test_classification_is_pure() {
        let dir = directory();
        let rec = record("/logical/kv2acc/x/versions/app");
        let first = classify(&rec, &dir).unwrap();
        let second = classify(&rec, &dir).unwrap();
        assert_eq!(first, second);
    }
}
