//! Immutable mount directory.
//!
//! Two disjoint tables — auth backends and secrets engines — each keyed by
//! mount accessor, built once before stream processing from snapshots of
//! the Vault mount tables and never mutated afterwards. The classifier
//! resolves every key path against this directory; a lookup miss means the
//! directory snapshot does not match the backup and is fatal upstream.

use std::collections::HashMap;

/// One mounted auth backend or secrets engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Opaque accessor, stable across mount path renames.
    pub accessor: String,
    /// Plugin type ("userpass", "kv", "transit", ...).
    pub kind: String,
    /// Mount path with the trailing slash stripped.
    pub name: String,
    /// Mount options ("version" for kv engines, notably).
    pub options: HashMap<String, String>,
}

impl MountEntry {
    /// Convenience constructor for entries without options.
    pub fn new(accessor: &str, kind: &str, name: &str) -> Self {
        Self {
            accessor: accessor.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            options: HashMap::new(),
        }
    }

    /// Same, with options.
    pub fn with_options(
        accessor: &str,
        kind: &str,
        name: &str,
        options: HashMap<String, String>,
    ) -> Self {
        Self {
            options,
            ..Self::new(accessor, kind, name)
        }
    }
}

/// Read-only lookup over the two mount tables.
pub struct MountDirectory {
    auth: HashMap<String, MountEntry>,
    secrets: HashMap<String, MountEntry>,
}

impl MountDirectory {
    /// Build the directory from accessor-keyed entry lists.
    pub fn new(auth: Vec<MountEntry>, secrets: Vec<MountEntry>) -> Self {
        Self {
            auth: auth.into_iter().map(|e| (e.accessor.clone(), e)).collect(),
            secrets: secrets
                .into_iter()
                .map(|e| (e.accessor.clone(), e))
                .collect(),
        }
    }

    /// Look up an auth backend by accessor.
    pub fn lookup_auth(&self, accessor: &str) -> Option<&MountEntry> {
        self.auth.get(accessor)
    }

    /// Look up a secrets engine by accessor.
    pub fn lookup_secrets_engine(&self, accessor: &str) -> Option<&MountEntry> {
        self.secrets.get(accessor)
    }

    /// Find an auth backend by plugin type (linear scan).
    ///
    /// Only used for the token subsystem, which backup paths address by
    /// type rather than by accessor.
    pub fn find_auth_by_kind(&self, kind: &str) -> Option<&MountEntry> {
        self.auth.values().find(|e| e.kind == kind)
    }

    /// Find an auth backend by mount name (linear scan).
    ///
    /// Expiration index paths (`/sys/expire/id/auth/<name>/...`) carry the
    /// mount name, not the accessor.
    pub fn find_auth_by_name(&self, name: &str) -> Option<&MountEntry> {
        self.auth.values().find(|e| e.name == name)
    }

    /// Number of known auth backends.
    pub fn auth_count(&self) -> usize {
        self.auth.len()
    }

    /// Number of known secrets engines.
    pub fn secrets_count(&self) -> usize {
        self.secrets.len()
    }
}
