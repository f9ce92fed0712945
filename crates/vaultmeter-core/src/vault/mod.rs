//! Vault admin API client.
//!
//! Fetches the two mount tables (`sys/auth`, `sys/mounts`) the directory
//! is built from, optionally authenticating via AppRole first. Only the
//! handful of endpoints the analyzer needs are implemented.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::mounts::MountEntry;

/// Vault API failure.
#[derive(Debug)]
pub enum VaultError {
    /// Connection or protocol-level failure.
    Transport(String),
    /// Vault answered with a non-success status.
    Status { code: u16, path: String },
    /// The response body does not have the expected shape.
    BadResponse { path: String, reason: String },
}

impl std::fmt::Display for VaultError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultError::Transport(msg) => write!(f, "vault: {}", msg),
            VaultError::Status { code, path } => {
                write!(f, "vault: {} returned status {}", path, code)
            }
            VaultError::BadResponse { path, reason } => {
                write!(f, "vault: unexpected response from {}: {}", path, reason)
            }
        }
    }
}

impl std::error::Error for VaultError {}

/// One mount as listed by `sys/auth` / `sys/mounts`.
#[derive(Debug, Deserialize)]
struct RawMount {
    accessor: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    options: Option<HashMap<String, Value>>,
}

/// Standard Vault response wrapper around the mount map.
#[derive(Debug, Deserialize)]
struct MountListResponse {
    data: HashMap<String, RawMount>,
}

/// AppRole login response, reduced to the one field we use.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: String,
}

/// Minimal blocking Vault client.
pub struct VaultClient {
    addr: String,
    token: String,
    agent: ureq::Agent,
}

impl VaultClient {
    /// Client with an existing token.
    pub fn new(addr: &str, token: &str) -> Self {
        Self {
            addr: addr.trim_end_matches('/').to_string(),
            token: token.to_string(),
            agent: ureq::agent(),
        }
    }

    /// Authenticate via AppRole and return a token-bearing client.
    pub fn approle_login(
        addr: &str,
        role_id: &str,
        secret_id: &str,
    ) -> Result<Self, VaultError> {
        let addr = addr.trim_end_matches('/').to_string();
        let path = "v1/auth/approle/login";
        let url = format!("{}/{}", addr, path);

        let agent = ureq::agent();
        let response = agent
            .post(&url)
            .send_json(serde_json::json!({
                "role_id": role_id,
                "secret_id": secret_id,
            }))
            .map_err(|e| status_error(e, path))?;

        let login: LoginResponse =
            response
                .into_json()
                .map_err(|e| VaultError::BadResponse {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;

        info!(addr = %addr, "authenticated to vault via approle");
        Ok(Self {
            addr,
            token: login.auth.client_token,
            agent,
        })
    }

    /// Auth backend table, accessor-keyed entries.
    pub fn list_auth_mounts(&self) -> Result<Vec<MountEntry>, VaultError> {
        self.list_mounts("v1/sys/auth")
    }

    /// Secrets engine table, accessor-keyed entries.
    pub fn list_secrets_mounts(&self) -> Result<Vec<MountEntry>, VaultError> {
        self.list_mounts("v1/sys/mounts")
    }

    fn list_mounts(&self, path: &str) -> Result<Vec<MountEntry>, VaultError> {
        let url = format!("{}/{}", self.addr, path);
        let response = self
            .agent
            .get(&url)
            .set("X-Vault-Token", &self.token)
            .call()
            .map_err(|e| status_error(e, path))?;

        let listing: MountListResponse =
            response
                .into_json()
                .map_err(|e| VaultError::BadResponse {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(convert_mounts(listing))
    }
}

fn status_error(e: ureq::Error, path: &str) -> VaultError {
    match e {
        ureq::Error::Status(code, _) => VaultError::Status {
            code,
            path: path.to_string(),
        },
        other => VaultError::Transport(other.to_string()),
    }
}

/// Convert the path-keyed API listing into directory entries.
///
/// The mount name is its display path with the trailing slash stripped;
/// option values are flattened to strings (Vault serves them as strings,
/// but the API type is open-ended).
fn convert_mounts(listing: MountListResponse) -> Vec<MountEntry> {
    listing
        .data
        .into_iter()
        .map(|(path, raw)| {
            let options = raw
                .options
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| {
                    let value = match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, value)
                })
                .collect();
            MountEntry {
                accessor: raw.accessor,
                kind: raw.kind,
                name: path.trim_end_matches('/').to_string(),
                options,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_mounts_strips_trailing_slash() {
        let body = serde_json::json!({
            "data": {
                "userpass/": {
                    "accessor": "auth_userpass_abc",
                    "type": "userpass",
                    "options": null
                },
                "project/": {
                    "accessor": "kv_abc",
                    "type": "kv",
                    "options": { "version": "2" }
                }
            }
        });
        let listing: MountListResponse = serde_json::from_value(body).unwrap();
        let mut entries = convert_mounts(listing);
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries[0].name, "project");
        assert_eq!(entries[0].accessor, "kv_abc");
        assert_eq!(entries[0].options.get("version").unwrap(), "2");
        assert_eq!(entries[1].name, "userpass");
        assert_eq!(entries[1].kind, "userpass");
        assert!(entries[1].options.is_empty());
    }

    #[test]
    fn test_convert_mounts_stringifies_non_string_options() {
        let body = serde_json::json!({
            "data": {
                "kv/": {
                    "accessor": "kv_n",
                    "type": "kv",
                    "options": { "version": 2 }
                }
            }
        });
        let listing: MountListResponse = serde_json::from_value(body).unwrap();
        let entries = convert_mounts(listing);
        assert_eq!(entries[0].options.get("version").unwrap(), "2");
    }

    #[test]
    fn test_login_response_shape() {
        let body = serde_json::json!({
            "auth": { "client_token": "s.abcdef", "renewable": true }
        });
        let login: LoginResponse = serde_json::from_value(body).unwrap();
        assert_eq!(login.auth.client_token, "s.abcdef");
    }
}
