// Disk-backed credential cache.
//
// Holds the long-lived access token and the user id it belongs to, so a
// restarted process can resume without logging in again. The cache is
// strictly best-effort: a missing, unreadable, or corrupt file is the
// same as no cache, and a failed write never interrupts the run -- the
// in-memory session state stays authoritative.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// The persisted record: `{ "access_token": ..., "idUser": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCredential {
    pub access_token: String,
    #[serde(rename = "idUser")]
    pub id_user: i64,
    /// When the token was cached. Informational only.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Single-writer cache of one credential at a fixed path.
#[derive(Debug)]
pub struct CredentialCache {
    path: PathBuf,
}

impl CredentialCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the cached credential, if any.
    ///
    /// Never fails: absence is the normal first-run state, and a corrupt
    /// file is logged and treated as absent.
    pub fn load(&self) -> Option<CachedCredential> {
        if !self.path.exists() {
            return None;
        }

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to read credential cache {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str::<CachedCredential>(&raw) {
            Ok(cred) => {
                info!(
                    "loaded cached credential: t={}..., u={}",
                    prefix(&cred.access_token),
                    cred.id_user
                );
                Some(cred)
            }
            Err(e) => {
                warn!(
                    "ignoring corrupt credential cache {}: {e}",
                    self.path.display()
                );
                None
            }
        }
    }

    /// Persist a credential, overwriting any previous one.
    ///
    /// Written to a temp file and renamed into place so readers never
    /// see a half-written record. Failures are logged, not escalated.
    pub fn save(&self, access_token: &str, id_user: i64) {
        let cred = CachedCredential {
            access_token: access_token.to_owned(),
            id_user,
            saved_at: Some(Utc::now()),
        };

        if let Err(e) = self.write(&cred) {
            warn!(
                "failed to write credential cache {}: {e}",
                self.path.display()
            );
            return;
        }

        info!(
            "credential cached to disk: t={}..., u={}",
            prefix(access_token),
            id_user
        );
    }

    fn write(&self, cred: &CachedCredential) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string(cred)?)?;
        fs::rename(&tmp, &self.path)
    }
}

/// First few characters of a token for log lines -- never the whole
/// secret.
fn prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(10)
        .map_or(token.len(), |(i, _)| i);
    &token[..end]
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_in(dir: &tempfile::TempDir) -> CredentialCache {
        CredentialCache::new(dir.path().join("credentials.json"))
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(cache_in(&dir).load().is_none());
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = cache_in(&dir);

        cache.save("long-lived-token", 4242);

        let cred = cache.load().expect("credential should load");
        assert_eq!(cred.access_token, "long-lived-token");
        assert_eq!(cred.id_user, 4242);
        assert!(cred.saved_at.is_some());
    }

    #[test]
    fn save_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = cache_in(&dir);

        cache.save("first", 1);
        cache.save("second", 2);

        let cred = cache.load().expect("credential should load");
        assert_eq!(cred.access_token, "second");
        assert_eq!(cred.id_user, 2);
    }

    #[test]
    fn corrupt_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{ not json").expect("write");

        assert!(CredentialCache::new(path).load().is_none());
    }

    #[test]
    fn legacy_record_without_timestamp_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        fs::write(&path, r#"{"access_token":"tok","idUser":7}"#).expect("write");

        let cred = CredentialCache::new(path).load().expect("should load");
        assert_eq!(cred.access_token, "tok");
        assert_eq!(cred.id_user, 7);
        assert!(cred.saved_at.is_none());
    }

    #[test]
    fn short_token_prefix_does_not_panic() {
        assert_eq!(prefix("abc"), "abc");
        assert_eq!(prefix("0123456789abcdef"), "0123456789");
    }
}
