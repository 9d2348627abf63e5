// VRM session lifecycle.
//
// Owns the two-token dance: login yields a short-lived user token, which
// is immediately spent minting a long-lived access token; the access
// token is cached to disk and preferred from then on. There is no
// refresh path -- the access token is expected to outlive the process.

use secrecy::SecretString;
use tracing::{error, info};

use vrmlink_api::VrmClient;
use vrmlink_api::models::Installation;

use crate::cache::CredentialCache;
use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::snapshot::{self, DeviceSnapshot};

/// Authentication states. `UserToken` and `AccessToken` are both
/// "authenticated"; they differ in which credential backs the
/// authorization value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    /// Authenticated via the short-lived login token.
    UserToken,
    /// Authenticated via the long-lived (cached) access token.
    AccessToken,
    /// Login was rejected. Not retried automatically.
    Failed,
}

/// One user's session against the VRM API.
pub struct Session {
    client: VrmClient,
    username: String,
    password: SecretString,
    token_name: String,
    revoke_duplicate: bool,
    cache: CredentialCache,
    user_token: Option<String>,
    access_token: Option<String>,
    user_id: Option<i64>,
    state: SessionState,
}

impl Session {
    /// Create a session, consulting the credential cache once. A cached
    /// access token moves the session straight to
    /// [`SessionState::AccessToken`] with no network traffic.
    pub fn new(client: VrmClient, config: SessionConfig, cache: CredentialCache) -> Self {
        let mut session = Self {
            client,
            username: config.username,
            password: config.password,
            token_name: config.token_name,
            revoke_duplicate: config.revoke_duplicate_token,
            cache,
            user_token: None,
            access_token: None,
            user_id: None,
            state: SessionState::Unauthenticated,
        };

        if let Some(cred) = session.cache.load() {
            session.access_token = Some(cred.access_token);
            session.user_id = Some(cred.id_user);
            session.state = SessionState::AccessToken;
        }

        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The `x-authorization` header value for authenticated calls.
    ///
    /// The access token wins once present (`Token ...`); until then the
    /// login token is used (`Bearer ...`). `None` means no credential at
    /// all -- callers must not attempt authenticated calls.
    pub fn authorization_value(&self) -> Option<String> {
        if let Some(ref access) = self.access_token {
            return Some(format!("Token {access}"));
        }
        self.user_token
            .as_ref()
            .map(|user| format!("Bearer {user}"))
    }

    // ── Login and token establishment ────────────────────────────────

    /// Log in and establish the long-lived access token.
    ///
    /// A rejected login is not an `Err`: it logs, moves the session to
    /// [`SessionState::Failed`], and returns `Ok` -- the caller checks
    /// [`state()`](Self::state) before proceeding. Errors from the
    /// token establishment steps (duplicate conflict, create/revoke
    /// failure) do propagate and are terminal for the run.
    pub async fn login(&mut self) -> Result<(), CoreError> {
        info!(username = %self.username, "logging in to VRM");
        self.state = SessionState::Authenticating;

        match self.client.login(&self.username, &self.password).await {
            Ok(ok) => {
                self.user_token = Some(ok.token);
                self.user_id = Some(ok.id_user);
                self.state = SessionState::UserToken;
            }
            Err(e) if e.is_auth_failure() => {
                error!("login failed: {e}");
                self.state = SessionState::Failed;
                return Ok(());
            }
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(e.into());
            }
        }

        self.establish_access_token().await
    }

    /// Mint the long-lived access token, resolving name collisions
    /// first: an existing token with the configured name is either a
    /// hard conflict or, when the operator opted in, revoked before the
    /// new one is created.
    async fn establish_access_token(&mut self) -> Result<(), CoreError> {
        let (auth, user_id) = self.auth_context()?;

        let tokens = match self.client.list_access_tokens(user_id, &auth).await {
            Ok(tokens) => tokens,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(CoreError::TokenOperation { source: e });
            }
        };

        if let Some(existing) = tokens.into_iter().find(|t| t.name == self.token_name) {
            if !self.revoke_duplicate {
                self.state = SessionState::Failed;
                return Err(CoreError::DuplicateToken {
                    name: self.token_name.clone(),
                });
            }

            info!(
                token_id = %existing.id_access_token,
                "revoking duplicate access token"
            );
            if let Err(e) = self
                .client
                .revoke_access_token(user_id, &existing.id_access_token, &auth)
                .await
            {
                self.state = SessionState::Failed;
                return Err(CoreError::TokenOperation { source: e });
            }
        }

        self.create_access_token().await
    }

    /// Create the access token using the current (user-token)
    /// authorization, store it, and persist it to the cache.
    async fn create_access_token(&mut self) -> Result<(), CoreError> {
        let (auth, user_id) = self.auth_context()?;

        match self
            .client
            .create_access_token(user_id, &self.token_name, &auth)
            .await
        {
            Ok(token) => {
                self.cache.save(&token, user_id);
                self.access_token = Some(token);
                self.state = SessionState::AccessToken;
                info!("access token established");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(CoreError::TokenOperation { source: e })
            }
        }
    }

    // ── Authenticated queries ────────────────────────────────────────

    /// List the installations ("sites") tied to the user. Re-enumerated
    /// every poll cycle; nothing is cached.
    pub async fn list_sites(&self) -> Result<Vec<Installation>, CoreError> {
        let (auth, user_id) = self.auth_context()?;
        Ok(self.client.list_installations(user_id, &auth).await?)
    }

    /// Fetch one site's diagnostics and flatten them into per-device
    /// snapshots.
    pub async fn device_snapshots(
        &self,
        site: &Installation,
    ) -> Result<std::collections::BTreeMap<String, DeviceSnapshot>, CoreError> {
        let (auth, _) = self.auth_context()?;
        let records = self.client.diagnostics(site.id_site, &auth).await?;
        Ok(snapshot::flatten(&records))
    }

    fn auth_context(&self) -> Result<(String, i64), CoreError> {
        match (self.authorization_value(), self.user_id) {
            (Some(auth), Some(user_id)) => Ok((auth, user_id)),
            _ => Err(CoreError::NotAuthenticated),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use vrmlink_api::TransportConfig;

    fn bare_session(dir: &tempfile::TempDir) -> Session {
        let client = VrmClient::new(&TransportConfig::default()).expect("client");
        let config = SessionConfig {
            username: "alice@example.com".into(),
            password: "hunter2".to_string().into(),
            token_name: "vrm-cloud-mqtt".into(),
            revoke_duplicate_token: false,
        };
        let cache = CredentialCache::new(dir.path().join("credentials.json"));
        Session::new(client, config, cache)
    }

    #[test]
    fn no_tokens_means_no_authorization() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = bare_session(&dir);

        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.authorization_value().is_none());
    }

    #[test]
    fn access_token_preferred_over_user_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = bare_session(&dir);

        session.user_token = Some("short".into());
        assert_eq!(
            session.authorization_value().as_deref(),
            Some("Bearer short")
        );

        session.access_token = Some("long".into());
        assert_eq!(session.authorization_value().as_deref(), Some("Token long"));
    }

    #[test]
    fn cached_credential_restores_authorization() {
        let dir = tempfile::tempdir().expect("tempdir");

        {
            let session = bare_session(&dir);
            session.cache.save("persisted-token", 4242);
        }

        let restored = bare_session(&dir);
        assert_eq!(restored.state(), SessionState::AccessToken);
        assert_eq!(
            restored.authorization_value().as_deref(),
            Some("Token persisted-token")
        );
    }

    #[test]
    fn unauthenticated_queries_fail_fast() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = bare_session(&dir);

        let err = session.auth_context().expect_err("should fail");
        assert!(matches!(err, CoreError::NotAuthenticated));
    }
}
