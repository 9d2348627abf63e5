// VRM authentication endpoint
//
// Login is the only unauthenticated call. A successful response carries
// `status == "login_success"` plus the short-lived bearer token and the
// user id that scopes every other endpoint.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::VrmClient;
use crate::error::Error;
use crate::models::{Envelope, LoginOk, LoginPayload};

/// The `status` value marking a successful login.
const LOGIN_SUCCESS: &str = "login_success";

impl VrmClient {
    /// Authenticate with username/password.
    ///
    /// `POST /auth/login`
    ///
    /// Any response whose `status` is not `"login_success"`, or that
    /// lacks the token or user id, is an [`Error::Authentication`].
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<LoginOk, Error> {
        let url = self.api_url("auth/login");
        debug!(%username, "logging in");

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let resp: Envelope<LoginPayload> = self.post(url, None, &body).await?;
        let payload = resp.data;

        match payload.status.as_deref() {
            Some(LOGIN_SUCCESS) => {}
            other => {
                return Err(Error::Authentication {
                    message: format!(
                        "login rejected (status: {})",
                        other.unwrap_or("missing")
                    ),
                });
            }
        }

        match (payload.token, payload.id_user) {
            (Some(token), Some(id_user)) => {
                debug!(id_user, "login successful");
                Ok(LoginOk { token, id_user })
            }
            _ => Err(Error::Authentication {
                message: "login response missing token or idUser".into(),
            }),
        }
    }
}
