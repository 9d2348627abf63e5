// VRM API HTTP client
//
// Wraps `reqwest::Client` with VRM-specific URL construction and body
// parsing. All endpoint groups (auth, tokens, installations,
// diagnostics) are implemented as inherent methods via separate files to
// keep this module focused on transport mechanics.
//
// Authorization is caller-supplied: the session layer owns token state
// and passes the formatted `x-authorization` value into each call.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Production base URL of the VRM cloud API.
pub const DEFAULT_BASE_URL: &str = "https://vrmapi.victronenergy.com/v2";

/// Header carrying the authorization value on every authenticated call.
const AUTH_HEADER: &str = "x-authorization";

/// Raw HTTP client for the VRM cloud API.
///
/// Stateless apart from the connection pool: token lifecycle lives in
/// `vrmlink-core`, which threads the authorization value through each
/// method.
pub struct VrmClient {
    http: reqwest::Client,
    base_url: Url,
}

impl VrmClient {
    /// Create a client against [`DEFAULT_BASE_URL`].
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL)?;
        Self::with_base_url(base_url, transport)
    }

    /// Create a client against a custom base URL (tests, staging).
    pub fn with_base_url(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
        })
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL for an API path relative to the versioned base.
    pub(crate) fn api_url(&self, path: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/{path}");
        Url::parse(&full).expect("invalid API URL")
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url, auth: &str) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(AUTH_HEADER, auth)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_body(resp).await
    }

    /// Send a POST request with a JSON body. `auth` is `None` only for
    /// the login endpoint.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        auth: Option<&str>,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let mut builder = self.http.post(url).json(body);
        if let Some(auth) = auth {
            builder = builder.header(AUTH_HEADER, auth);
        }
        let resp = builder.send().await.map_err(Error::Transport)?;

        Self::parse_body(resp).await
    }

    /// Send an authenticated DELETE request.
    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        url: Url,
        auth: &str,
    ) -> Result<T, Error> {
        debug!("DELETE {}", url);

        let resp = self
            .http
            .delete(url)
            .header(AUTH_HEADER, auth)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_body(resp).await
    }

    /// Decode a response body, mapping HTTP-level failures first.
    ///
    /// The VRM API reports most failures inside the JSON envelope with
    /// HTTP 200, so the interesting checks happen in
    /// [`Envelope::into_data`](crate::models::Envelope::into_data) --
    /// this only handles transport-visible statuses and malformed
    /// bodies.
    async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "token expired or invalid credentials".into(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: format!("HTTP {status}: {}", &body[..body.len().min(200)]),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}
