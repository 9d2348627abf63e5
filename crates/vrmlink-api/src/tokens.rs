// VRM access-token endpoints
//
// Long-lived access tokens are listed, created, and revoked under the
// user scope. Listing feeds duplicate-name detection before creation;
// revocation requires the token id from the listing.

use serde_json::json;
use tracing::debug;

use crate::client::VrmClient;
use crate::error::Error;
use crate::models::{AccessTokenRecord, EmptyPayload, Envelope, TokenCreatedPayload, TokensPayload};

impl VrmClient {
    /// List all access tokens for the user.
    ///
    /// `GET /users/{idUser}/accesstokens`
    pub async fn list_access_tokens(
        &self,
        id_user: i64,
        auth: &str,
    ) -> Result<Vec<AccessTokenRecord>, Error> {
        let url = self.api_url(&format!("users/{id_user}/accesstokens"));
        debug!(id_user, "listing access tokens");

        let resp: Envelope<TokensPayload> = self.get(url, auth).await?;
        Ok(resp.into_data("list access tokens")?.tokens)
    }

    /// Create a named access token, returning the token value.
    ///
    /// `POST /users/{idUser}/accesstokens`
    pub async fn create_access_token(
        &self,
        id_user: i64,
        name: &str,
        auth: &str,
    ) -> Result<String, Error> {
        let url = self.api_url(&format!("users/{id_user}/accesstokens"));
        debug!(id_user, name, "creating access token");

        let body = json!({ "name": name });
        let resp: Envelope<TokenCreatedPayload> = self.post(url, Some(auth), &body).await?;

        resp.into_data("create access token")?
            .token
            .ok_or_else(|| Error::Api {
                message: "create access token returned no token".into(),
            })
    }

    /// Revoke an access token by id.
    ///
    /// `DELETE /users/{idUser}/accesstokens/{idAccessToken}`
    pub async fn revoke_access_token(
        &self,
        id_user: i64,
        token_id: &str,
        auth: &str,
    ) -> Result<(), Error> {
        let url = self.api_url(&format!("users/{id_user}/accesstokens/{token_id}"));
        debug!(id_user, token_id, "revoking access token");

        let resp: Envelope<EmptyPayload> = self.delete(url, auth).await?;
        resp.into_data("revoke access token")?;
        Ok(())
    }
}
