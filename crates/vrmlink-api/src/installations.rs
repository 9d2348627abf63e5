// VRM installation endpoints
//
// Installations ("sites") are user-scoped. The poller re-enumerates them
// every cycle; nothing is cached here.

use tracing::debug;

use crate::client::VrmClient;
use crate::error::Error;
use crate::models::{Envelope, Installation, InstallationsPayload};

impl VrmClient {
    /// List all installations visible to the user.
    ///
    /// `GET /users/{idUser}/installations`
    pub async fn list_installations(
        &self,
        id_user: i64,
        auth: &str,
    ) -> Result<Vec<Installation>, Error> {
        let url = self.api_url(&format!("users/{id_user}/installations"));
        debug!(id_user, "listing installations");

        let resp: Envelope<InstallationsPayload> = self.get(url, auth).await?;
        Ok(resp.into_data("list installations")?.records)
    }
}
