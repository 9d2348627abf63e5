// VRM diagnostics endpoint
//
// Returns the full raw telemetry set for one installation in a single
// response -- no pagination. Each record is one (device, instance,
// field, value) tuple; flattening into per-device maps happens in
// vrmlink-core.

use tracing::debug;

use crate::client::VrmClient;
use crate::error::Error;
use crate::models::{DiagnosticRecord, DiagnosticsPayload, Envelope};

impl VrmClient {
    /// Fetch all diagnostic records for an installation.
    ///
    /// `GET /installations/{idSite}/diagnostics`
    pub async fn diagnostics(
        &self,
        id_site: i64,
        auth: &str,
    ) -> Result<Vec<DiagnosticRecord>, Error> {
        let url = self.api_url(&format!("installations/{id_site}/diagnostics"));
        debug!(id_site, "fetching diagnostics");

        let resp: Envelope<DiagnosticsPayload> = self.get(url, auth).await?;
        Ok(resp.into_data("fetch diagnostics")?.records)
    }
}
