// The polling pipeline: sites → diagnostics → snapshots → MQTT.
//
// One logical thread, strictly sequential: fetch, publish, sleep,
// repeat. No jitter and no overlap guard -- a cycle that outruns the
// interval simply delays the next one. Cancellation is observed between
// cycles and during the sleep; on shutdown the publisher flushes its
// retained offline status before the loop returns.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::publisher::MqttPublisher;
use crate::session::Session;

/// Drives the fetch-and-republish cycle on a fixed interval.
pub struct Poller {
    session: Session,
    publisher: MqttPublisher,
    interval: Duration,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(
        session: Session,
        publisher: MqttPublisher,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            publisher,
            interval,
            cancel,
        }
    }

    /// Poll until cancelled, then stop the publisher and return.
    ///
    /// Terminal errors (token conflicts and token operations) propagate;
    /// anything else is logged and retried on the next cycle.
    pub async fn run(mut self) -> Result<(), CoreError> {
        info!("polling interval: {} seconds", self.interval.as_secs());

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match self.run_interval().await {
                Ok(()) => {}
                Err(e) if e.is_terminal() => {
                    self.publisher.stop().await;
                    return Err(e);
                }
                Err(e) => warn!("poll cycle failed, retrying next interval: {e}"),
            }

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("shutdown requested, stopping");
        self.publisher.stop().await;
        Ok(())
    }

    /// One cycle: enumerate sites, fetch and flatten each, publish one
    /// message per device.
    async fn run_interval(&mut self) -> Result<(), CoreError> {
        let sites = self.session.list_sites().await?;

        for site in sites {
            info!(site = site.id_site, "polling site");
            let devices = self.session.device_snapshots(&site).await?;

            for (device_key, fields) in &devices {
                let payload = serde_json::to_string(fields)?;
                self.publisher
                    .publish(&payload, Some(&device_subtopic(site.id_site, device_key)))
                    .await;
            }
        }

        Ok(())
    }
}

/// Subtopic carrying one device's snapshot: `site/<idSite>/<device_key>`.
fn device_subtopic(site_id: i64, device_key: &str) -> String {
    format!("site/{site_id}/{device_key}")
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_subtopic_shape() {
        assert_eq!(
            device_subtopic(101, "solar_charger_1"),
            "site/101/solar_charger_1"
        );
    }
}
