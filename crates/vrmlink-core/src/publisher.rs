// MQTT publisher with liveness announcements.
//
// The event loop runs in its own task and owns reconnection; it is the
// only writer of the connection state, which the poll loop reads before
// every publish. The state therefore lives in an atomic: transport
// events fire outside the poll loop's call stack.
//
// Liveness contract: the last will (`<base>/status` = "offline",
// retained) is registered before the connection is opened, so abnormal
// termination still announces offline; every successful (re)connect
// publishes a retained "online"; a clean stop publishes a retained
// "offline" before disconnecting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS,
};
use secrecy::ExposeSecret;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PublisherConfig;

const KEEP_ALIVE: Duration = Duration::from_secs(30);
/// Poll granularity while waiting for connection confirmation.
const CONFIRM_POLL: Duration = Duration::from_millis(100);
/// Grace period for the retained offline message to reach the broker.
const OFFLINE_FLUSH_DELAY: Duration = Duration::from_millis(500);
/// Backoff between reconnection attempts after a transport error.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connection lifecycle as observed by publishers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            2 => Self::Connected,
            1 => Self::Connecting,
            _ => Self::Disconnected,
        }
    }
}

/// Handle to the broker connection.
///
/// Publishing is fire-and-forget: failures are logged, never returned,
/// and messages are dropped (not queued) while disconnected.
pub struct MqttPublisher {
    client: AsyncClient,
    base_topic: String,
    status_topic: String,
    state: Arc<AtomicU8>,
    cancel: CancellationToken,
    event_task: Option<JoinHandle<()>>,
}

impl MqttPublisher {
    /// Register the last will, open the connection, and wait up to the
    /// configured timeout for broker confirmation.
    ///
    /// A timeout is not fatal: the publisher is returned in a not-ready
    /// state, publishes drop until the event loop's reconnection
    /// attempts succeed. Callers that care check
    /// [`is_connected`](Self::is_connected).
    pub async fn connect(config: &PublisherConfig) -> Self {
        info!(
            "connecting to MQTT broker ({}:{})",
            config.host, config.port
        );

        let status_topic = format!("{}/status", config.base_topic);

        let mut options =
            MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(KEEP_ALIVE);
        // Will must be registered before the connection is opened.
        options.set_last_will(LastWill::new(
            status_topic.clone(),
            "offline",
            QoS::ExactlyOnce,
            true,
        ));
        if let Some(ref username) = config.username {
            let password = config
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_owned())
                .unwrap_or_default();
            options.set_credentials(username.clone(), password);
        }

        let (client, event_loop) = AsyncClient::new(options, 10);
        let state = Arc::new(AtomicU8::new(ConnectionState::Connecting as u8));
        let cancel = CancellationToken::new();

        let event_task = tokio::spawn(drive_event_loop(
            event_loop,
            client.clone(),
            Arc::clone(&state),
            status_topic.clone(),
            cancel.clone(),
        ));

        let publisher = Self {
            client,
            base_topic: config.base_topic.clone(),
            status_topic,
            state,
            cancel,
            event_task: Some(event_task),
        };

        let deadline = Instant::now() + config.connect_timeout;
        while !publisher.is_connected() && Instant::now() < deadline {
            sleep(CONFIRM_POLL).await;
        }

        if !publisher.is_connected() {
            error!(
                "no MQTT broker confirmation within {}s, continuing not-ready",
                config.connect_timeout.as_secs()
            );
        }

        publisher
    }

    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Publish a payload under `<base>/<subtopic>` (or the base topic
    /// alone). Dropped with a warning while disconnected.
    pub async fn publish(&self, payload: &str, subtopic: Option<&str>) {
        let topic = self.topic(subtopic);

        if !self.is_connected() {
            warn!(%topic, "dropping publish: MQTT broker not connected");
            return;
        }

        debug!(%topic, "publishing");
        if let Err(e) = self
            .client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
        {
            error!("MQTT publish failed: {e}");
        }
    }

    /// Clean shutdown: retained "offline", a short delivery grace
    /// period, then disconnect and halt the event loop. Safe to call
    /// repeatedly or when the connection never came up.
    pub async fn stop(&mut self) {
        debug!("stopping MQTT publisher");

        if self.is_connected() {
            info!("publishing offline status");
            if let Err(e) = self
                .client
                .publish(self.status_topic.as_str(), QoS::ExactlyOnce, true, "offline")
                .await
            {
                error!("failed to publish offline status: {e}");
            }
            sleep(OFFLINE_FLUSH_DELAY).await;

            if let Err(e) = self.client.disconnect().await {
                debug!("MQTT disconnect: {e}");
            }
        }

        self.state
            .store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
        self.cancel.cancel();
        if let Some(task) = self.event_task.take() {
            let _ = task.await;
        }
        debug!("MQTT publisher stopped");
    }

    fn topic(&self, subtopic: Option<&str>) -> String {
        match subtopic {
            Some(sub) => format!("{}/{sub}", self.base_topic),
            None => self.base_topic.clone(),
        }
    }
}

/// Drive the rumqttc event loop until cancelled, tracking connection
/// state and announcing liveness on every successful (re)connect.
async fn drive_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    state: Arc<AtomicU8>,
    status_topic: String,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        info!("connected to MQTT broker");
                        state.store(ConnectionState::Connected as u8, Ordering::SeqCst);
                        if let Err(e) = client
                            .publish(status_topic.as_str(), QoS::ExactlyOnce, true, "online")
                            .await
                        {
                            error!("failed to publish online status: {e}");
                        }
                    } else {
                        error!(code = ?ack.code, "MQTT broker rejected connection");
                        state.store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
                    }
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    warn!("disconnected from MQTT broker");
                    state.store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
                }
                Ok(Event::Incoming(Packet::PubAck(ack))) => {
                    debug!(pkid = ack.pkid, "publish acknowledged");
                }
                Ok(Event::Outgoing(Outgoing::Publish(pkid))) => {
                    debug!(pkid, "publish handed to transport");
                }
                Ok(_) => {}
                Err(e) => {
                    let prior = state.swap(
                        ConnectionState::Disconnected as u8,
                        Ordering::SeqCst,
                    );
                    if ConnectionState::from_u8(prior) == ConnectionState::Connected {
                        error!("MQTT connection lost: {e}");
                    } else {
                        debug!("MQTT connection attempt failed: {e}");
                    }
                    // rumqttc retries on the next poll; pace it.
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = sleep(RECONNECT_DELAY) => {}
                    }
                }
            }
        }
    }
    debug!("MQTT event loop task exiting");
}

// ── Tests ───────────────────────────────────────────────────────────
