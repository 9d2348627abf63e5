mod cli;
mod error;
mod shutdown;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vrmlink_api::{TransportConfig, VrmClient};
use vrmlink_core::{CredentialCache, MqttPublisher, Poller, Session, SessionState};

use crate::cli::{Cli, Command, ConfigCommand, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, debug: bool) {
    let filter = match (verbosity, debug) {
        (0, false) => "info",
        (0, true) | (1, _) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Run => run_bridge(&cli.global).await,
        Command::Config(args) => match args.command {
            ConfigCommand::Show => show_config(&cli.global),
        },
    }
}

/// Bring up the bridge: broker connection first (so liveness
/// announcements cover the whole run), then the VRM session -- logging
/// in only when the credential cache had nothing -- then the poll loop
/// until a shutdown signal drains it.
async fn run_bridge(global: &GlobalOpts) -> Result<(), CliError> {
    let settings = vrmlink_config::load_settings(global.config.as_deref())?;
    init_tracing(global.verbose, settings.debug);

    let bridge = settings.into_bridge_config();

    let coordinator = shutdown::ShutdownCoordinator::install();

    let mut publisher = MqttPublisher::connect(&bridge.publisher).await;

    let transport = TransportConfig {
        timeout: bridge.http_timeout,
        ..TransportConfig::default()
    };
    let client = VrmClient::new(&transport).map_err(|e| CliError::HttpClient {
        source: e.into(),
    })?;
    let cache = CredentialCache::new(bridge.cache_path);
    let mut session = Session::new(client, bridge.session, cache);

    if session.authorization_value().is_none() {
        if let Err(e) = session.login().await {
            publisher.stop().await;
            return Err(e.into());
        }
    }
    if session.state() == SessionState::Failed {
        publisher.stop().await;
        return Err(CliError::AuthFailed);
    }

    Poller::new(
        session,
        publisher,
        bridge.poll_interval,
        coordinator.token(),
    )
    .run()
    .await?;

    Ok(())
}

/// Print the resolved settings, secrets redacted.
fn show_config(global: &GlobalOpts) -> Result<(), CliError> {
    let settings = vrmlink_config::load_settings(global.config.as_deref())?;

    println!("username               = {}", settings.username);
    println!("password               = <redacted>");
    println!(
        "site_id                = {}",
        settings.site_id.as_deref().unwrap_or("<unset>")
    );
    println!("token_name             = {}", settings.token_name);
    println!(
        "revoke_duplicate_token = {}",
        settings.revoke_duplicate_token
    );
    println!("mqtt_host              = {}", settings.mqtt_host);
    println!("mqtt_port              = {}", settings.mqtt_port);
    println!("mqtt_topic             = {}", settings.mqtt_topic);
    println!("mqtt_client_id         = {}", settings.mqtt_client_id);
    println!(
        "mqtt_username          = {}",
        settings.mqtt_username.as_deref().unwrap_or("<unset>")
    );
    println!(
        "mqtt_password          = {}",
        if settings.mqtt_password.is_some() {
            "<redacted>"
        } else {
            "<unset>"
        }
    );
    println!("mqtt_connect_timeout   = {}s", settings.mqtt_connect_timeout);
    println!("poll_interval          = {}s", settings.poll_interval);
    println!("http_timeout           = {}s", settings.http_timeout);
    println!("debug                  = {}", settings.debug);
    println!("cache_path             = {}", settings.cache_path().display());

    Ok(())
}
