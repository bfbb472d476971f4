use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use slackgem_ai::create_provider;
use slackgem_core::BotConfig;
use slackgem_core::http_server::{start_event_server, EventServerState};
use slackgem_core::platforms::slack::SlackWebClient;
use slackgem_core::services::{MessageHandler, RelayService};

#[derive(Parser, Debug, Clone)]
#[command(name = "slackgem")]
#[command(author, version, about = "Slack bot that relays messages to Gemini and posts the analysis back")]
struct Args {
    /// Port for the Slack events endpoint (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Address to which the server will bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("slackgem=info,slackgem_core=info,slackgem_ai=info,tower_http=info"));
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match BotConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Cannot start: {}", e);
            return Err(e.into());
        }
    };
    info!("slackgem starting. config={:?}", config);

    let generator = create_provider(config.provider_config())?;
    info!("Using {} model '{}'", generator.name(), config.gemini_model);

    let slack = Arc::new(SlackWebClient::with_api_base(
        config.slack_bot_token.clone(),
        config.slack_api_base.clone(),
    ));
    let relay = Arc::new(RelayService::new(MessageHandler::new(generator), slack));
    let state = EventServerState::new(relay, config.slack_signing_secret.clone());

    let port = args.port.unwrap_or(config.port);
    let addr = SocketAddr::new(args.bind, port);
    let (mut server_handle, shutdown_tx) = start_event_server(addr, state).await?;

    let stopped_early = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!("Failed to listen for Ctrl-C: {:?}", e);
            }
            false
        }
        _ = &mut server_handle => true,
    };

    if stopped_early {
        error!("Event server stopped unexpectedly.");
        anyhow::bail!("event server on {} stopped unexpectedly", addr);
    }

    info!("Ctrl-C detected; shutting down event server...");
    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    info!("Main finished. Goodbye!");
    Ok(())
}
