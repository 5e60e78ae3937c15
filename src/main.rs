//! Word Imposter Game Server
//!
//! Authoritative WebSocket server binary. Configuration comes from the
//! environment; see `config` for the recognized keys.

use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use word_imposter::{
    config::{GameConfig, ServerConfig},
    network::auth::AuthConfig,
    GameServer, Orchestrator, VERSION,
};

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let server_config = ServerConfig::from_env();
    let game_config = GameConfig::from_env();
    let auth_config = AuthConfig::from_env();

    info!("Word Imposter Server v{}", VERSION);
    info!(
        "players {}-{}, hint rounds {}, hint turn {}s",
        game_config.min_players,
        game_config.max_players,
        game_config.hint_rounds,
        game_config.hint_turn_secs
    );
    if !auth_config.is_configured() {
        info!("no auth key configured, all sessions will be guests");
    }

    let orchestrator = Arc::new(Orchestrator::with_defaults(game_config));
    let server = GameServer::new(server_config, auth_config, orchestrator);

    if let Err(e) = server.run().await {
        tracing::error!("server error: {e}");
    }
}
