use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt as _};
use twilight_http::Client;
use twilight_model::gateway::event::Event;

use rustls::crypto::ring::default_provider;

use folio_commands::{handle_event, handle_message};
use folio_core::{BotConfig, Context};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();

    let config = BotConfig::from_env()?;
    let token = config.token.clone();

    // Create a single shared HTTP Client
    let http = Arc::new(Client::new(token.clone()));
    let current_user = http.current_user().await?.model().await?;
    info!(user_id = current_user.id.get(), "authenticated as {}", current_user.name);

    let ctx = Context::new(Arc::clone(&http), current_user.id, config);

    // Reactions drive navigation, message content drives commands and replies
    let intents = Intents::GUILDS
        | Intents::GUILD_MESSAGES
        | Intents::MESSAGE_CONTENT
        | Intents::GUILD_MESSAGE_REACTIONS
        | Intents::DIRECT_MESSAGES
        | Intents::DIRECT_MESSAGE_REACTIONS;

    let mut shard = Shard::new(ShardId::new(0, 1), token, intents);

    info!("Folio is connecting...");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(source) => {
                error!(?source, "gateway event stream error");
                continue;
            }
        };

        handle_event(&ctx, &event);

        match event {
            Event::Ready(_) => {
                info!("Folio is ready.");
            }
            Event::MessageCreate(msg) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    let channel_id = msg.channel_id.get();
                    if let Err(source) = handle_message(ctx, msg).await {
                        error!(?source, channel_id, "command failed");
                    }
                });
            }
            _ => {} // Ignore unused events
        }
    }

    Ok(())
}
