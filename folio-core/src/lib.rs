use std::sync::Arc;

use twilight_http::Client;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, UserMarker},
};

use folio_utils::pagination::{
    DiscordSurface, EventHub, NavigatorConfig, Paginator, PaginatorConfig, PaginatorError,
};

mod config;

pub use config::BotConfig;

/// Shared application context passed into command handlers.
///
/// Cheap to clone because it only stores reference-counted shared state.
#[derive(Clone)]
pub struct Context {
    pub http: Arc<Client>,
    /// Gateway events fan out to running navigators through this hub.
    pub hub: EventHub,
    pub current_user: Id<UserMarker>,
    pub config: Arc<BotConfig>,
}

impl Context {
    /// Create a new application context.
    pub fn new(http: Arc<Client>, current_user: Id<UserMarker>, config: BotConfig) -> Self {
        Self {
            http,
            hub: EventHub::new(),
            current_user,
            config: Arc::new(config),
        }
    }

    /// A surface posting into `channel_id` as the bot.
    pub fn surface(&self, channel_id: Id<ChannelMarker>) -> Arc<DiscordSurface> {
        Arc::new(DiscordSurface::new(
            self.http.clone(),
            channel_id,
            self.current_user,
        ))
    }

    pub fn navigator_config(&self) -> NavigatorConfig {
        NavigatorConfig {
            timeout: self.config.navigator_timeout,
            max_content_chars: self.config.page_max_chars,
            ..NavigatorConfig::default()
        }
    }

    /// A paginator sized for the configured page budget.
    pub fn paginator(&self, prefix: &str, suffix: &str) -> Result<Paginator, PaginatorError> {
        Paginator::new(PaginatorConfig {
            max_chars: self.config.page_max_chars,
            max_lines: self.config.page_max_lines,
            prefix: prefix.to_owned(),
            suffix: suffix.to_owned(),
            ..PaginatorConfig::default()
        })
    }
}
