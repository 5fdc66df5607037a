//! Discord-backed surface: messages are surfaces and reactions are controls.

use std::sync::Arc;

use async_trait::async_trait;
use twilight_http::{Client, error::ErrorType, request::channel::reaction::RequestReactionType};
use twilight_model::{
    channel::message::{EmojiReactionType, embed::Embed},
    gateway::event::Event,
    id::{
        Id,
        marker::{ChannelMarker, EmojiMarker, MessageMarker, UserMarker},
    },
};

use super::events::SurfaceEvent;
use super::page::PageView;
use super::surface::{ActorId, RenderedControl, Surface, SurfaceError, SurfaceId};

/// A [`Surface`] posting into one Discord channel.
#[derive(Debug, Clone)]
pub struct DiscordSurface {
    http: Arc<Client>,
    channel_id: Id<ChannelMarker>,
    current_user: Id<UserMarker>,
}

impl DiscordSurface {
    pub fn new(http: Arc<Client>, channel_id: Id<ChannelMarker>, current_user: Id<UserMarker>) -> Self {
        Self {
            http,
            channel_id,
            current_user,
        }
    }

    pub fn channel_id(&self) -> Id<ChannelMarker> {
        self.channel_id
    }
}

fn message_id(surface: SurfaceId) -> Result<Id<MessageMarker>, SurfaceError> {
    Id::new_checked(surface).ok_or(SurfaceError::NotFound)
}

/// Map HTTP 404/403 responses onto the surface error kinds.
fn classify(source: twilight_http::Error) -> SurfaceError {
    if let ErrorType::Response { status, .. } = source.kind() {
        match status.get() {
            404 => return SurfaceError::NotFound,
            403 => return SurfaceError::Forbidden,
            _ => {}
        }
    }

    SurfaceError::Transport(source.into())
}

fn transport(source: impl Into<anyhow::Error>) -> SurfaceError {
    SurfaceError::Transport(source.into())
}

/// Control symbol for a reaction emoji. Custom emoji become `name:id`.
pub fn reaction_symbol(emoji: &EmojiReactionType) -> String {
    match emoji {
        EmojiReactionType::Unicode { name } => name.clone(),
        EmojiReactionType::Custom { id, name, .. } => {
            format!("{}:{}", name.as_deref().unwrap_or_default(), id.get())
        }
    }
}

/// Parse a control symbol back into a reaction for the HTTP API.
fn request_emoji(symbol: &str) -> RequestReactionType<'_> {
    let custom = symbol
        .rsplit_once(':')
        .and_then(|(name, id)| Some((name, Id::<EmojiMarker>::new_checked(id.parse().ok()?)?)));

    match custom {
        Some((name, id)) => RequestReactionType::Custom {
            id,
            name: (!name.is_empty()).then_some(name),
        },
        None => RequestReactionType::Unicode { name: symbol },
    }
}

#[async_trait]
impl Surface for DiscordSurface {
    fn scope(&self) -> u64 {
        self.channel_id.get()
    }

    fn self_actor(&self) -> ActorId {
        self.current_user.get()
    }

    async fn render(&self, content: &str) -> Result<SurfaceId, SurfaceError> {
        let message = self
            .http
            .create_message(self.channel_id)
            .content(content)
            .await
            .map_err(classify)?
            .model()
            .await
            .map_err(transport)?;

        Ok(message.id.get())
    }

    async fn edit(&self, surface: SurfaceId, view: &PageView) -> Result<(), SurfaceError> {
        let embeds: Vec<Embed> = view.embed.iter().cloned().collect();
        let content = (!view.content.is_empty()).then_some(view.content.as_str());

        self.http
            .update_message(self.channel_id, message_id(surface)?)
            .content(content)
            .embeds(Some(&embeds))
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete(&self, surface: SurfaceId) -> Result<(), SurfaceError> {
        self.http
            .delete_message(self.channel_id, message_id(surface)?)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn list_controls(
        &self,
        surface: SurfaceId,
    ) -> Result<Vec<RenderedControl>, SurfaceError> {
        let message_id = message_id(surface)?;
        let message = self
            .http
            .message(self.channel_id, message_id)
            .await
            .map_err(classify)?
            .model()
            .await
            .map_err(transport)?;

        let mut controls = Vec::with_capacity(message.reactions.len());
        for reaction in &message.reactions {
            let symbol = reaction_symbol(&reaction.emoji);

            // Only our own reactions need their foreign presses listed; the rest are removed whole.
            let foreign = if reaction.me && reaction.count > 1 {
                let emoji = request_emoji(&symbol);
                self.http
                    .reactions(self.channel_id, message_id, &emoji)
                    .limit(100)
                    .await
                    .map_err(classify)?
                    .models()
                    .await
                    .map_err(transport)?
                    .into_iter()
                    .filter(|user| user.id != self.current_user)
                    .map(|user| user.id.get())
                    .collect()
            } else {
                Vec::new()
            };

            controls.push(RenderedControl {
                symbol,
                mine: reaction.me,
                foreign,
            });
        }

        Ok(controls)
    }

    async fn add_control(&self, surface: SurfaceId, symbol: &str) -> Result<(), SurfaceError> {
        let emoji = request_emoji(symbol);
        self.http
            .create_reaction(self.channel_id, message_id(surface)?, &emoji)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn remove_control(
        &self,
        surface: SurfaceId,
        symbol: &str,
        actor: Option<ActorId>,
    ) -> Result<(), SurfaceError> {
        let message_id = message_id(surface)?;
        let emoji = request_emoji(symbol);

        match actor {
            None => {
                self.http
                    .delete_all_reaction(self.channel_id, message_id, &emoji)
                    .await
                    .map_err(classify)?;
            }
            Some(actor) if actor == self.current_user.get() => {
                self.http
                    .delete_current_user_reaction(self.channel_id, message_id, &emoji)
                    .await
                    .map_err(classify)?;
            }
            Some(actor) => {
                let user_id = Id::new_checked(actor).ok_or(SurfaceError::NotFound)?;
                self.http
                    .delete_reaction(self.channel_id, message_id, &emoji, user_id)
                    .await
                    .map_err(classify)?;
            }
        }
        Ok(())
    }

    async fn is_bot(&self, actor: ActorId) -> Result<bool, SurfaceError> {
        if actor == self.current_user.get() {
            return Ok(true);
        }

        let user_id = Id::new_checked(actor).ok_or(SurfaceError::NotFound)?;
        let user = self
            .http
            .user(user_id)
            .await
            .map_err(classify)?
            .model()
            .await
            .map_err(transport)?;
        Ok(user.bot)
    }

    async fn clear_controls(&self, surface: SurfaceId) -> Result<(), SurfaceError> {
        self.http
            .delete_all_reactions(self.channel_id, message_id(surface)?)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

/// Translate a gateway event into the surface events navigators listen for.
pub fn surface_event_from_gateway(event: &Event) -> Vec<SurfaceEvent> {
    match event {
        Event::ReactionAdd(reaction) => vec![SurfaceEvent::ControlPressed {
            surface: reaction.message_id.get(),
            symbol: reaction_symbol(&reaction.emoji),
            actor: reaction.user_id.get(),
        }],
        Event::MessageDelete(deleted) => vec![SurfaceEvent::SurfaceDeleted {
            surface: deleted.id.get(),
        }],
        Event::MessageDeleteBulk(deleted) => deleted
            .ids
            .iter()
            .map(|id| SurfaceEvent::SurfaceDeleted { surface: id.get() })
            .collect(),
        Event::MessageCreate(message) if !message.author.bot => vec![SurfaceEvent::Reply {
            scope: message.channel_id.get(),
            surface: message.id.get(),
            actor: message.author.id.get(),
            content: message.content.clone(),
        }],
        _ => Vec::new(),
    }
}
