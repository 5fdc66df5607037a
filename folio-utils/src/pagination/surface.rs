//! The rendering surface a navigator draws on.
//!
//! A surface is anything that can post text, replace it with a page view,
//! delete it, and carry a row of pressable controls under it. The chat
//! adapter maps messages and reactions onto this; tests use the in-memory
//! implementation.

use async_trait::async_trait;

use super::page::PageView;

/// Identifies one posted piece of content.
pub type SurfaceId = u64;

/// Identifies a participant able to press controls.
pub type ActorId = u64;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface no longer exists")]
    NotFound,
    #[error("missing permission to modify the surface")]
    Forbidden,
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// One control as currently shown on a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedControl {
    pub symbol: String,
    /// Whether the navigator's own actor placed this control.
    pub mine: bool,
    /// Other actors who pressed this control and are still recorded on it.
    pub foreign: Vec<ActorId>,
}

#[async_trait]
pub trait Surface: Send + Sync {
    /// The scope replies are awaited in, such as a channel.
    fn scope(&self) -> u64;

    /// The actor the navigator acts as.
    fn self_actor(&self) -> ActorId;

    /// Post new content, returning its id.
    async fn render(&self, content: &str) -> Result<SurfaceId, SurfaceError>;

    /// Replace the content and embed of a posted surface.
    async fn edit(&self, surface: SurfaceId, view: &PageView) -> Result<(), SurfaceError>;

    async fn delete(&self, surface: SurfaceId) -> Result<(), SurfaceError>;

    /// Controls in display order.
    async fn list_controls(&self, surface: SurfaceId)
    -> Result<Vec<RenderedControl>, SurfaceError>;

    /// Append a control as the navigator's own actor.
    async fn add_control(&self, surface: SurfaceId, symbol: &str) -> Result<(), SurfaceError>;

    /// Remove one actor's press, or the whole control when `actor` is `None`.
    async fn remove_control(
        &self,
        surface: SurfaceId,
        symbol: &str,
        actor: Option<ActorId>,
    ) -> Result<(), SurfaceError>;

    /// Whether `actor` is an automated account. Only the own actor is known by default.
    async fn is_bot(&self, actor: ActorId) -> Result<bool, SurfaceError> {
        Ok(actor == self.self_actor())
    }

    async fn clear_controls(&self, surface: SurfaceId) -> Result<(), SurfaceError> {
        for control in self.list_controls(surface).await? {
            self.remove_control(surface, &control.symbol, None).await?;
        }
        Ok(())
    }
}
