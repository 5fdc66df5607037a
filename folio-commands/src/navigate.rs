//! Shared glue for commands that answer with a navigator.

use tracing::{debug, error};
use twilight_model::gateway::payload::incoming::MessageCreate;

use folio_core::Context;
use folio_utils::pagination::{Invocation, Navigator, NavigatorConfig, Paginator};

/// The invocation a command message represents.
pub fn invocation_for(msg: &MessageCreate) -> Invocation {
    Invocation {
        author: msg.author.id.get(),
        message: Some(msg.id.get()),
        shared: msg.guild_id.is_some(),
    }
}

/// Show `paginator` in the message's channel and supervise the navigator in the background.
pub fn navigate(
    ctx: &Context,
    msg: &MessageCreate,
    paginator: &Paginator,
    config: NavigatorConfig,
    command: &'static str,
) -> anyhow::Result<()> {
    let mut navigator = Navigator::from_paginator(
        ctx.surface(msg.channel_id),
        ctx.hub.clone(),
        paginator,
        invocation_for(msg),
        config,
    )?;
    let handle = navigator.start()?;

    let channel_id = msg.channel_id.get();
    tokio::spawn(async move {
        match handle.finished().await {
            Ok(termination) => {
                debug!(command, channel_id, reason = ?termination.reason, "navigator closed");
            }
            Err(source) => {
                error!(?source, command, channel_id, "navigator failed");
            }
        }
    });

    Ok(())
}
