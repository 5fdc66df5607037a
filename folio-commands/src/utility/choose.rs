use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::navigate::invocation_for;
use folio_core::Context;
use folio_utils::pagination::{PickError, PickerConfig, option_picker};

pub const META: CommandMeta = CommandMeta {
    name: "choose",
    desc: "Asks you to pick one of several options.",
    category: "utility",
    usage: "!choose <option> | <option> [| <option>...]",
};

/// Options are separated by `|`. Blank entries are dropped.
fn split_options(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_owned)
        .collect()
}

pub async fn run(ctx: Context, msg: Box<MessageCreate>, rest: Option<&str>) -> anyhow::Result<()> {
    let options = rest.map(split_options).unwrap_or_default();
    if options.is_empty() {
        let usage = format!("Usage: `{}`", META.usage);
        ctx.http.create_message(msg.channel_id).content(&usage).await?;
        return Ok(());
    }

    let config = PickerConfig {
        timeout: ctx.config.navigator_timeout,
        ..PickerConfig::default()
    };
    let picked = option_picker(
        ctx.surface(msg.channel_id),
        &ctx.hub,
        options,
        String::clone,
        invocation_for(&msg),
        config,
    )
    .await;

    let out = match picked {
        Ok(Some(option)) => format!("<@{}> picked **{option}**.", msg.author.id),
        Ok(None) => return Ok(()),
        Err(PickError::TimedOut) => "No option was picked in time.".to_owned(),
        Err(source) => return Err(source.into()),
    };

    ctx.http.create_message(msg.channel_id).content(&out).await?;
    Ok(())
}
