use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::navigate::navigate;
use folio_core::Context;
use folio_utils::pagination::Paginator;

pub const META: CommandMeta = CommandMeta {
    name: "show",
    desc: "Pages arbitrary text inside a code block.",
    category: "utility",
    usage: "!show <text>",
};

const CODE_FENCE: &str = "```";

/// Backticks would close the surrounding code block early.
fn escape_backticks(text: &str) -> String {
    text.replace('`', "\u{2032}")
}

/// Page the rest of the message as a code block.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, rest: Option<&str>) -> anyhow::Result<()> {
    let Some(text) = rest else {
        let usage = format!("Usage: `{}`", META.usage);
        ctx.http.create_message(msg.channel_id).content(&usage).await?;
        return Ok(());
    };

    let paginator = code_block(ctx.paginator(CODE_FENCE, CODE_FENCE)?, text);

    // Text the paginator rejects is reported in the channel.
    if let Err(source) = paginator.pages() {
        let out = format!("That text cannot be paged: {source}");
        ctx.http.create_message(msg.channel_id).content(&out).await?;
        return Ok(());
    }

    navigate(&ctx, &msg, &paginator, ctx.navigator_config(), META.name)
}

fn code_block(paginator: Paginator, text: &str) -> Paginator {
    let mut paginator = paginator.with_substitution(escape_backticks);
    paginator.add_block(text);
    paginator
}
