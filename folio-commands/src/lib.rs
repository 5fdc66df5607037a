pub mod navigate;
pub mod utility;

use twilight_model::gateway::{event::Event, payload::incoming::MessageCreate};

use folio_core::Context;
use folio_utils::COMMAND_PREFIX;
use folio_utils::pagination::surface_event_from_gateway;
use folio_utils::parse::split_command;

// Global command meta data
pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::help::META,
    utility::show::META,
    utility::pagetest::META,
    utility::choose::META,
    // Add new commands here
];

/// Forward gateway events that concern surfaces to every running navigator.
pub fn handle_event(ctx: &Context, event: &Event) {
    for surface_event in surface_event_from_gateway(event) {
        ctx.hub.publish(surface_event);
    }
}

pub async fn handle_message(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    if msg.author.bot {
        return Ok(());
    }

    let Some((name, args)) = split_command(msg.content.trim(), COMMAND_PREFIX) else {
        return Ok(());
    };
    let cmd = name.to_ascii_lowercase();
    let args = args.to_owned();
    let rest = Some(args.as_str()).filter(|value| !value.is_empty());

    let (arg1, arg_tail): (Option<&str>, Option<&str>) = match rest {
        Some(value) => {
            let mut args = value.splitn(2, char::is_whitespace);
            let first = args.next().filter(|arg| !arg.is_empty());
            let tail = args
                .next()
                .map(str::trim)
                .filter(|remaining| !remaining.is_empty());

            (first, tail)
        }
        None => (None, None),
    };

    match cmd.as_str() {
        "help" => utility::help::run(ctx.clone(), msg, arg1).await?,
        "show" => utility::show::run(ctx.clone(), msg, rest).await?,
        "pagetest" => utility::pagetest::run(ctx.clone(), msg, arg1, arg_tail).await?,
        "choose" => utility::choose::run(ctx.clone(), msg, rest).await?,
        // Add new commands here
        _ => {}
    }

    Ok(())
}
