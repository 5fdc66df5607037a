use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::navigate::navigate;
use folio_core::Context;
use folio_utils::pagination::{Paginator, PaginatorConfig, PaginatorError, parse_one_based_page};

pub const META: CommandMeta = CommandMeta {
    name: "pagetest",
    desc: "Pages a list of sample items to exercise the navigator.",
    category: "utility",
    usage: "!pagetest [count] [page]",
};

const DEFAULT_ITEMS: usize = 120;
const MAX_ITEMS: usize = 1000;
const LINES_PER_PAGE: usize = 10;

/// Sample pagination command.
///
/// Inputs:
/// - optional item count: `!pagetest [count]`, capped at 1000.
/// - optional 1-based start page: `!pagetest [count] [page]`.
///
/// Error behavior:
/// - returns usage text on invalid input.
/// - returns bounds text when the requested page is out of range.
pub async fn run(
    ctx: Context,
    msg: Box<MessageCreate>,
    arg1: Option<&str>,
    arg2: Option<&str>,
) -> anyhow::Result<()> {
    let http = &ctx.http;

    let Some(count) = parse_count(arg1) else {
        let usage = format!("Usage: `{}` (count 1-{MAX_ITEMS}, page starts at 1)", META.usage);
        http.create_message(msg.channel_id).content(&usage).await?;
        return Ok(());
    };

    let requested_page = match arg2 {
        Some(raw) => match parse_one_based_page(Some(raw)) {
            Some(page) => page,
            None => {
                let usage = format!("Usage: `{}` (page starts at 1)", META.usage);
                http.create_message(msg.channel_id).content(&usage).await?;
                return Ok(());
            }
        },
        None => 1,
    };

    let paginator = sample_paginator(ctx.config.page_max_chars, count)?;
    let total = paginator.page_count()?;

    if requested_page > total {
        let out = format!("Page {requested_page} does not exist. Available pages: 1-{total}.");
        http.create_message(msg.channel_id).content(&out).await?;
        return Ok(());
    }

    let mut config = ctx.navigator_config();
    config.initial_page = requested_page - 1;

    navigate(&ctx, &msg, &paginator, config, META.name)
}

fn parse_count(raw: Option<&str>) -> Option<usize> {
    match raw {
        None => Some(DEFAULT_ITEMS),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|count| (1..=MAX_ITEMS).contains(count)),
    }
}

fn sample_paginator(max_chars: usize, count: usize) -> Result<Paginator, PaginatorError> {
    let mut paginator = Paginator::new(PaginatorConfig {
        max_chars,
        max_lines: Some(LINES_PER_PAGE),
        ..PaginatorConfig::default()
    })?;
    paginator.add_lines((1..=count).map(|n| format!("Sample pagination item #{n}")));
    Ok(paginator)
}
