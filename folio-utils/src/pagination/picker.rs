//! A numbered option picker shown in an embed navigator.
//!
//! The invoking actor answers with a 1-based option number or `cancel`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::debug;
use twilight_util::builder::embed::EmbedBuilder;

use super::buttons::{next_page, previous_page};
use super::embed::{DEFAULT_EMBED_COLOR, DESCRIPTION_LIMIT, EmbedError, embed_generator};
use super::events::{EventHub, SurfaceEvent};
use super::navigator::{Invocation, Navigator, NavigatorConfig, NavigatorError};
use super::paginator::{Paginator, PaginatorConfig, PaginatorError};
use super::surface::Surface;
use crate::cleanup::CleanupAction;

const CANCEL_KEYWORD: &str = "cancel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerConfig {
    /// Embed title above the option list.
    pub prompt: String,
    /// How long to wait for a valid answer.
    pub timeout: Duration,
    /// Options listed per page.
    pub max_lines: usize,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            prompt: "Please pick an option.".to_owned(),
            timeout: Duration::from_secs(300),
            max_lines: 6,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PickError {
    #[error("cannot pick from zero options")]
    NoOptions,
    #[error("the picker timeout must be positive")]
    InvalidTimeout,
    #[error("no option was picked in time")]
    TimedOut,
    #[error(transparent)]
    Pagination(#[from] PaginatorError),
    #[error(transparent)]
    Embed(#[from] EmbedError),
    #[error(transparent)]
    Navigator(#[from] NavigatorError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Cancel,
    Option(usize),
}

/// Parse an answer against `count` options. Anything else is not an answer.
fn parse_answer(raw: &str, count: usize) -> Option<Answer> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case(CANCEL_KEYWORD) {
        return Some(Answer::Cancel);
    }

    raw.parse::<usize>()
        .ok()
        .filter(|number| (1..=count).contains(number))
        .map(|number| Answer::Option(number - 1))
}

fn option_list<T>(
    options: &[T],
    stringify: impl Fn(&T) -> String,
    max_lines: usize,
) -> Result<Paginator, PaginatorError> {
    let mut paginator = Paginator::new(PaginatorConfig {
        max_chars: DESCRIPTION_LIMIT,
        max_lines: Some(max_lines),
        ..PaginatorConfig::default()
    })?;

    paginator.disable_truncation();
    paginator.add_line(format!("`{CANCEL_KEYWORD}` - cancel this"));
    for (index, option) in options.iter().enumerate() {
        paginator.add_line(format!("`{}` - {}", index + 1, stringify(option)));
    }
    Ok(paginator)
}

/// Ask the invocation author to pick one of `options`.
///
/// A single option is returned straight away. `Ok(None)` means the author
/// cancelled. Everything the picker posted, and the invoking message, is
/// removed before this returns.
pub async fn option_picker<T>(
    surface: Arc<dyn Surface>,
    hub: &EventHub,
    mut options: Vec<T>,
    stringify: impl Fn(&T) -> String,
    invocation: Invocation,
    config: PickerConfig,
) -> Result<Option<T>, PickError> {
    match options.len() {
        0 => return Err(PickError::NoOptions),
        1 => return Ok(options.pop()),
        _ => {}
    }
    if config.timeout.is_zero() {
        return Err(PickError::InvalidTimeout);
    }

    // Subscribe first so an answer typed right after the list appears is not missed.
    let mut answers = hub.subscribe();
    let handle = {
        let paginator = option_list(&options, stringify, config.max_lines)?;
        let prompt = config.prompt.clone();
        let generator = embed_generator(DESCRIPTION_LIMIT, false, move |page, _, _| {
            Ok(EmbedBuilder::new()
                .title(prompt.as_str())
                .color(DEFAULT_EMBED_COLOR)
                .description(page)
                .validate()?
                .build())
        })?;

        // The picker owns the deadline and kills the navigator itself.
        let mut navigator = Navigator::from_embeds(
            surface.clone(),
            hub.clone(),
            &paginator,
            &generator,
            [previous_page(), next_page()],
            invocation,
            NavigatorConfig {
                timeout: config.timeout.saturating_mul(2),
                ..NavigatorConfig::default()
            },
        )?;
        navigator.start()?
    };

    let scope = surface.scope();
    let count = options.len();
    let deadline = Instant::now() + config.timeout;

    let answer = loop {
        let event = match time::timeout_at(deadline, answers.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) | Err(_) => break None,
        };

        let SurfaceEvent::Reply {
            scope: reply_scope,
            surface: reply,
            actor,
            content,
        } = event
        else {
            continue;
        };
        if reply_scope != scope || actor != invocation.author {
            continue;
        }
        let Some(answer) = parse_answer(&content, count) else {
            continue;
        };

        if let Err(source) = surface.delete(reply).await {
            debug!(?source, reply, "could not delete picker answer");
        }
        break Some(answer);
    };
    answers.unsubscribe();

    handle.kill(CleanupAction::REMOVE_ALL_MESSAGES);
    if let Err(source) = handle.finished().await {
        debug!(?source, "option picker navigator failed");
    }

    match answer {
        Some(Answer::Option(index)) => Ok(Some(options.swap_remove(index))),
        Some(Answer::Cancel) => Ok(None),
        None => Err(PickError::TimedOut),
    }
}
