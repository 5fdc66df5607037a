//! The default navigation controls.

use std::time::Duration;

use tracing::debug;

use super::button::{Button, Press, Signal};
use super::navigator::NavigatorState;
use super::page::parse_one_based_page;
use super::surface::ActorId;
use crate::cleanup::CleanupAction;
use crate::parse::parse_mention_id;

pub const FIRST_PAGE: &str = "\u{23EE}";
pub const BACK_10_PAGES: &str = "\u{23EA}";
pub const PREVIOUS_PAGE: &str = "\u{25C0}";
pub const CLOSE: &str = "\u{1F1FD}";
pub const NEXT_PAGE: &str = "\u{25B6}";
pub const FORWARD_10_PAGES: &str = "\u{23E9}";
pub const LAST_PAGE: &str = "\u{23ED}";
pub const INPUT_NUMBER: &str = "\u{1F522}";
/// Shown while the author holds control; pressing it hands control over.
pub const SHARE_CONTROL: &str = "\u{1F465}";
/// Shown while control is shared; pressing it takes control back.
pub const RESTRICT_CONTROL: &str = "\u{1F464}";

const CONFIRMATION_LIFETIME: Duration = Duration::from_secs(10);

/// Every default control, in display order.
pub fn default_buttons() -> Vec<Button> {
    vec![
        first_page(),
        back_10_pages(),
        previous_page(),
        close(),
        next_page(),
        forward_10_pages(),
        last_page(),
        input_number(),
        lock_unlock(),
    ]
}

fn invoked_by_author(_: &Button, state: &NavigatorState, press: &Press) -> bool {
    press.actor == state.invocation().author
}

pub fn first_page() -> Button {
    Button::from_fn(FIRST_PAGE, "first_page", |_, state, _| {
        state.set_page_index(0);
        Ok(Signal::Continue)
    })
    .with_description("Goes to the first page.")
    .display_if(|_, state| state.page_count() > 3)
}

pub fn back_10_pages() -> Button {
    Button::from_fn(BACK_10_PAGES, "back_10_pages", |_, state, _| {
        state.offset_page(-10);
        Ok(Signal::Continue)
    })
    .with_description("Goes back 10 pages.")
    .display_if(|_, state| state.page_count() > 10)
}

pub fn previous_page() -> Button {
    Button::from_fn(PREVIOUS_PAGE, "previous_page", |_, state, _| {
        state.offset_page(-1);
        Ok(Signal::Continue)
    })
    .with_description("Goes to the previous page.")
    .display_if(|_, state| state.page_count() > 1)
}

pub fn close() -> Button {
    Button::from_fn(CLOSE, "close", |_, _, _| {
        Ok(Signal::Cancel(CleanupAction::REMOVE_ALL_MESSAGES))
    })
    .with_description("Closes the navigation and deletes every message tied to it.")
    .invoke_if(invoked_by_author)
}

pub fn next_page() -> Button {
    Button::from_fn(NEXT_PAGE, "next_page", |_, state, _| {
        state.offset_page(1);
        Ok(Signal::Continue)
    })
    .with_description("Goes to the next page.")
    .display_if(|_, state| state.page_count() > 1)
}

pub fn forward_10_pages() -> Button {
    Button::from_fn(FORWARD_10_PAGES, "forward_10_pages", |_, state, _| {
        state.offset_page(10);
        Ok(Signal::Continue)
    })
    .with_description("Goes forward 10 pages.")
    .display_if(|_, state| state.page_count() > 10)
}

pub fn last_page() -> Button {
    Button::from_fn(LAST_PAGE, "last_page", |_, state, _| {
        state.set_page_index(-1);
        Ok(Signal::Continue)
    })
    .with_description("Goes to the last page.")
    .display_if(|_, state| state.page_count() > 3)
}

/// Prompts for a page number and jumps to it.
pub fn input_number() -> Button {
    Button::new(INPUT_NUMBER, "input_number", |_, state, press| {
        Box::pin(async move {
            let total = state.page_count();
            let prompt = state
                .send(&format!("Enter a page number between 1 and {total}."))
                .await;
            let wait = state.config().reply_timeout;
            let reply = state.await_reply(press.actor, wait).await;

            match prompt {
                Ok(prompt) => state.discard(prompt).await,
                Err(source) => debug!(?source, "could not post page number prompt"),
            }

            if let Some(reply) = reply {
                state.discard(reply.surface).await;
                let number = parse_one_based_page(Some(reply.content.as_str())).filter(|number| *number <= total);
                if let Some(number) = number {
                    state.set_page_number(number)?;
                }
            }

            Ok(Signal::Continue)
        })
    })
    .with_description("Type in a page number to jump to.")
    .display_if(|_, state| state.page_count() > 3)
}

/// Hands control to another actor or to everyone, and back.
pub fn lock_unlock() -> Button {
    Button::new(SHARE_CONTROL, "lock_unlock", |button, state, _| {
        Box::pin(async move {
            let author = state.invocation().author;

            if state.owner() != Some(author) {
                state.lock();
                if let Err(source) = state
                    .flash("Okay, only you can control this again.", CONFIRMATION_LIFETIME)
                    .await
                {
                    debug!(?source, "could not confirm restored control");
                }
                state.rekey_button(button.symbol(), SHARE_CONTROL);
                return Ok(Signal::Continue);
            }

            let prompt = state
                .send("Enter the member to share control with, `*` to share with everyone, or `.` to cancel.")
                .await;
            let wait = state.config().reply_timeout;
            let reply = state.await_reply(author, wait).await;

            match prompt {
                Ok(prompt) => state.discard(prompt).await,
                Err(source) => debug!(?source, "could not post control transfer prompt"),
            }

            let Some(reply) = reply else {
                return Ok(Signal::Continue);
            };
            state.discard(reply.surface).await;

            let content = reply.content.trim();
            let confirmation = match content {
                "." => return Ok(Signal::Continue),
                "*" => {
                    state.unlock();
                    "Okay, everyone has control as well as you.".to_owned()
                }
                raw => match transfer_target(state, raw).await {
                    Some(actor) if actor != author => {
                        state.set_owner(Some(actor));
                        format!("Okay, <@{actor}> has control as well as you.")
                    }
                    _ => {
                        if let Err(source) = state.notify(&format!("{raw} was not a recognised member.")).await {
                            debug!(?source, "could not report unrecognised member");
                        }
                        return Ok(Signal::Continue);
                    }
                },
            };

            if let Err(source) = state.send(&confirmation).await {
                debug!(?source, "could not confirm shared control");
            }
            state.rekey_button(button.symbol(), RESTRICT_CONTROL);
            Ok(Signal::Continue)
        })
    })
    .with_description("Share control of the navigation, or take it back.")
    .display_if(|_, state| state.invocation().shared && state.page_count() > 1)
    .invoke_if(invoked_by_author)
}

/// The mentioned actor, unless it cannot be found or is a bot account.
async fn transfer_target(state: &NavigatorState, raw: &str) -> Option<ActorId> {
    let actor = parse_mention_id(raw)?;
    match state.is_bot(actor).await {
        Ok(false) => Some(actor),
        Ok(true) => None,
        Err(source) => {
            debug!(?source, actor, "could not look up control transfer target");
            None
        }
    }
}
