//! Stable facade for pagination: chunk packing and interactive page navigation,
//! over text or embed pages.

pub mod button;
pub mod buttons;
pub mod discord;
pub mod embed;
pub mod events;
pub mod memory;
pub mod navigator;
mod page;
pub mod paginator;
pub mod picker;
pub mod reconcile;
pub mod surface;

pub use button::{Button, Press, Signal};
pub use buttons::default_buttons;
pub use discord::{DiscordSurface, surface_event_from_gateway};
pub use embed::{
    DEFAULT_EMBED_COLOR, DESCRIPTION_LIMIT, DefaultEmbedGenerator, EmbedError, EmbedGenerator,
    FnEmbedGenerator, embed_generator, embed_pages, embed_paginator_config,
};
pub use events::{EventHub, Subscription, SurfaceEvent};
pub use memory::MemorySurface;
pub use navigator::{
    Invocation, Navigator, NavigatorConfig, NavigatorError, NavigatorHandle, NavigatorState, Phase,
    Reply, Termination, TerminationReason,
};
pub use page::{
    Page, PageView, decorate_page, page_header, parse_one_based_page, truncate_chars, wrap_index,
};
pub use paginator::{Chunk, Paginator, PaginatorConfig, PaginatorError, Substitution};
pub use picker::{PickError, PickerConfig, option_picker};
pub use surface::{ActorId, RenderedControl, Surface, SurfaceError, SurfaceId};

pub use crate::cleanup::CleanupAction;
