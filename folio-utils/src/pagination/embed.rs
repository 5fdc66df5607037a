//! Embed pages: text pages from a [`Paginator`] turned into embeds.
//!
//! An [`EmbedGenerator`] decides how one text page becomes an embed and how
//! much text fits into it. [`embed_generator`] wraps a closure for the common
//! case; [`DefaultEmbedGenerator`] puts the page in the description and the
//! page number in the footer.

use std::fmt;

use twilight_model::channel::message::embed::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};

use super::page::Page;
use super::paginator::{Paginator, PaginatorConfig, PaginatorError};

/// Default embed color used by generated pages.
pub const DEFAULT_EMBED_COLOR: u32 = 0x5B_8D_EF;

/// Characters an embed description may hold.
pub const DESCRIPTION_LIMIT: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("embed pages need a positive character limit")]
    ZeroMaxChars,
    #[error(transparent)]
    Pagination(#[from] PaginatorError),
    #[error("could not build embed for page {index}: {source}")]
    Build {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// Turns text pages into embeds.
pub trait EmbedGenerator: Send + Sync {
    /// Characters allowed per text page.
    fn max_chars(&self) -> usize;

    /// Whether the embeds show page numbers themselves.
    fn provides_numbering(&self) -> bool;

    /// Build the embed for the zero-based page `index` out of `total`.
    fn build_page(&self, page: &str, index: usize, total: usize) -> anyhow::Result<Embed>;
}

/// Description holds the page, footer holds `p.n of N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEmbedGenerator;

impl EmbedGenerator for DefaultEmbedGenerator {
    fn max_chars(&self) -> usize {
        DESCRIPTION_LIMIT
    }

    fn provides_numbering(&self) -> bool {
        true
    }

    fn build_page(&self, page: &str, index: usize, total: usize) -> anyhow::Result<Embed> {
        let footer = EmbedFooterBuilder::new(format!("p.{} of {}", index + 1, total)).build();
        let embed = EmbedBuilder::new()
            .color(DEFAULT_EMBED_COLOR)
            .description(page)
            .footer(footer)
            .validate()?
            .build();
        Ok(embed)
    }
}

/// An [`EmbedGenerator`] backed by a closure.
pub struct FnEmbedGenerator<F> {
    max_chars: usize,
    provides_numbering: bool,
    build: F,
}

impl<F> fmt::Debug for FnEmbedGenerator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEmbedGenerator")
            .field("max_chars", &self.max_chars)
            .field("provides_numbering", &self.provides_numbering)
            .finish_non_exhaustive()
    }
}

impl<F> EmbedGenerator for FnEmbedGenerator<F>
where
    F: Fn(&str, usize, usize) -> anyhow::Result<Embed> + Send + Sync,
{
    fn max_chars(&self) -> usize {
        self.max_chars
    }

    fn provides_numbering(&self) -> bool {
        self.provides_numbering
    }

    fn build_page(&self, page: &str, index: usize, total: usize) -> anyhow::Result<Embed> {
        (self.build)(page, index, total)
    }
}

/// Wrap `build` as a generator holding at most `max_chars` characters per page.
pub fn embed_generator<F>(
    max_chars: usize,
    provides_numbering: bool,
    build: F,
) -> Result<FnEmbedGenerator<F>, EmbedError>
where
    F: Fn(&str, usize, usize) -> anyhow::Result<Embed> + Send + Sync,
{
    if max_chars == 0 {
        return Err(EmbedError::ZeroMaxChars);
    }

    Ok(FnEmbedGenerator {
        max_chars,
        provides_numbering,
        build,
    })
}

/// Paginator settings sized for `generator`.
pub fn embed_paginator_config(generator: &dyn EmbedGenerator) -> PaginatorConfig {
    PaginatorConfig {
        max_chars: generator.max_chars(),
        ..PaginatorConfig::default()
    }
}

/// Build one embed page per text page of `paginator`.
pub fn embed_pages(
    paginator: &Paginator,
    generator: &dyn EmbedGenerator,
) -> Result<Vec<Page>, EmbedError> {
    let pages = paginator.pages()?;
    let total = pages.len();

    pages
        .iter()
        .enumerate()
        .map(|(index, page)| {
            generator
                .build_page(page, index, total)
                .map(Page::from)
                .map_err(|source| EmbedError::Build { index, source })
        })
        .collect()
}
