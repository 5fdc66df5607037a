//! Page values, page-index math and page decoration helpers.

use std::mem;

use twilight_model::channel::message::embed::Embed;

/// One page a navigator can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Text(String),
    Embed(Box<Embed>),
}

impl Page {
    /// Whether the page has nothing to show.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Embed(embed) => {
                embed.title.is_none()
                    && embed.description.is_none()
                    && embed.fields.is_empty()
                    && embed.footer.is_none()
                    && embed.image.is_none()
            }
        }
    }

    /// Rough number of bytes the page holds.
    pub fn approximate_bytes(&self) -> usize {
        let held = match self {
            Self::Text(text) => text.len(),
            Self::Embed(embed) => {
                mem::size_of::<Embed>()
                    + embed.title.as_ref().map_or(0, String::len)
                    + embed.description.as_ref().map_or(0, String::len)
                    + embed.footer.as_ref().map_or(0, |footer| footer.text.len())
                    + embed
                        .fields
                        .iter()
                        .map(|field| field.name.len() + field.value.len())
                        .sum::<usize>()
            }
        };

        mem::size_of::<Self>() + held
    }

    /// What the root surface shows while this page is current.
    pub fn view(
        &self,
        page_number: usize,
        total_pages: usize,
        show_page_number: bool,
        max_chars: usize,
    ) -> PageView {
        match self {
            Self::Text(text) => PageView::text(decorate_page(
                text,
                page_number,
                total_pages,
                show_page_number,
                max_chars,
            )),
            Self::Embed(embed) => PageView {
                content: if show_page_number {
                    page_header(page_number, total_pages).trim_end().to_owned()
                } else {
                    String::new()
                },
                embed: Some((**embed).clone()),
            },
        }
    }
}

impl From<String> for Page {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Page {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Embed> for Page {
    fn from(embed: Embed) -> Self {
        Self::Embed(Box::new(embed))
    }
}

/// Message content plus an optional embed, as applied to a surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageView {
    pub content: String,
    pub embed: Option<Embed>,
}

impl PageView {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embed: None,
        }
    }
}

/// Wrap a possibly negative page index into `0..total_pages`.
pub fn wrap_index(index: isize, total_pages: usize) -> usize {
    if total_pages == 0 {
        return 0;
    }

    let total = isize::try_from(total_pages).unwrap_or(isize::MAX);
    // rem_euclid with a positive modulus is always in 0..total.
    index.rem_euclid(total) as usize
}

/// Parse a one-based page argument.
///
/// Returns `Some(page)` when the value is valid (`>= 1`), otherwise `None`.
/// A missing argument means the first page.
pub fn parse_one_based_page(raw: Option<&str>) -> Option<usize> {
    match raw {
        Some(value) => value.trim().parse::<usize>().ok().filter(|page| *page >= 1),
        None => Some(1),
    }
}

/// Header shown above a page, e.g. `[2/5]`.
pub fn page_header(page_number: usize, total_pages: usize) -> String {
    format!("[{page_number}/{total_pages}]\n")
}

/// Cut `text` down to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Render a page for display, adding the header when it still fits.
pub fn decorate_page(
    page: &str,
    page_number: usize,
    total_pages: usize,
    show_page_number: bool,
    max_chars: usize,
) -> String {
    if show_page_number {
        let header = page_header(page_number, total_pages);
        if header.chars().count() + page.chars().count() <= max_chars {
            return header + page;
        }
    }

    truncate_chars(page, max_chars).to_owned()
}
