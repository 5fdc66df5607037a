//! Packs a stream of content chunks into size-bounded pages.

use std::collections::VecDeque;
use std::fmt;
use std::ops::AddAssign;
use std::sync::Arc;

use once_cell::sync::OnceCell;

/// Default page budget, matching the Discord message content limit.
pub const DEFAULT_MAX_CHARS: usize = 2000;

/// Characters reserved on every page on top of the prefix and suffix.
const DECORATION_SLACK: usize = 2;

/// Characters of an offending chunk quoted in error messages.
const PREVIEW_CHARS: usize = 60;

/// Word boundaries a chunk may be exploded on when truncation is enabled.
///
/// A new fragment starts after any of these sequences, so the boundary stays
/// attached to the text before it.
const BOUNDARIES: [&str; 13] = [
    " ", "\t", "\r", "\n", ", ", "; ", ". ", "-", "! ", "? ", ") ", "] ", "} ",
];

/// One atomic unit of paginator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Text that is kept together unless truncation allows splitting it.
    Text(String),
    /// Resolved to the configured line break when pages are generated.
    LineBreak,
    /// Starts a new page unless the current one is still empty.
    PageBreak,
    /// Allows word-boundary splitting from this point onward.
    EnableTruncation,
    /// Disallows word-boundary splitting from this point onward.
    DisableTruncation,
}

/// A transformation applied to every textual chunk before packing.
pub type Substitution = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Errors raised while configuring a paginator or generating its pages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginatorError {
    #[error("max_chars must be greater than zero")]
    ZeroMaxChars,
    #[error("max_lines must be greater than zero when set")]
    ZeroMaxLines,
    #[error(
        "with {decoration} characters of prefix and suffix, nothing fits onto a page of {max_chars} characters"
    )]
    BudgetTooSmall { max_chars: usize, decoration: usize },
    #[error(
        "a chunk is too large to fit into the char limit of {limit} (not including prefix+suffix) (chunk was {size} in size; {preview:?})"
    )]
    ChunkTooLarge {
        limit: usize,
        size: usize,
        preview: String,
    },
    #[error(
        "a chunk has too many lines to fit into the line limit of {limit} (chunk was {lines} lines long; {preview:?})"
    )]
    TooManyLines {
        limit: usize,
        lines: usize,
        preview: String,
    },
    #[error("background pagination task failed: {0}")]
    Background(String),
}

/// Page budgets and decoration for a [`Paginator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatorConfig {
    /// Upper bound on characters per page, decoration included.
    pub max_chars: usize,
    /// Optional upper bound on lines per page.
    pub max_lines: Option<usize>,
    /// Prepended to every page.
    pub prefix: String,
    /// Appended to every page.
    pub suffix: String,
    /// What a [`Chunk::LineBreak`] resolves to, and what line counting looks for.
    pub line_break: String,
    /// Initial truncation policy; toggles in the chunk stream override it.
    pub enable_truncation: bool,
    /// Split oversized chunks mid-word instead of failing.
    pub force_truncation: bool,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            max_lines: None,
            prefix: String::new(),
            suffix: String::new(),
            line_break: "\n".to_owned(),
            enable_truncation: true,
            force_truncation: true,
        }
    }
}

/// Consumes chunks of input and formats them into size-bound pages.
///
/// Pages are generated lazily on first request and cached until the chunk
/// list is modified again.
pub struct Paginator {
    config: PaginatorConfig,
    /// Characters of body content that fit on one page.
    real_length: usize,
    substitutions: Vec<Substitution>,
    chunks: VecDeque<Chunk>,
    pages: OnceCell<Vec<String>>,
}

impl fmt::Debug for Paginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("config", &self.config)
            .field("substitutions", &self.substitutions.len())
            .field("chunks", &self.chunks.len())
            .field("cached", &self.pages.get().is_some())
            .finish()
    }
}

impl Paginator {
    /// Create a paginator, normalizing the decoration and validating budgets.
    pub fn new(mut config: PaginatorConfig) -> Result<Self, PaginatorError> {
        if config.max_chars == 0 {
            return Err(PaginatorError::ZeroMaxChars);
        }

        if config.max_lines == Some(0) {
            return Err(PaginatorError::ZeroMaxLines);
        }

        if config.prefix.chars().last().is_some_and(|c| !c.is_whitespace()) {
            config.prefix.push('\n');
        }

        if config.suffix.chars().next().is_some_and(|c| !c.is_whitespace()) {
            config.suffix.insert(0, '\n');
        }

        let decoration = char_len(&config.prefix) + char_len(&config.suffix);
        let real_length = config
            .max_chars
            .checked_sub(decoration + DECORATION_SLACK)
            .filter(|length| *length > 0)
            .ok_or(PaginatorError::BudgetTooSmall {
                max_chars: config.max_chars,
                decoration,
            })?;

        Ok(Self {
            config,
            real_length,
            substitutions: Vec::new(),
            chunks: VecDeque::new(),
            pages: OnceCell::new(),
        })
    }

    /// Register a substitution, applied after any previously registered ones.
    pub fn with_substitution<F>(mut self, substitution: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.substitutions.push(Arc::new(substitution));
        self.invalidate();
        self
    }

    /// The normalized configuration.
    pub fn config(&self) -> &PaginatorConfig {
        &self.config
    }

    /// Characters of body content available on each page.
    pub fn body_budget(&self) -> usize {
        self.real_length
    }

    /// The raw chunk list, front to back.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Append one textual chunk.
    pub fn add(&mut self, content: impl ToString) -> &mut Self {
        self.push_back([Chunk::Text(content.to_string())])
    }

    /// Prepend one textual chunk.
    pub fn prepend(&mut self, content: impl ToString) -> &mut Self {
        self.push_front([Chunk::Text(content.to_string())])
    }

    /// Append a chunk followed by a line break.
    pub fn add_line(&mut self, content: impl ToString) -> &mut Self {
        self.push_back([Chunk::Text(content.to_string()), Chunk::LineBreak])
    }

    /// Prepend a chunk followed by a line break.
    pub fn prepend_line(&mut self, content: impl ToString) -> &mut Self {
        self.push_front([Chunk::Text(content.to_string()), Chunk::LineBreak])
    }

    /// Append each item as its own line.
    pub fn add_lines<I>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let chunks = line_chunks(lines);
        self.push_back(chunks)
    }

    /// Prepend each item as its own line, keeping their relative order.
    pub fn prepend_lines<I>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let chunks = line_chunks(lines);
        self.push_front(chunks)
    }

    /// Append a block of text, one chunk per line.
    pub fn add_block(&mut self, block: &str) -> &mut Self {
        let lines: Vec<String> = block
            .split(self.config.line_break.as_str())
            .map(ToOwned::to_owned)
            .collect();
        self.add_lines(lines)
    }

    /// Prepend a block of text, one chunk per line.
    pub fn prepend_block(&mut self, block: &str) -> &mut Self {
        let lines: Vec<String> = block
            .split(self.config.line_break.as_str())
            .map(ToOwned::to_owned)
            .collect();
        self.prepend_lines(lines)
    }

    /// Request a page break at the back.
    pub fn add_page_break(&mut self) -> &mut Self {
        self.push_back([Chunk::PageBreak])
    }

    /// Request a page break at the front.
    pub fn prepend_page_break(&mut self) -> &mut Self {
        self.push_front([Chunk::PageBreak])
    }

    /// Allow word-boundary splitting for chunks added after this call.
    pub fn enable_truncation(&mut self) -> &mut Self {
        self.push_back([Chunk::EnableTruncation])
    }

    /// Disallow word-boundary splitting for chunks added after this call.
    pub fn disable_truncation(&mut self) -> &mut Self {
        self.push_back([Chunk::DisableTruncation])
    }

    /// Reverse the chunk order in place.
    pub fn reverse_chunks(&mut self) -> &mut Self {
        self.chunks.make_contiguous().reverse();
        self.invalidate();
        self
    }

    /// Generated pages, computed on first call and cached until the next mutation.
    pub fn pages(&self) -> Result<&[String], PaginatorError> {
        self.pages
            .get_or_try_init(|| self.generate())
            .map(Vec::as_slice)
    }

    /// Number of generated pages.
    pub fn page_count(&self) -> Result<usize, PaginatorError> {
        self.pages().map(<[String]>::len)
    }

    /// Rough page count from raw chunk sizes, without generating pages.
    pub fn estimated_page_count(&self) -> usize {
        let line_break = self.config.line_break.as_str();
        let (chars, breaks) = self
            .chunks
            .iter()
            .fold((0, 0), |(chars, breaks), chunk| match chunk {
                Chunk::Text(text) => (chars + char_len(text), breaks + text.matches(line_break).count()),
                Chunk::LineBreak => (chars + char_len(line_break), breaks + 1),
                _ => (chars, breaks),
            });

        let by_chars = chars / self.config.max_chars + 1;
        let by_lines = self
            .config
            .max_lines
            .map_or(1, |max_lines| breaks / max_lines + 1);

        by_chars.max(by_lines)
    }

    /// Generate pages on the blocking pool, consuming the paginator.
    pub async fn into_pages(self) -> Result<Vec<String>, PaginatorError> {
        let task = tokio::task::spawn_blocking(move || {
            let pages = self.pages()?.to_vec();
            Ok(pages)
        });

        task.await
            .map_err(|source| PaginatorError::Background(source.to_string()))?
    }

    fn push_back<I>(&mut self, chunks: I) -> &mut Self
    where
        I: IntoIterator<Item = Chunk>,
    {
        self.chunks.extend(chunks);
        self.invalidate();
        self
    }

    fn push_front<I>(&mut self, chunks: I) -> &mut Self
    where
        I: IntoIterator<Item = Chunk>,
    {
        let chunks: Vec<Chunk> = chunks.into_iter().collect();
        for chunk in chunks.into_iter().rev() {
            self.chunks.push_front(chunk);
        }
        self.invalidate();
        self
    }

    fn invalidate(&mut self) {
        self.pages.take();
    }

    fn substitute(&self, text: &str) -> String {
        self.substitutions
            .iter()
            .fold(text.to_owned(), |text, substitution| substitution(&text))
    }

    /// Resolve markers, apply substitutions and explode where truncation applies.
    fn prepare(&self) -> VecDeque<Piece> {
        let mut pieces = VecDeque::with_capacity(self.chunks.len());
        let mut truncating = self.config.enable_truncation;

        for chunk in &self.chunks {
            let text = match chunk {
                Chunk::EnableTruncation | Chunk::DisableTruncation => {
                    truncating = matches!(chunk, Chunk::EnableTruncation);
                    pieces.push_back(Piece::Truncation(truncating));
                    continue;
                }
                Chunk::PageBreak => {
                    pieces.push_back(Piece::PageBreak);
                    continue;
                }
                Chunk::LineBreak => self.substitute(&self.config.line_break),
                Chunk::Text(text) => self.substitute(text),
            };

            if truncating {
                pieces.extend(explode_on_boundaries(&text).into_iter().map(Piece::Text));
            } else {
                pieces.push_back(Piece::Text(text));
            }
        }

        pieces
    }

    fn generate(&self) -> Result<Vec<String>, PaginatorError> {
        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let line_break = self.config.line_break.as_str();
        let real_length = self.real_length;
        let mut pending = self.prepare();
        let mut pages: Vec<OpenPage> = Vec::new();
        let mut truncating = self.config.enable_truncation;

        while let Some(piece) = pending.pop_front() {
            let text = match piece {
                Piece::Truncation(enabled) => {
                    truncating = enabled;
                    continue;
                }
                Piece::PageBreak => {
                    match pages.last() {
                        Some(page) if !page.body.trim().is_empty() => {
                            open_page(&mut pages, truncating);
                        }
                        Some(_) => {}
                        None => open_page(&mut pages, truncating),
                    }
                    continue;
                }
                Piece::Text(text) => text,
            };

            if pages.is_empty() {
                open_page(&mut pages, truncating);
            }

            let (current_chars, current_breaks) = pages
                .last()
                .map_or((0, 0), |page| (page.chars, page.body.matches(line_break).count()));

            let chunk_chars = char_len(&text);
            if chunk_chars > real_length {
                if !self.config.force_truncation {
                    return Err(PaginatorError::ChunkTooLarge {
                        limit: real_length,
                        size: chunk_chars,
                        preview: preview(&text),
                    });
                }

                // Fill whatever is left of the current page first, then whole pages.
                let quota = real_length.saturating_sub(current_chars);
                for part in split_force(&text, quota, real_length).into_iter().rev() {
                    pending.push_front(Piece::Text(part));
                }
                continue;
            }

            let is_bare_break = text == line_break;
            let chunk_lines = text.matches(line_break).count() + 1;

            if let Some(max_lines) = self.config.max_lines {
                if chunk_lines > max_lines && !is_bare_break {
                    return Err(PaginatorError::TooManyLines {
                        limit: max_lines,
                        lines: chunk_lines,
                        preview: preview(&text),
                    });
                }
            }

            let over_chars = current_chars + chunk_chars > real_length;
            let over_lines = self
                .config
                .max_lines
                .is_some_and(|max_lines| current_breaks + chunk_lines > max_lines);

            if over_chars || over_lines {
                open_page(&mut pages, truncating);
            }

            if let Some(page) = pages.last_mut() {
                if page.body.is_empty() && is_bare_break {
                    continue;
                }
                page.push(&text);
            }
        }

        close_last(&mut pages);
        Ok(self.finish(pages))
    }

    fn finish(&self, pages: Vec<OpenPage>) -> Vec<String> {
        let line_break = self.config.line_break.as_str();

        pages
            .into_iter()
            .filter(|page| !page.body.trim().is_empty())
            .map(|page| {
                let body = match page.body.strip_prefix(line_break) {
                    Some(rest) if page.truncating => rest,
                    _ => page.body.as_str(),
                };

                let rendered = format!("{}{}{}", self.config.prefix, body, self.config.suffix);
                let length = char_len(&rendered);
                assert!(
                    length <= self.config.max_chars,
                    "paginator produced a page of {length} characters over the {} limit",
                    self.config.max_chars
                );
                rendered
            })
            .collect()
    }
}

impl<T: ToString> AddAssign<T> for Paginator {
    fn add_assign(&mut self, content: T) {
        self.add(content);
    }
}

/// A chunk after marker resolution and substitution.
#[derive(Debug)]
enum Piece {
    Text(String),
    PageBreak,
    Truncation(bool),
}

/// A page still being filled.
#[derive(Debug, Default)]
struct OpenPage {
    body: String,
    chars: usize,
    /// Truncation policy in effect when the page was opened.
    truncating: bool,
}

impl OpenPage {
    fn push(&mut self, text: &str) {
        self.body.push_str(text);
        self.chars += char_len(text);
    }
}

fn open_page(pages: &mut Vec<OpenPage>, truncating: bool) {
    close_last(pages);
    pages.push(OpenPage {
        truncating,
        ..OpenPage::default()
    });
}

/// Trim trailing whitespace off the most recent page.
fn close_last(pages: &mut [OpenPage]) {
    if let Some(page) = pages.last_mut() {
        let trimmed_len = page.body.trim_end().len();
        if trimmed_len != page.body.len() {
            page.body.truncate(trimmed_len);
            page.chars = char_len(&page.body);
        }
    }
}

fn line_chunks<I>(lines: I) -> Vec<Chunk>
where
    I: IntoIterator,
    I::Item: ToString,
{
    lines
        .into_iter()
        .flat_map(|line| [Chunk::Text(line.to_string()), Chunk::LineBreak])
        .collect()
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Split a string into fragments, each ending on a boundary where possible.
fn explode_on_boundaries(text: &str) -> Vec<String> {
    let mut bits: Vec<String> = Vec::new();

    for c in text.chars() {
        match bits.last_mut() {
            Some(bit) if !BOUNDARIES.iter().any(|boundary| bit.ends_with(boundary)) => bit.push(c),
            _ => bits.push(c.to_string()),
        }
    }

    bits
}

/// Split mid-word: first `quota` characters, then `width`-sized pieces.
fn split_force(text: &str, quota: usize, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::with_capacity(chars.len() / width.max(1) + 2);

    let first = quota.min(chars.len());
    if first > 0 {
        parts.push(chars[..first].iter().collect());
    }

    let mut start = first;
    while start < chars.len() {
        let end = (start + width).min(chars.len());
        parts.push(chars[start..end].iter().collect());
        start = end;
    }

    parts
}
