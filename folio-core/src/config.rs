use std::time::Duration;

use anyhow::{Context as _, bail};

use folio_utils::pagination::navigator::DEFAULT_TIMEOUT;
use folio_utils::pagination::paginator::DEFAULT_MAX_CHARS;

/// Process configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub token: String,
    pub navigator_timeout: Duration,
    pub page_max_chars: usize,
    pub page_max_lines: Option<usize>,
}

impl BotConfig {
    /// Read `DISCORD_TOKEN` and the optional `FOLIO_*` settings.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .context("DISCORD_TOKEN not set")?;

        let timeout_secs = parse_optional::<u64>(&lookup, "FOLIO_NAVIGATOR_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_TIMEOUT.as_secs());
        if timeout_secs == 0 {
            bail!("FOLIO_NAVIGATOR_TIMEOUT_SECS must be greater than zero");
        }

        let page_max_chars =
            parse_optional::<usize>(&lookup, "FOLIO_PAGE_MAX_CHARS")?.unwrap_or(DEFAULT_MAX_CHARS);
        if page_max_chars == 0 || page_max_chars > DEFAULT_MAX_CHARS {
            bail!("FOLIO_PAGE_MAX_CHARS must be between 1 and {DEFAULT_MAX_CHARS}");
        }

        let page_max_lines = parse_optional::<usize>(&lookup, "FOLIO_PAGE_MAX_LINES")?;
        if page_max_lines == Some(0) {
            bail!("FOLIO_PAGE_MAX_LINES must be greater than zero");
        }

        Ok(Self {
            token,
            navigator_timeout: Duration::from_secs(timeout_secs),
            page_max_chars,
            page_max_lines,
        })
    }
}

fn parse_optional<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} is not a valid number: {raw:?}"))
        })
        .transpose()
}
