/// Parse an actor id from a raw argument (`<@id>`, `<@!id>`, or raw ID).
pub fn parse_mention_id(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();

    let numeric = if trimmed.starts_with("<@") && trimmed.ends_with('>') {
        let without_wrappers = trimmed.strip_prefix("<@")?.strip_suffix('>')?;
        without_wrappers
            .strip_prefix('!')
            .unwrap_or(without_wrappers)
    } else {
        trimmed
    };

    numeric.parse::<u64>().ok().filter(|id| *id != 0)
}

/// Split a message into its command name and the remaining argument text.
///
/// Returns `None` when the message does not start with `prefix`.
pub fn split_command(content: &str, prefix: char) -> Option<(&str, &str)> {
    let rest = content.strip_prefix(prefix)?;
    let rest = rest.trim_start();
    if rest.is_empty() {
        return None;
    }

    match rest.split_once(char::is_whitespace) {
        Some((name, args)) => Some((name, args.trim())),
        None => Some((rest, "")),
    }
}
