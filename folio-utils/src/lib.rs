/// Cleanup policy applied when a navigator terminates.
pub mod cleanup;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Paginator, navigator and the surfaces they draw on.
pub mod pagination;
/// Pure parser helpers.
pub mod parse;
