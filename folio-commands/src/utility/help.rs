use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::navigate::navigate;
use crate::{COMMANDS, CommandMeta};
use folio_core::Context;
use folio_utils::pagination::Paginator;

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "!help [category]",
};

/// Render the command catalog, one category per page, optionally filtered by category.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    let http = &ctx.http;
    let categories = categories();
    let category = arg1.map(str::to_ascii_lowercase);

    if let Some(wanted_category) = category.as_deref()
        && !categories.contains(&wanted_category)
    {
        let out = unknown_category_message(wanted_category, &categories);
        http.create_message(msg.channel_id).content(&out).await?;
        return Ok(());
    }

    let commands = sorted_commands(category.as_deref());
    if commands.is_empty() {
        http.create_message(msg.channel_id)
            .content("No commands are registered yet.")
            .await?;
        return Ok(());
    }

    let mut paginator = ctx.paginator("", "")?;
    fill_catalog(&mut paginator, &commands);

    navigate(&ctx, &msg, &paginator, ctx.navigator_config(), META.name)
}

fn categories() -> Vec<&'static str> {
    let mut categories: Vec<&str> = COMMANDS.iter().map(|c| c.category).collect();
    categories.sort_unstable();
    categories.dedup();
    categories
}

fn sorted_commands(category: Option<&str>) -> Vec<&'static CommandMeta> {
    let mut commands: Vec<&CommandMeta> = COMMANDS
        .iter()
        .filter(|command| category.is_none_or(|wanted| command.category == wanted))
        .collect();
    commands.sort_unstable_by(|a, b| a.category.cmp(b.category).then(a.name.cmp(b.name)));
    commands
}

/// Write one section per category, each starting on a fresh page.
fn fill_catalog(paginator: &mut Paginator, commands: &[&CommandMeta]) {
    let mut current_category = None;

    for command in commands {
        if current_category != Some(command.category) {
            if current_category.is_some() {
                paginator.add_page_break();
            }
            paginator.add_line(format!("**{}**", capitalize(command.category)));
            current_category = Some(command.category);
        }

        paginator.add_line(format!("`{}` {}", command.usage, command.desc));
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn unknown_category_message(wanted: &str, categories: &[&str]) -> String {
    format!(
        "Unknown category `{wanted}`. Available categories: {}.",
        categories.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_utils::pagination::PaginatorConfig;

    const META_A: CommandMeta = CommandMeta {
        name: "alpha",
        desc: "First.",
        category: "fun",
        usage: "!alpha",
    };
    const META_B: CommandMeta = CommandMeta {
        name: "beta",
        desc: "Second.",
        category: "utility",
        usage: "!beta <x>",
    };

    #[test]
    fn every_registered_command_is_listed_once() {
        let commands = sorted_commands(None);
        assert_eq!(commands.len(), COMMANDS.len());
        assert!(commands.iter().any(|command| command.name == "help"));
    }

    #[test]
    fn category_filter_is_exact() {
        assert_eq!(sorted_commands(Some("utility")).len(), COMMANDS.len());
        assert!(sorted_commands(Some("nope")).is_empty());
        assert_eq!(categories(), vec!["utility"]);
    }

    #[test]
    fn each_category_gets_its_own_page() {
        let mut paginator = Paginator::new(PaginatorConfig::default()).unwrap();
        fill_catalog(&mut paginator, &[&META_A, &META_B]);

        let pages = paginator.pages().unwrap();
        assert_eq!(
            pages,
            &["**Fun**\n`!alpha` First.", "**Utility**\n`!beta <x>` Second."]
        );
    }

    #[test]
    fn unknown_category_lists_alternatives() {
        assert_eq!(
            unknown_category_message("mod", &["fun", "utility"]),
            "Unknown category `mod`. Available categories: fun, utility."
        );
        assert_eq!(capitalize("utility"), "Utility");
        assert_eq!(capitalize(""), "");
    }
}
