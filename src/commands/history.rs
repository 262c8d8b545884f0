use crate::config::Config;
use crate::error::Result;
use crate::storage::{ConversationStore, HistoryFilter, Role, SqliteStorage, Turn};
use colored::Colorize;
use prettytable::{format, Table};

const CONTENT_WIDTH: usize = 60;

fn truncate(text: &str, width: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > width {
        let cut: String = flat.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

fn turn_status(turn: &Turn) -> String {
    turn.metadata
        .as_ref()
        .and_then(|m| m.status.clone())
        .unwrap_or_else(|| "-".to_string())
}

/// Handle the history command
///
/// Without a conversation id, lists the most recently active conversations.
/// With one, prints that conversation's last `limit` turns, oldest first.
pub fn handle_history(config: &Config, conversation_id: Option<String>, limit: usize) -> Result<()> {
    let storage = SqliteStorage::from_config(&config.storage)?;

    match conversation_id {
        None => list_conversations(&storage, limit),
        Some(id) => show_conversation(&storage, &id, limit),
    }
}

fn list_conversations(storage: &dyn ConversationStore, limit: usize) -> Result<()> {
    let conversations = storage.list_conversations(limit)?;

    if conversations.is_empty() {
        println!("{}", "No conversation history found.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "User".bold(),
        "Turns".bold(),
        "Last Activity".bold()
    ]);

    for summary in conversations {
        let user = summary.user_id.unwrap_or_else(|| "-".to_string());
        let updated = summary.last_activity.format("%Y-%m-%d %H:%M").to_string();
        table.add_row(prettytable::row![
            summary.conversation_id.cyan(),
            user,
            summary.turn_count,
            updated
        ]);
    }

    println!("\nConversations:");
    table.printstd();
    println!();
    println!(
        "Use {} to show a conversation.",
        "vypar history --conversation-id <ID>".cyan()
    );
    println!();
    Ok(())
}

fn show_conversation(storage: &dyn ConversationStore, conversation_id: &str, limit: usize) -> Result<()> {
    let turns = storage.recent_history(HistoryFilter::conversation(conversation_id), limit)?;

    if turns.is_empty() {
        println!(
            "{}",
            format!("No turns found for conversation {}.", conversation_id).yellow()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "Time".bold(),
        "Role".bold(),
        "Status".bold(),
        "Content".bold()
    ]);

    for turn in &turns {
        let role = match turn.role {
            Role::User => turn.role.as_str().green(),
            Role::Assistant => turn.role.as_str().blue(),
        };
        table.add_row(prettytable::row![
            turn.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            role,
            turn_status(turn),
            truncate(&turn.content, CONTENT_WIDTH)
        ]);
    }

    println!("\nConversation {}:", conversation_id.cyan());
    table.printstd();
    println!();
    Ok(())
}
