//! Slash commands available inside the chat loop.

mod registry;

pub use registry::{all_commands, CommandInvocation};

use crate::core::config::Settings;
use crate::core::scheduler::Slot;
use crate::core::session::ChatSession;
use crate::utils::url::effective_base_url;

pub enum CommandResult {
    /// Handled; nothing to print.
    Continue,
    /// Handled; show this text to the user.
    Notice(String),
    ProcessAsMessage(String),
    Quit,
}

pub fn process_input(session: &mut ChatSession, input: &str) -> CommandResult {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    match registry::find_command(command_name) {
        Some(command) => (command.handler)(session, CommandInvocation { args }),
        None => CommandResult::ProcessAsMessage(input.to_string()),
    }
}

pub(super) fn handle_help(
    _session: &mut ChatSession,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    let width = all_commands()
        .iter()
        .map(|command| command.usage.len())
        .max()
        .unwrap_or(0);
    let mut help = String::from("Type a message and press Enter to send it.\n");
    for command in all_commands() {
        help.push_str(&format!("  {:<width$}  {}\n", command.usage, command.help));
    }
    CommandResult::Notice(help.trim_end().to_string())
}

pub(super) fn handle_models(
    session: &mut ChatSession,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    session.fetch_models();
    CommandResult::Continue
}

pub(super) fn handle_model(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        return CommandResult::Notice(match session.active_model() {
            Some(model) => format!("Current model: {model}"),
            None => "No model selected. Use /model <id> or /models.".to_string(),
        });
    }
    session.select_model(invocation.args);
    CommandResult::Notice(format!(
        "Model set to: {}",
        session.active_model().unwrap_or_default()
    ))
}

pub(super) fn handle_find(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if session.models().is_empty() {
        return CommandResult::Notice("No models known yet. Run /models first.".to_string());
    }
    let matches = session.filtered_models(invocation.args);
    if matches.is_empty() {
        return CommandResult::Notice(format!("No models match '{}'", invocation.args));
    }
    let ids: Vec<&str> = matches.iter().map(|model| model.id.as_str()).collect();
    CommandResult::Notice(ids.join("\n"))
}

pub(super) fn handle_set(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let mut parts = invocation.args.splitn(2, ' ');
    let key = parts.next().unwrap_or("");
    let value = parts.next().unwrap_or("").trim();
    if key.is_empty() {
        return CommandResult::Notice("Usage: /set <key> <value>".to_string());
    }

    let mut settings: Settings = session.settings().clone();
    if let Err(reason) = settings.set_field(key, value) {
        return CommandResult::Notice(reason);
    }
    match session.save_settings(settings) {
        Ok(()) => CommandResult::Notice(format!("Saved {key}")),
        Err(err) => CommandResult::Notice(format!("Could not save settings: {err}")),
    }
}

pub(super) fn handle_status(
    session: &mut ChatSession,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    let settings = session.settings();
    let lines = [
        format!("Model:  {}", session.active_model().unwrap_or("(none)")),
        format!("Server: {}", effective_base_url(&settings.base_url)),
        format!("Models: {}", session.status(Slot::Models).message),
        format!("Chat:   {}", session.status(Slot::Chat).message),
    ];
    CommandResult::Notice(lines.join("\n"))
}

pub(super) fn handle_quit(
    _session: &mut ChatSession,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    CommandResult::Quit
}
