use super::CommandResult;
use crate::core::session::ChatSession;

pub type CommandHandler = fn(&mut ChatSession, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "models",
        usage: "/models",
        help: "Fetch the model list from the server.",
        handler: super::handle_models,
    },
    Command {
        name: "model",
        usage: "/model [id]",
        help: "Show or select the model used for replies.",
        handler: super::handle_model,
    },
    Command {
        name: "find",
        usage: "/find <text>",
        help: "List known models whose id contains the text.",
        handler: super::handle_find,
    },
    Command {
        name: "set",
        usage: "/set <key> <value>",
        help: "Change and save a setting (api-key, base-url, default-model, system-prompt, accent-color, temperature).",
        handler: super::handle_set,
    },
    Command {
        name: "status",
        usage: "/status",
        help: "Show the active model, server and request status.",
        handler: super::handle_status,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave the chat.",
        handler: super::handle_quit,
    },
];
