//! Operator commands typed into the console.

use client_core::ConsoleRole;
use shared::domain::CommandAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Scan { path: String },
    OpenProject,
    ListAllowedPaths,
    ApplyAllowedPath { selection: Option<usize> },
    ListLibrary,
    SelectLibraryRoot,
    ApplyLibraryProject { selection: Option<usize> },
    Behaviour { name: String, action: CommandAction },
    ToggleConnection { ip: Option<String>, port: Option<String> },
    Reload,
    ShowBehaviours,
    ShowLog,
    ShowStatus,
    Help,
    Quit,
}

fn admin_only(role: ConsoleRole, command: ConsoleCommand) -> Result<ConsoleCommand, String> {
    match role {
        ConsoleRole::Admin => Ok(command),
        ConsoleRole::Remote | ConsoleRole::Operator => {
            Err("command is only available on the admin console".to_string())
        }
    }
}

/// Parses a selection as the 1-based index shown in listings.
fn parse_selection(raw: &str) -> Option<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
}

pub fn parse_command(line: &str, role: ConsoleRole) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb {
        "" | "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        "list" => Ok(ConsoleCommand::ShowBehaviours),
        "log" => Ok(ConsoleCommand::ShowLog),
        "status" => Ok(ConsoleCommand::ShowStatus),
        "start" | "stop" => {
            if rest.is_empty() {
                return Err(format!("usage: {verb} <behaviour>"));
            }
            let action = if verb == "start" {
                CommandAction::Start
            } else {
                CommandAction::Stop
            };
            Ok(ConsoleCommand::Behaviour {
                name: rest.to_string(),
                action,
            })
        }
        "refresh" => match role {
            ConsoleRole::Remote | ConsoleRole::Operator => Ok(ConsoleCommand::Reload),
            ConsoleRole::Admin => Err("the admin console loads behaviours by scanning".to_string()),
        },
        // Blank paths are passed through; the project source reports them.
        "scan" => admin_only(
            role,
            ConsoleCommand::Scan {
                path: rest.to_string(),
            },
        ),
        "open" => admin_only(role, ConsoleCommand::OpenProject),
        "paths" => admin_only(role, ConsoleCommand::ListAllowedPaths),
        "path" => admin_only(
            role,
            ConsoleCommand::ApplyAllowedPath {
                selection: parse_selection(rest),
            },
        ),
        "library" => admin_only(role, ConsoleCommand::ListLibrary),
        "library-root" => admin_only(role, ConsoleCommand::SelectLibraryRoot),
        "project" => admin_only(
            role,
            ConsoleCommand::ApplyLibraryProject {
                selection: parse_selection(rest),
            },
        ),
        "connect" | "disconnect" => {
            let mut args = rest.split_whitespace();
            admin_only(
                role,
                ConsoleCommand::ToggleConnection {
                    ip: args.next().map(str::to_string),
                    port: args.next().map(str::to_string),
                },
            )
        }
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

pub fn help_text(role: ConsoleRole) -> &'static str {
    match role {
        ConsoleRole::Admin => {
            "commands: scan <path> | open | paths | path <n> | library | library-root | \
             project <n> | start <name> | stop <name> | connect [ip] [port] | list | log | \
             status | quit"
        }
        ConsoleRole::Remote | ConsoleRole::Operator => {
            "commands: refresh | start <name> | stop <name> | list | log | status | quit"
        }
    }
}
