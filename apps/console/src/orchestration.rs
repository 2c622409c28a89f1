//! Turns parsed operator commands into console operations.

use std::sync::Arc;

use client_core::{Console, ConsoleRole};

use crate::{
    commands::{help_text, ConsoleCommand},
    config::Settings,
    render,
};

/// Network-bound commands run as their own tasks so the prompt and the
/// status cadence never wait on them.
pub fn dispatch_console_command(console: &Arc<Console>, settings: &Settings, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Scan { path } => {
            if let Some(project) = console.project().cloned() {
                tokio::spawn(async move {
                    project.scan(&path).await;
                });
            }
        }
        ConsoleCommand::OpenProject => {
            if let Some(project) = console.project().cloned() {
                tokio::spawn(async move {
                    project.open_project().await;
                });
            }
        }
        ConsoleCommand::ListAllowedPaths => {
            if let Some(project) = console.project().cloned() {
                tokio::spawn(async move {
                    let paths = project.refresh_allowed_paths().await;
                    println!("allowed paths:");
                    for (index, path) in paths.iter().enumerate() {
                        println!("{:>3}. {path}", index + 1);
                    }
                });
            }
        }
        ConsoleCommand::ApplyAllowedPath { selection } => {
            if let Some(project) = console.project().cloned() {
                tokio::spawn(async move {
                    project.apply_allowed_path(selection).await;
                });
            }
        }
        ConsoleCommand::ListLibrary => {
            if let Some(project) = console.project().cloned() {
                tokio::spawn(async move {
                    let projects = project.refresh_library_projects().await;
                    println!("library projects:");
                    for (index, entry) in projects.iter().enumerate() {
                        println!("{:>3}. {} ({})", index + 1, entry.name, entry.path);
                    }
                });
            }
        }
        ConsoleCommand::SelectLibraryRoot => {
            if let Some(project) = console.project().cloned() {
                tokio::spawn(async move {
                    project.select_library_root().await;
                });
            }
        }
        ConsoleCommand::ApplyLibraryProject { selection } => {
            if let Some(project) = console.project().cloned() {
                tokio::spawn(async move {
                    project.apply_library_project(selection).await;
                });
            }
        }
        ConsoleCommand::Behaviour { name, action } => match console.registry().card(&name) {
            Some(card) => {
                tokio::spawn(async move {
                    card.trigger(action).await;
                });
            }
            None => println!("no behaviour named '{name}' is shown"),
        },
        ConsoleCommand::ToggleConnection { ip, port } => {
            let ip = ip.unwrap_or_else(|| settings.robot_ip.clone());
            let port = port.unwrap_or_else(|| settings.robot_port.to_string());
            let console = Arc::clone(console);
            tokio::spawn(async move {
                console.toggle_connection(&ip, &port).await;
            });
        }
        ConsoleCommand::Reload => {
            let console = Arc::clone(console);
            tokio::spawn(async move {
                console.reload_behaviours().await;
            });
        }
        ConsoleCommand::ShowBehaviours => {
            for line in render::format_registry(&console.registry().snapshot()) {
                println!("{line}");
            }
        }
        ConsoleCommand::ShowLog => {
            for entry in console.log().entries() {
                println!("{}", render::format_log_entry(&entry));
            }
        }
        ConsoleCommand::ShowStatus => {
            println!("{}", render::format_status(&console.status().snapshot()));
            if let Some(toggle) = console.status().connect_toggle() {
                let snapshot = toggle.snapshot();
                let busy = if snapshot.disabled { " (busy)" } else { "" };
                println!("connection control: {}{busy}", snapshot.label);
            }
            if let Some(project) = console.project() {
                println!("project: {}", project.path_field());
            }
        }
        ConsoleCommand::Help => println!("{}", help_text(console.role())),
        ConsoleCommand::Quit => {}
    }
}

pub fn prompt_banner(role: ConsoleRole) -> &'static str {
    match role {
        ConsoleRole::Admin => "RoboStik admin console",
        ConsoleRole::Remote => "RoboStik remote console",
        ConsoleRole::Operator => "RoboStik operator console",
    }
}
