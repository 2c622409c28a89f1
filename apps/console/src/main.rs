use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{Console, ConsoleRole, HttpRobotApi};
use shared::domain::parse_robot_port;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod orchestration;
mod render;

use commands::{parse_command, ConsoleCommand};
use config::load_settings;
use orchestration::{dispatch_console_command, prompt_banner};

#[derive(Parser, Debug)]
#[command(name = "robostik", about = "Terminal console for the RoboStik behaviour backend")]
struct Args {
    /// Settings file; missing files are ignored.
    #[arg(long, default_value = "console.toml")]
    config: PathBuf,
    /// `admin` or `remote`.
    #[arg(long)]
    role: Option<ConsoleRole>,
    #[arg(long)]
    api_base: Option<String>,
    #[arg(long)]
    poll_interval_ms: Option<u64>,
    #[arg(long)]
    robot_ip: Option<String>,
    #[arg(long)]
    robot_port: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(role) = args.role {
        settings.role = role;
    }
    if let Some(api_base) = args.api_base {
        settings.api_base = api_base;
    }
    if let Some(ms) = args.poll_interval_ms.filter(|ms| *ms > 0) {
        settings.poll_interval_ms = ms;
    }
    if let Some(ip) = args.robot_ip {
        settings.robot_ip = ip;
    }
    if let Some(port) = args.robot_port {
        settings.robot_port = parse_robot_port(&port);
    }

    let api = HttpRobotApi::new(&settings.api_base)
        .with_context(|| format!("invalid api base '{}'", settings.api_base))?;
    let console = Console::new(settings.role, std::sync::Arc::new(api), settings.console_options());

    tracing::info!(api_base = %settings.api_base, role = ?settings.role, "starting console");
    println!("{}", prompt_banner(settings.role));
    println!("{}", commands::help_text(settings.role));

    let renderer = tokio::spawn(render::run(console.subscribe_events()));
    console.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read operator input")? else {
                    break;
                };
                match parse_command(&line, settings.role) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => dispatch_console_command(&console, &settings, command),
                    Err(message) => eprintln!("{message}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    renderer.abort();
    Ok(())
}
