//! Terminal rendering of console events and snapshots.

use client_core::{
    CardSnapshot, ConsoleEvent, LogEntry, RegistrySnapshot, Severity, StatusSnapshot,
};
use tokio::sync::broadcast;
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};

pub fn format_status(snapshot: &StatusSnapshot) -> String {
    format!("[{}] {}", snapshot.class.as_css_class(), snapshot.text)
}

pub fn format_log_entry(entry: &LogEntry) -> String {
    match entry.severity {
        Severity::Info => entry.render(),
        Severity::Success | Severity::Error => {
            format!("{} ({})", entry.render(), entry.severity.as_css_class())
        }
    }
}

fn format_card(index: usize, card: &CardSnapshot) -> String {
    format!(
        "{:>3}. {}  [{}{}] [{}{}]",
        index + 1,
        card.name,
        card.start.label,
        if card.start.disabled { " …" } else { "" },
        card.stop.label,
        if card.stop.disabled { " …" } else { "" },
    )
}

pub fn format_registry(snapshot: &RegistrySnapshot) -> Vec<String> {
    match snapshot {
        RegistrySnapshot::Placeholder(text) => vec![format!("  {text}")],
        RegistrySnapshot::Cards(cards) => cards
            .iter()
            .enumerate()
            .map(|(index, card)| format_card(index, card))
            .collect(),
    }
}

pub fn print_event(event: &ConsoleEvent) {
    match event {
        ConsoleEvent::StatusChanged(snapshot) => println!("{}", format_status(snapshot)),
        ConsoleEvent::LogAppended(entry) => println!("{}", format_log_entry(entry)),
        ConsoleEvent::RegistryRebuilt(snapshot) => {
            println!("behaviours:");
            for line in format_registry(snapshot) {
                println!("{line}");
            }
        }
        ConsoleEvent::ProjectPathChanged(path) => println!("project: {path}"),
    }
}

/// Prints every event until the console's bus closes.
pub async fn run(events: broadcast::Receiver<ConsoleEvent>) {
    let mut stream = BroadcastStream::new(events);
    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => print_event(&event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "console renderer fell behind");
            }
        }
    }
}
