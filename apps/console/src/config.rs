use std::{fs, path::Path, time::Duration};

use client_core::{ConsoleOptions, ConsoleRole, LOG_CAPACITY, STATUS_POLL_INTERVAL};
use shared::domain::{parse_robot_port, DEFAULT_ROBOT_PORT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub poll_interval_ms: u64,
    pub robot_ip: String,
    pub robot_port: u16,
    pub role: ConsoleRole,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5000/api".into(),
            poll_interval_ms: STATUS_POLL_INTERVAL.as_millis() as u64,
            robot_ip: "127.0.0.1".into(),
            robot_port: DEFAULT_ROBOT_PORT,
            role: ConsoleRole::Admin,
        }
    }
}

impl Settings {
    pub fn console_options(&self) -> ConsoleOptions {
        ConsoleOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            log_capacity: LOG_CAPACITY,
        }
    }
}

/// Defaults, then `config_path` if it exists, then the environment.
pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        apply_file_config(&mut settings, &raw);
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn table_value(table: &toml::Table, key: &str) -> Option<String> {
    match table.get(key)? {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Integer(v) => Some(v.to_string()),
        _ => None,
    }
}

pub fn apply_file_config(settings: &mut Settings, raw: &str) {
    let Ok(table) = toml::from_str::<toml::Table>(raw) else {
        tracing::warn!("ignoring unparsable console config");
        return;
    };

    if let Some(v) = table_value(&table, "api_base") {
        settings.api_base = v;
    }
    if let Some(v) = table_value(&table, "poll_interval_ms") {
        apply_poll_interval(settings, &v);
    }
    if let Some(v) = table_value(&table, "robot_ip") {
        settings.robot_ip = v;
    }
    if let Some(v) = table_value(&table, "robot_port") {
        settings.robot_port = parse_robot_port(&v);
    }
    if let Some(v) = table_value(&table, "role") {
        apply_role(settings, &v);
    }
}

pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ROBOSTIK_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = lookup("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = lookup("ROBOSTIK_POLL_INTERVAL_MS") {
        apply_poll_interval(settings, &v);
    }

    if let Some(v) = lookup("NAO_IP") {
        settings.robot_ip = v;
    }
    if let Some(v) = lookup("NAO_PORT") {
        settings.robot_port = parse_robot_port(&v);
    }

    if let Some(v) = lookup("ROBOSTIK_ROLE") {
        apply_role(settings, &v);
    }
}

fn apply_poll_interval(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => settings.poll_interval_ms = ms,
        _ => tracing::warn!(value = raw, "ignoring invalid poll interval"),
    }
}

fn apply_role(settings: &mut Settings, raw: &str) {
    match raw.parse::<ConsoleRole>() {
        Ok(role) => settings.role = role,
        Err(err) => tracing::warn!(error = %err, "ignoring console role"),
    }
}
