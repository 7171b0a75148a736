use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::SyncConfig;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "raspiled.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub wheel_debounce_ms: u64,
    pub preset_debounce_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:9090/".into(),
            wheel_debounce_ms: 250,
            preset_debounce_ms: 150,
            request_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    wheel_debounce_ms: Option<u64>,
    preset_debounce_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
}

impl Settings {
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            wheel_debounce: Duration::from_millis(self.wheel_debounce_ms),
            preset_debounce: Duration::from_millis(self.preset_debounce_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file.server_url {
            self.server_url = v;
        }
        if let Some(v) = file.wheel_debounce_ms {
            self.wheel_debounce_ms = v;
        }
        if let Some(v) = file.preset_debounce_ms {
            self.preset_debounce_ms = v;
        }
        if let Some(v) = file.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        Ok(())
    }

    /// Later keys win, so `APP__*` overrides the `RASPILED_*` spelling.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in ["RASPILED_URL", "APP__SERVER_URL"] {
            if let Some(v) = lookup(key) {
                self.server_url = v;
            }
        }
        override_millis(
            &lookup,
            &["RASPILED_WHEEL_DEBOUNCE_MS", "APP__WHEEL_DEBOUNCE_MS"],
            &mut self.wheel_debounce_ms,
        );
        override_millis(
            &lookup,
            &["RASPILED_PRESET_DEBOUNCE_MS", "APP__PRESET_DEBOUNCE_MS"],
            &mut self.preset_debounce_ms,
        );
        override_millis(
            &lookup,
            &["RASPILED_REQUEST_TIMEOUT_MS", "APP__REQUEST_TIMEOUT_MS"],
            &mut self.request_timeout_ms,
        );
    }
}

fn override_millis(lookup: &impl Fn(&str) -> Option<String>, keys: &[&str], slot: &mut u64) {
    for key in keys {
        let Some(raw) = lookup(key) else {
            continue;
        };
        match raw.trim().parse::<u64>() {
            Ok(parsed) => *slot = parsed,
            Err(err) => warn!(key, value = %raw, %err, "ignoring non-numeric setting"),
        }
    }
}

/// Defaults, then the config file, then the environment.
///
/// An explicit `path` must exist; the default `raspiled.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            settings
                .apply_file(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                settings
                    .apply_file(&raw)
                    .with_context(|| format!("invalid config file '{DEFAULT_CONFIG_FILE}'"))?;
            }
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}
