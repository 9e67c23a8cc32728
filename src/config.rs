use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ChatError, Result};

/// The single room this deployment talks to.
pub const ROOM: &str = "emergency-92hd83hdk3jhd83jdh38d";

/// Name shown in the header and composer hint.
pub const ROOM_LABEL: &str = "oomfie-chat";

/// Environment override for the backend base URL.
pub const ENV_BACKEND_URL: &str = "OOMFIE_BACKEND_URL";
/// Environment override for the public (anon) API key.
pub const ENV_ANON_KEY: &str = "OOMFIE_ANON_KEY";

const KEYRING_SERVICE: &str = "oomfie-chat";
const KEYRING_USER: &str = "anon_key";

/// Locally persisted preferences.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct Settings {
    /// Display name chosen on the join screen.
    #[serde(default)]
    pub chat_name: Option<String>,
    /// Base URL of the hosted backend, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default)]
    pub theme: String,
}

impl Settings {
    pub fn load_from(path: &Path) -> Option<Settings> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
                None
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = fs::File::create(path)?;
        let data = serde_json::to_string_pretty(self)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }
}

pub fn settings_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "oomfie", "oomfie-chat")?;
    let dir = proj.config_dir();
    if let Err(e) = fs::create_dir_all(dir) {
        tracing::warn!(error = %e, "failed to create config dir");
        return None;
    }
    Some(dir.join("settings.json"))
}

pub fn load_settings() -> Option<Settings> {
    Settings::load_from(&settings_path()?)
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    if let Some(path) = settings_path() {
        settings.save_to(&path)?;
    }
    Ok(())
}

/// Connection parameters for the hosted backend.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub room: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            room: ROOM.to_string(),
        }
    }

    /// Resolve the config from the environment, the settings file and the
    /// OS keyring, in that order of precedence.
    pub fn resolve(settings: &Settings) -> Result<Self> {
        Self::resolve_with(settings, |key| std::env::var(key).ok(), load_anon_key)
    }

    pub(crate) fn resolve_with(
        settings: &Settings,
        env: impl Fn(&str) -> Option<String>,
        keyring: impl FnOnce() -> Result<Option<String>>,
    ) -> Result<Self> {
        let url = env(ENV_BACKEND_URL)
            .filter(|u| !u.trim().is_empty())
            .or_else(|| settings.backend_url.clone())
            .ok_or_else(|| {
                ChatError::Config(format!(
                    "no backend URL: set {} or backend_url in settings.json",
                    ENV_BACKEND_URL
                ))
            })?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ChatError::Config(format!(
                "backend URL must start with http:// or https://, got {}",
                url
            )));
        }

        let anon_key = match env(ENV_ANON_KEY).filter(|k| !k.trim().is_empty()) {
            Some(key) => key,
            None => keyring()?.ok_or_else(|| {
                ChatError::Config(format!(
                    "no API key: set {} or store it in the system keyring",
                    ENV_ANON_KEY
                ))
            })?,
        };

        Ok(Self::new(url, anon_key))
    }

    /// `https://host` -> `wss://host/realtime/v1/websocket?...`
    pub fn realtime_url(&self) -> String {
        let base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.url.clone()
        };
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            base, self.anon_key
        )
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }
}

/// Read the anon key from the system keyring. A missing entry is not an error.
pub fn load_anon_key() -> Result<Option<String>> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
    match entry.get_password() {
        Ok(key) => Ok(Some(key)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Store the anon key in the system keyring.
pub fn save_anon_key(key: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
    entry.set_password(key)?;
    Ok(())
}
