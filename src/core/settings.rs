use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::core::{HeaderStyle, RedactionConfig};

pub const SETTINGS_VERSION: u32 = 1;
pub const CONFIG_ENV_VAR: &str = "PROMPTLOOM_CONFIG";

/* ============================== App settings =============================== */

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppSettings {
    pub version: u32,
    #[serde(default)]
    pub last_opened_folder: Option<PathBuf>,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub issues: String,
    #[serde(default)]
    pub selected_header: HeaderStyle,
    #[serde(default)]
    pub window: Option<WindowBounds>,
    #[serde(default)]
    pub redaction: RedactionConfig,
}

/* ================================== Paths ================================== */

/// `$PROMPTLOOM_CONFIG` if set, else `<config dir>/promptloom/settings.json`.
#[must_use]
pub fn default_settings_file() -> PathBuf {
    if let Some(p) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(p);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptloom")
        .join("settings.json")
}

/* =================================== IO ==================================== */

/// Missing or unparsable files both read as `None`.
#[must_use]
pub fn load_settings(path: &Path) -> Option<AppSettings> {
    let data = fs::read(path).ok()?;
    serde_json::from_slice::<AppSettings>(&data).ok()
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");

    let data = serde_json::to_vec_pretty(settings).map_err(|e| io::Error::other(e.to_string()))?;

    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
