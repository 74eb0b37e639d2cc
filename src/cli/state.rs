use promptloom::core::{
    AppSettings, Explorer, FolderCheckPolicy, LocalFs, Redactor, SETTINGS_VERSION, load_settings,
    save_settings,
};
use std::{path::PathBuf, rc::Rc};
use tracing::warn;

pub struct AppState {
    pub settings_path: PathBuf,
    pub settings: AppSettings,
    pub explorer: Explorer,
    pub redactor: Redactor,
}

impl AppState {
    pub fn load(settings_path: PathBuf, policy: FolderCheckPolicy) -> Self {
        let settings = load_settings(&settings_path).unwrap_or_else(|| AppSettings {
            version: SETTINGS_VERSION,
            ..AppSettings::default()
        });
        let redactor = Redactor::from_config(&settings.redaction);
        Self {
            settings_path,
            settings,
            explorer: Explorer::with_policy(Rc::new(LocalFs), policy),
            redactor,
        }
    }

    /// Saves settings; failures are logged, never fatal.
    pub fn persist(&self) {
        if let Err(e) = save_settings(&self.settings_path, &self.settings) {
            warn!(path = %self.settings_path.display(), error = %e, "could not save settings");
        }
    }
}
