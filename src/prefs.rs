use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PREFS_FILE: &str = ".vibecheck.json";

/// Small local key-value state. Missing keys default; last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub onboarding_complete: bool,
    pub favorite_city: Option<String>,
    pub notification_session_id: Option<Uuid>,
    pub insights_pin: Option<String>,
}

pub struct PrefsFile {
    path: PathBuf,
}

impl PrefsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unreadable or corrupt files fall back to defaults.
    pub fn load(&self) -> Preferences {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Preferences::default();
            }
            Err(err) => {
                log::warn!("could not read {}: {err}", self.path.display());
                return Preferences::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            log::warn!("ignoring malformed {}: {err}", self.path.display());
            Preferences::default()
        })
    }

    pub fn save(&self, prefs: &Preferences) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(prefs)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn update(&self, change: impl FnOnce(&mut Preferences)) -> anyhow::Result<Preferences> {
        let mut prefs = self.load();
        change(&mut prefs);
        self.save(&prefs)?;
        Ok(prefs)
    }
}
