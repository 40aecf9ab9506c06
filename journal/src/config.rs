//! Runtime configuration, read from `<home>/config.toml`.
//!
//! `<home>` is `$SNAPDAY_HOME` when set, otherwise `~/.snapday`. Every field is
//! optional; a missing file yields the defaults.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::JournalError;
use crate::error::Result;
use crate::factory::Backend;

pub const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_PERIOD_MINUTES: u64 = 1;
const DEFAULT_TITLE: &str = "snapday";
const DEFAULT_MESSAGE: &str = "You can take today's snapshot now.";

/// On-disk shape of `config.toml`.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    pub data_dir: Option<PathBuf>,
    pub backend: Option<String>,
    pub reminder_period_minutes: Option<u64>,
    pub notification_title: Option<String>,
    pub notification_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalConfig {
    pub home: PathBuf,
    pub data_dir: PathBuf,
    pub backend: Backend,
    pub reminder_period: Duration,
    pub notification_title: String,
    pub notification_message: String,
}

impl JournalConfig {
    /// Load from the default home, honoring `SNAPDAY_HOME`, `SNAPDAY_DATA_DIR`
    /// and `SNAPDAY_STORE_BACKEND`.
    pub fn load() -> Result<Self> {
        let home = find_snapday_home()?;
        let mut cfg = Self::load_from_home(&home)?;
        if let Ok(dir) = std::env::var("SNAPDAY_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = crate::factory::choose_backend_from_env() {
            cfg.backend = backend;
        }
        Ok(cfg)
    }

    /// Load `<home>/config.toml` without consulting the environment.
    pub fn load_from_home(home: &Path) -> Result<Self> {
        let path = home.join(CONFIG_FILENAME);
        let toml = match std::fs::read_to_string(&path) {
            Ok(s) => toml::from_str::<ConfigToml>(&s)
                .map_err(|e| JournalError::Config(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConfigToml::default(),
            Err(e) => {
                return Err(JournalError::Config(format!("{}: {e}", path.display())));
            }
        };
        Self::from_toml(toml, home)
    }

    pub fn from_toml(toml: ConfigToml, home: &Path) -> Result<Self> {
        let minutes = toml.reminder_period_minutes.unwrap_or(DEFAULT_PERIOD_MINUTES);
        if minutes == 0 {
            return Err(JournalError::Config(
                "reminder_period_minutes must be at least 1".to_string(),
            ));
        }
        let data_dir = match toml.data_dir {
            Some(dir) if dir.is_relative() => home.join(dir),
            Some(dir) => dir,
            None => home.join("data"),
        };
        Ok(Self {
            home: home.to_path_buf(),
            data_dir,
            backend: toml
                .backend
                .as_deref()
                .map(Backend::parse)
                .unwrap_or(Backend::Json),
            reminder_period: Duration::from_secs(minutes * 60),
            notification_title: toml
                .notification_title
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            notification_message: toml
                .notification_message
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        })
    }
}

/// `$SNAPDAY_HOME`, or `~/.snapday`.
pub fn find_snapday_home() -> Result<PathBuf> {
    if let Ok(val) = std::env::var("SNAPDAY_HOME")
        && !val.is_empty()
    {
        return Ok(PathBuf::from(val));
    }
    dirs::home_dir()
        .map(|h| h.join(".snapday"))
        .ok_or_else(|| JournalError::Config("could not find home directory".to_string()))
}
