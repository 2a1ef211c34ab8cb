use std::{
    env,
    path::{Path, PathBuf},
};

use ::config::{Config, File, FileFormat};

use super::schema::FileSettings;
use crate::error::Result;

impl FileSettings {
    /// Load settings from the resolved config path, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match resolve_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from an INI file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let cfg = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()?;
        let settings: FileSettings = cfg.try_deserialize()?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(settings)
    }
}

/// Resolve the config path from `YOUTUBEGEN_CONFIG_PATH` or the home directory.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("YOUTUBEGEN_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `$HOME/.youtubegenrc`
pub fn default_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(".youtubegenrc"))
}
