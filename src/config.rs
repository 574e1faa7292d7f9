use std::fs;
use std::path::{Path, PathBuf};

use dirs_next as dirs;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const APP_DIR: &str = "manifest-images";
const CONFIG_FILE: &str = "config.toml";

/// User configuration stored as TOML under the platform config directory.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Glob patterns for files and directories the collector never visits.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn save(&self) -> Result<PathBuf, AppError> {
        let path = config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Adds a pattern unless it is already present. Returns whether it was added.
    pub fn append_exclude(&mut self, value: String) -> bool {
        if self.exclude.contains(&value) {
            return false;
        }
        self.exclude.push(value);
        true
    }

    pub fn compile_excludes(&self) -> Result<Option<GlobSet>, AppError> {
        if self.exclude.is_empty() {
            return Ok(None);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            builder.add(Glob::new(&expand_home(pattern)?)?);
        }

        Ok(Some(builder.build()?))
    }
}

pub fn config_file_path() -> Result<PathBuf, AppError> {
    let config_root = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .ok_or_else(|| {
            AppError::config("Unable to determine configuration directory for this platform")
        })?;
    Ok(config_root.join(APP_DIR).join(CONFIG_FILE))
}

fn expand_home(value: &str) -> Result<String, AppError> {
    if !value.starts_with('~') {
        return Ok(value.to_string());
    }
    let home_dir = dirs::home_dir().ok_or_else(|| {
        AppError::config("Unable to expand '~' because the home directory is unknown")
    })?;
    if value == "~" {
        Ok(home_dir.display().to_string())
    } else if let Some(stripped) = value.strip_prefix("~/") {
        Ok(home_dir.join(stripped).display().to_string())
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_default() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::load_from(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn save_then_load_keeps_excludes() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested/config.toml");

        let mut config = Config::default();
        assert!(config.append_exclude("**/vendor/**".to_string()));
        assert!(!config.append_exclude("**/vendor/**".to_string()));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.exclude, vec!["**/vendor/**".to_string()]);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "exclude = 3").unwrap();

        assert!(matches!(Config::load_from(&path), Err(AppError::ConfigParse(_))));
    }

    #[test]
    fn compile_excludes_matches_patterns() {
        let config = Config { exclude: vec!["/srv/charts/**".to_string()] };
        let set = config.compile_excludes().unwrap().expect("non-empty set");
        assert!(set.is_match("/srv/charts/app/deploy.yaml"));
        assert!(!set.is_match("/srv/manifests/deploy.yaml"));

        assert!(Config::default().compile_excludes().unwrap().is_none());
    }

    #[test]
    fn invalid_glob_is_reported() {
        let config = Config { exclude: vec!["[".to_string()] };
        assert!(matches!(config.compile_excludes(), Err(AppError::Glob(_))));
    }
}
