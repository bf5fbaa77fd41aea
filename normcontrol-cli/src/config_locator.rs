//! Config and cache locations for the CLI
//!
//! An explicit `--config` wins; otherwise the per-user config file is used
//! when it exists. An explicit file must load; a broken user config is
//! skipped with a warning. The report cache lives in the per-user cache
//! directory.

use anyhow::{anyhow, Result};
use normcontrol_core::ConfigManager;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "normcontrol";
const CONFIG_FILE: &str = "config.yaml";

/// `<config_dir>/normcontrol/config.yaml`, whether or not it exists
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`
    Explicit(PathBuf),
    /// The per-user config file
    Discovered(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => path,
        }
    }
}

/// Config file to load: the explicit path, else the user config if present
pub fn resolve_config_path(explicit: Option<&str>) -> Option<ConfigSource> {
    resolve_with(explicit, user_config_path())
}

fn resolve_with(explicit: Option<&str>, user_config: Option<PathBuf>) -> Option<ConfigSource> {
    if let Some(path) = explicit {
        return Some(ConfigSource::Explicit(PathBuf::from(path)));
    }
    user_config
        .filter(|path| path.is_file())
        .map(ConfigSource::Discovered)
}

/// Register the config file's profile with the manager and return its name.
/// `None` means a discovered file failed to load and only the built-in
/// profiles are available.
pub fn load_config(manager: &mut ConfigManager, source: &ConfigSource) -> Result<Option<String>> {
    let path = source.path().to_string_lossy();
    match source {
        ConfigSource::Explicit(_) => manager.load_config_from_file(&path).map(Some),
        ConfigSource::Discovered(_) => Ok(manager.load_config_with_fallback(&path)),
    }
}

/// Report cache directory: the explicit one, else `<cache_dir>/normcontrol`
pub fn resolve_cache_dir(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::cache_dir().ok_or_else(|| anyhow!("Could not determine cache directory"))?;
    Ok(base.join(APP_DIR))
}

/// Default report path next to the input: `<stem>_normcontrol.<ext>`
pub fn default_output_path(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{stem}_normcontrol.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_wins() {
        let user = Some(PathBuf::from("/definitely/missing/config.yaml"));
        assert_eq!(
            resolve_with(Some("custom.yaml"), user),
            Some(ConfigSource::Explicit(PathBuf::from("custom.yaml")))
        );
    }

    #[test]
    fn test_missing_user_config_is_skipped() {
        let user = Some(PathBuf::from("/definitely/missing/config.yaml"));
        assert_eq!(resolve_with(None, user), None);
        assert_eq!(resolve_with(None, None), None);
    }

    #[test]
    fn test_existing_user_config_is_used() {
        let dir = std::env::temp_dir().join(format!("normcontrol_locator_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join(CONFIG_FILE);
        std::fs::write(&file, "profile: mine\n").unwrap();

        assert_eq!(
            resolve_with(None, Some(file.clone())),
            Some(ConfigSource::Discovered(file.clone()))
        );

        let mut manager = ConfigManager::new();
        let name = load_config(&mut manager, &ConfigSource::Discovered(file)).unwrap();
        assert_eq!(name.as_deref(), Some("mine"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_malformed_user_config_falls_back() {
        let dir = std::env::temp_dir().join(format!("normcontrol_locator_bad_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join(CONFIG_FILE);
        std::fs::write(&file, "zones: [unclosed\n").unwrap();

        let mut manager = ConfigManager::new();
        let discovered = resolve_with(None, Some(file.clone())).unwrap();
        assert_eq!(load_config(&mut manager, &discovered).unwrap(), None);
        let names: Vec<&str> = manager.profile_names().collect();
        assert_eq!(names, vec!["default", "lenient", "strict"]);

        let explicit = ConfigSource::Explicit(file);
        assert!(load_config(&mut manager, &explicit).is_err());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("drawings/part.json"), "txt"),
            PathBuf::from("drawings/part_normcontrol.txt")
        );
    }

    #[test]
    fn test_explicit_cache_dir() {
        assert_eq!(resolve_cache_dir(Some("/tmp/nc")).unwrap(), PathBuf::from("/tmp/nc"));
    }
}
