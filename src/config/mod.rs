use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::remote::{
    ModelCatalog, ModelSelector, TargetResolution, DEFAULT_API_BASE, DEFAULT_FAST_MODEL,
    DEFAULT_HIGH_RESOLUTION_MODEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "promptedit";
const APP_CONFIG_FILE: &str = "config.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_EXPORT_PREFIX: &str = "edited-image";

/// Application-level settings from `config.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base: String,
    pub fast_model: String,
    pub high_resolution_model: String,
    pub default_model: ModelSelector,
    pub target_resolution: TargetResolution,
    pub request_timeout_secs: u64,
    pub export_prefix: String,
    pub export_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            high_resolution_model: DEFAULT_HIGH_RESOLUTION_MODEL.to_string(),
            default_model: ModelSelector::default(),
            target_resolution: TargetResolution::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            export_dir: None,
        }
    }
}

impl AppConfig {
    pub fn models(&self) -> ModelCatalog {
        ModelCatalog {
            fast: self.fast_model.clone(),
            high_resolution: self.high_resolution_model.clone(),
        }
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("promptedit-config-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join(APP_DIR)).expect("create scratch config dir");
        dir
    }

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "promptedit",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/promptedit/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("promptedit", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/promptedit/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("promptedit", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_app_config_with(Some(Path::new("/nonexistent/promptedit-root")), None);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let root = scratch_dir("partial");
        std::fs::write(
            root.join(APP_DIR).join(APP_CONFIG_FILE),
            r#"{ "default_model": "high_resolution", "target_resolution": "4K", "export_prefix": "shot" }"#,
        )
        .expect("write config");

        let config = load_app_config_with(Some(&root), None);
        assert_eq!(config.default_model, ModelSelector::HighResolution);
        assert_eq!(config.target_resolution, TargetResolution::FourK);
        assert_eq!(config.export_prefix, "shot");
        assert_eq!(config.fast_model, DEFAULT_FAST_MODEL);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let root = scratch_dir("malformed");
        std::fs::write(root.join(APP_DIR).join(APP_CONFIG_FILE), "{ not json").expect("write");
        assert_eq!(load_app_config_with(Some(&root), None), AppConfig::default());
        let _ = std::fs::remove_dir_all(root);
    }
}
