//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".optfilter/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default = "DiscoverySettings::unset")]
    pub discovery: DiscoverySettings,
    #[serde(default = "Display::unset")]
    pub display: Display,
}

/// How filter inputs are recognised in markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default)]
    marker_class: Option<String>,
    #[serde(default)]
    target_attribute: Option<String>,
}

impl DiscoverySettings {
    const DEFAULT_MARKER_CLASS: &'static str = "genre-filter";
    const DEFAULT_TARGET_ATTRIBUTE: &'static str = "data-target";

    /// A layer that leaves both settings to earlier layers.
    fn unset() -> Self {
        Self {
            marker_class: None,
            target_attribute: None,
        }
    }

    /// Class marking an input as a filter.
    pub fn marker_class(&self) -> &str {
        self.marker_class
            .as_deref()
            .unwrap_or(Self::DEFAULT_MARKER_CLASS)
    }

    /// Attribute on the input naming the id of the list it filters.
    pub fn target_attribute(&self) -> &str {
        self.target_attribute
            .as_deref()
            .unwrap_or(Self::DEFAULT_TARGET_ATTRIBUTE)
    }

    pub fn set_marker_class<S: Into<String>>(&mut self, value: S) {
        self.marker_class = Some(value.into());
    }

    pub fn set_target_attribute<S: Into<String>>(&mut self, value: S) {
        self.target_attribute = Some(value.into());
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            marker_class: Some(Self::DEFAULT_MARKER_CLASS.to_owned()),
            target_attribute: Some(Self::DEFAULT_TARGET_ATTRIBUTE.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    #[serde(default)]
    show_hidden: Option<bool>,
    #[serde(default)]
    show_counts: Option<bool>,
}

impl Display {
    fn unset() -> Self {
        Self {
            show_hidden: None,
            show_counts: None,
        }
    }

    fn default_show_hidden() -> bool {
        false
    }

    fn default_show_counts() -> bool {
        true
    }

    /// List hidden options (dimmed) instead of leaving them out.
    pub fn show_hidden(&self) -> bool {
        self.show_hidden.unwrap_or_else(Self::default_show_hidden)
    }

    pub fn show_counts(&self) -> bool {
        self.show_counts.unwrap_or_else(Self::default_show_counts)
    }
}

impl Default for Display {
    fn default() -> Self {
        Self {
            show_hidden: Some(Self::default_show_hidden()),
            show_counts: Some(Self::default_show_counts()),
        }
    }
}

/// Environment overrides for discovery settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    marker_class: Option<String>,
    target_attribute: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            marker_class: env::var("OPTFILTER_MARKER_CLASS").ok(),
            target_attribute: env::var("OPTFILTER_TARGET_ATTRIBUTE").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(marker_class: &str, target_attribute: &str) -> Self {
        Self {
            marker_class: Some(marker_class.to_owned()),
            target_attribute: Some(target_attribute.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    /// Load defaults plus an explicit file instead of the user and workspace layers.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_layers(None, Some(path.to_path_buf()), EnvOverrides::from_env())
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            discovery: merge_discovery(self.discovery, other.discovery),
            display: merge_display(self.display, other.display),
        }
    }
}

fn merge_discovery(mut base: DiscoverySettings, overlay: DiscoverySettings) -> DiscoverySettings {
    if let Some(value) = overlay.marker_class {
        base.marker_class = Some(value);
    }
    if let Some(value) = overlay.target_attribute {
        base.target_attribute = Some(value);
    }
    base
}

fn merge_display(mut base: Display, overlay: Display) -> Display {
    if let Some(value) = overlay.show_hidden {
        base.show_hidden = Some(value);
    }
    if let Some(value) = overlay.show_counts {
        base.show_counts = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("optfilter/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(marker_class) = env.marker_class.filter(|value| !value.is_empty()) {
        config.discovery.set_marker_class(marker_class);
    }
    if let Some(target_attribute) = env.target_attribute.filter(|value| !value.is_empty()) {
        config.discovery.set_target_attribute(target_attribute);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.discovery.marker_class(), "genre-filter");
        assert_eq!(config.discovery.target_attribute(), "data-target");
        assert!(!config.display.show_hidden());
        assert!(config.display.show_counts());
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[discovery]
marker_class = "option-filter"
[display]
show_hidden = true
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".optfilter"))?;
        fs::create_dir_all(workspace_dir.join(".git"))?;
        fs::write(
            workspace_dir.join(".optfilter/config.toml"),
            r#"
[discovery]
target_attribute = "data-list"
[display]
show_counts = false
"#,
        )?;

        let global_path = Some(global);
        let workspace_path = Some(workspace_dir.join(".optfilter/config.toml"));

        let config =
            Config::load_with_layers(global_path, workspace_path, EnvOverrides::default())?;

        assert_eq!(config.discovery.marker_class(), "option-filter");
        assert_eq!(config.discovery.target_attribute(), "data-list");
        assert!(config.display.show_hidden());
        assert!(!config.display.show_counts());

        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("picker-filter", "data-for");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.discovery.marker_class(), "picker-filter");
        assert_eq!(config.discovery.target_attribute(), "data-for");
        Ok(())
    }

    #[test]
    fn find_repo_root_walks_upwards() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested)?;
        fs::create_dir_all(temp.path().join(".git"))?;
        assert_eq!(find_repo_root(&nested), Some(temp.path().to_path_buf()));
        Ok(())
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn later_layer_can_restore_default_values() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("global.toml");
        fs::write(
            &global,
            r#"
[discovery]
marker_class = "picker"
target_attribute = "data-list"
"#,
        )?;
        let workspace = temp.path().join("workspace.toml");
        fs::write(
            &workspace,
            r#"
[discovery]
marker_class = "genre-filter"
"#,
        )?;

        let config =
            Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;
        assert_eq!(config.discovery.marker_class(), "genre-filter");
        assert_eq!(config.discovery.target_attribute(), "data-list");
        Ok(())
    }

    #[test]
    fn missing_sections_leave_earlier_layers_alone() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("global.toml");
        fs::write(
            &global,
            r#"
[discovery]
marker_class = "picker"
[display]
show_hidden = true
"#,
        )?;
        let workspace = temp.path().join("workspace.toml");
        fs::write(&workspace, "")?;

        let config =
            Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;
        assert_eq!(config.discovery.marker_class(), "picker");
        assert!(config.display.show_hidden());
        assert!(config.display.show_counts());
        Ok(())
    }
}
