//! Project configuration module.
//!
//! Handles loading, merging, and validating `yaspp.config.json` files. The
//! configuration is layered: the generator ships its own config (the
//! [`AppConfig`], which also carries the generator-relative `root`), and the
//! project's config file is merged on top of it.
//!
//! ## Config File Location
//!
//! ```text
//! yaspp/                      # Generator installation root
//! └── yaspp.config.json       # App config (defaults + `root`)
//!
//! my-site/                    # Project root
//! ├── yaspp.config.json       # Project config (overrides app config)
//! ├── content/
//! │   └── docs/en/...
//! ├── locales/
//! ├── nav.json
//! └── style/
//! ```
//!
//! A `yaspp.config.toml` is accepted instead of JSON; the format is picked by
//! extension. When both exist, JSON wins.
//!
//! ## Configuration Shape
//!
//! ```json
//! {
//!   "content": { "root": "content", "index": "docs" },
//!   "nav": { "index": "nav.json" },
//!   "locale": {
//!     "root": "locales",
//!     "langs": ["en", "he"],
//!     "defaultLocale": "en",
//!     "pages": { "*": ["common"] }
//!   },
//!   "style": {
//!     "root": "style",
//!     "sheets": ["site.scss"],
//!     "classBindings": "bindings.json",
//!     "themes": { "names": ["light", "dark"], "defaultTheme": "light" }
//!   },
//!   "assets": { "root": "assets" }
//! }
//! ```
//!
//! Every path is relative to the project root: absolute paths and `..`
//! segments are rejected. Unknown keys are rejected to catch typos early.
//!
//! ## Style Schema Revisions
//!
//! Early project files used a single `style.index` stylesheet. That field is
//! still accepted as a deprecated alias for `sheets` and is only consulted
//! when `sheets` is absent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// File names probed, in order, when loading a config from a directory.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["yaspp.config.json", "yaspp.config.toml"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("No config file found in {}", .0.display())]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Mixed into every section that owns a directory of files.
///
/// The root is relative to the project root; everything below it is copied
/// to the public output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    pub root: String,
}

pub type AssetsConfig = BaseConfig;

/// Locale settings: the supported languages and per-page translation
/// namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectLocaleConfig {
    /// Directory holding the locale files, relative to the project root.
    pub root: String,
    pub langs: Vec<String>,
    pub default_locale: String,
    /// Page key → translation namespaces loaded for that page.
    #[serde(default)]
    pub pages: BTreeMap<String, Vec<String>>,
}

impl ProjectLocaleConfig {
    /// Languages other than the default, in declaration order.
    pub fn secondary_langs(&self) -> impl Iterator<Item = &str> {
        self.langs
            .iter()
            .map(String::as_str)
            .filter(move |lang| *lang != self.default_locale)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    pub root: String,
    /// Index folder relative to the content root, e.g. `docs`. It must hold at
    /// least a folder for the default locale.
    pub index: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavConfig {
    /// Path to the navigation source file.
    pub index: String,
}

/// One path or a list of paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathList {
    One(String),
    Many(Vec<String>),
}

impl PathList {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            PathList::One(path) => vec![path.as_str()],
            PathList::Many(paths) => paths.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ThemesConfig {
    pub names: Vec<String>,
    pub default_theme: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StyleConfig {
    pub root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets: Option<PathList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_bindings: Option<PathList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub themes: Option<ThemesConfig>,
    /// Deprecated single-stylesheet field from the first schema revision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

impl StyleConfig {
    /// Effective stylesheet paths, relative to the style root.
    ///
    /// `sheets` wins; the legacy `index` is used only when `sheets` is absent.
    pub fn sheet_paths(&self) -> Vec<&str> {
        match (&self.sheets, &self.index) {
            (Some(sheets), _) => sheets.paths(),
            (None, Some(index)) => vec![index.as_str()],
            (None, None) => Vec::new(),
        }
    }

    pub fn class_binding_paths(&self) -> Vec<&str> {
        self.class_bindings
            .as_ref()
            .map(PathList::paths)
            .unwrap_or_default()
    }
}

/// Project configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub content: ContentConfig,
    pub nav: NavConfig,
    pub locale: ProjectLocaleConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetsConfig>,
}

/// The generator's view: a project config plus the generator-relative root.
///
/// Serializes flat, with `root` beside the project sections. It is read with
/// [`AppConfig::from_value`] rather than `Deserialize`, because serde's
/// `flatten` would silently drop misspelled top-level keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    /// Relative to the generator installation root.
    pub root: String,
    #[serde(flatten)]
    pub project: ProjectConfig,
}

impl ProjectConfig {
    /// Validate cross-field rules and path shapes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let locale = &self.locale;
        if locale.langs.is_empty() {
            return Err(ConfigError::Validation(
                "locale.langs must not be empty".into(),
            ));
        }
        if !locale.langs.contains(&locale.default_locale) {
            return Err(ConfigError::Validation(format!(
                "locale.defaultLocale \"{}\" is not listed in locale.langs",
                locale.default_locale
            )));
        }

        check_relative("content.root", &self.content.root)?;
        check_relative("content.index", &self.content.index)?;
        check_relative("nav.index", &self.nav.index)?;
        check_relative("locale.root", &locale.root)?;
        if let Some(assets) = &self.assets {
            check_relative("assets.root", &assets.root)?;
        }
        if let Some(style) = &self.style {
            style.validate()?;
        }
        Ok(())
    }
}

impl StyleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_relative("style.root", &self.root)?;
        for sheet in self.sheet_paths() {
            check_relative("style.sheets", sheet)?;
        }
        for binding in self.class_binding_paths() {
            check_relative("style.classBindings", binding)?;
        }
        if let Some(themes) = &self.themes
            && !themes.names.contains(&themes.default_theme)
        {
            return Err(ConfigError::Validation(format!(
                "style.themes.defaultTheme \"{}\" is not listed in style.themes.names",
                themes.default_theme
            )));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Split `root` off a flat config object and decode the rest as a
    /// [`ProjectConfig`], so unknown keys are rejected at every level.
    pub fn from_value(mut value: serde_json::Value) -> Result<Self, ConfigError> {
        let root = value
            .as_object_mut()
            .and_then(|map| map.remove("root"))
            .ok_or_else(|| ConfigError::Validation("app config must set root".into()))?;
        Ok(Self {
            root: serde_json::from_value(root)?,
            project: serde_json::from_value(value)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_relative("root", &self.root)?;
        self.project.validate()
    }
}

/// Reject empty, absolute, and parent-traversing paths.
fn check_relative(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} must not be empty")));
    }
    let path = Path::new(value);
    // `has_root` also catches `/x` on windows, where it is not `is_absolute`.
    if path.is_absolute() || path.has_root() {
        return Err(ConfigError::Validation(format!(
            "{field} must be relative to the project root, got \"{value}\""
        )));
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(ConfigError::Validation(format!(
            "{field} must not leave the project root, got \"{value}\""
        )));
    }
    Ok(())
}

/// Deep-merge two JSON values. Objects merge recursively; everything else in
/// `overlay` replaces `base`.
pub fn merge_values(base: serde_json::Value, overlay: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => merge_values(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Parse a config file into an untyped value, picking the format by extension.
pub fn load_raw_config(path: &Path) -> Result<serde_json::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), "loading config");
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("toml") => {
            let value: toml::Value = toml::from_str(&content)?;
            Ok(serde_json::to_value(value)?)
        }
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Find the config file in `dir`, if any.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn load_dir_value(dir: &Path) -> Result<serde_json::Value, ConfigError> {
    let path = find_config_file(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;
    load_raw_config(&path)
}

/// Deserialize and validate a merged value as a project config.
pub fn resolve_project_config(value: serde_json::Value) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig = serde_json::from_value(value)?;
    warn_deprecated(&config);
    config.validate()?;
    Ok(config)
}

/// Load the project config from `project_dir`.
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    resolve_project_config(load_dir_value(project_dir)?)
}

/// Load the generator config from `app_dir` and merge the project config
/// from `project_dir` on top of it. The project file is optional.
pub fn load_app_config(app_dir: &Path, project_dir: &Path) -> Result<AppConfig, ConfigError> {
    let base = load_dir_value(app_dir)?;
    let merged = match find_config_file(project_dir) {
        Some(path) => merge_values(base, load_raw_config(&path)?),
        None => base,
    };
    let config = AppConfig::from_value(merged)?;
    warn_deprecated(&config.project);
    config.validate()?;
    Ok(config)
}

fn warn_deprecated(config: &ProjectConfig) {
    if let Some(style) = &config.style
        && let Some(index) = &style.index
    {
        if style.sheets.is_some() {
            warn!(index = %index, "style.index is ignored because style.sheets is set");
        } else {
            warn!(index = %index, "style.index is deprecated, use style.sheets");
        }
    }
}

/// Returns a starter `yaspp.config.json` with every section filled in.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_json() -> &'static str {
    r#"{
  "content": {
    "root": "content",
    "index": "docs"
  },
  "nav": {
    "index": "nav.json"
  },
  "locale": {
    "root": "locales",
    "langs": ["en"],
    "defaultLocale": "en",
    "pages": {
      "*": ["common"]
    }
  },
  "style": {
    "root": "style",
    "sheets": ["site.scss"],
    "themes": {
      "names": ["light", "dark"],
      "defaultTheme": "light"
    }
  },
  "assets": {
    "root": "assets"
  }
}
"#
}
