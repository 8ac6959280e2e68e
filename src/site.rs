//! Project loading: config first, then the navigation file it points to.
//!
//! This is the start-of-build step. A [`Site`] is an immutable snapshot of
//! one project's configuration and navigation; a rebuild loads a new one
//! rather than patching the old.

use crate::config::{self, AppConfig, ConfigError, ProjectConfig};
use crate::nav::{self, IdCollision, IntegrityError, MissingTranslation, NavData, NavError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Navigation error in {}: {source}", .path.display())]
    Nav {
        path: PathBuf,
        #[source]
        source: NavError,
    },
}

#[derive(Debug, Clone)]
pub struct Site {
    /// Project root every config path is relative to.
    pub root: PathBuf,
    pub config: ProjectConfig,
    /// Generator-relative root, when the config came from an app layer.
    pub app_root: Option<String>,
    pub nav: NavData,
}

/// Findings of [`Site::check`]. Only `integrity` entries are errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub integrity: Vec<IntegrityError>,
    pub collisions: Vec<IdCollision>,
    pub missing_translations: Vec<MissingTranslation>,
}

impl CheckReport {
    pub fn is_valid(&self) -> bool {
        self.integrity.is_empty()
    }
}

impl Site {
    /// Load `yaspp.config.*` from `project_dir`, then its navigation file.
    pub fn load(project_dir: &Path) -> Result<Self, SiteError> {
        let config = config::load_project_config(project_dir)?;
        Self::with_config(project_dir, config, None)
    }

    /// Like [`Site::load`], with the generator's config as the base layer.
    pub fn load_with_app(app_dir: &Path, project_dir: &Path) -> Result<Self, SiteError> {
        let AppConfig { root, project } = config::load_app_config(app_dir, project_dir)?;
        Self::with_config(project_dir, project, Some(root))
    }

    fn with_config(
        project_dir: &Path,
        config: ProjectConfig,
        app_root: Option<String>,
    ) -> Result<Self, SiteError> {
        let nav_path = project_dir.join(&config.nav.index);
        let nav = nav::load_nav(&nav_path).map_err(|source| SiteError::Nav {
            path: nav_path.clone(),
            source,
        })?;
        info!(root = %project_dir.display(), nav = %nav_path.display(), "loaded site");
        Ok(Self {
            root: project_dir.to_path_buf(),
            config,
            app_root,
            nav,
        })
    }

    pub fn nav_path(&self) -> PathBuf {
        self.root.join(&self.config.nav.index)
    }

    /// Run every navigation check against the configured locales.
    pub fn check(&self) -> CheckReport {
        let locale = &self.config.locale;
        let report = CheckReport {
            integrity: self.nav.check(),
            collisions: self.nav.id_collisions(),
            missing_translations: self
                .nav
                .missing_translations(&locale.langs, &locale.default_locale),
        };
        for missing in &report.missing_translations {
            warn!(kind = %missing.kind, id = %missing.id, lang = %missing.lang, "missing translation");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::IntegrityKind;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_project(dir: &Path, nav: serde_json::Value) {
        let config = json!({
            "content": { "root": "content", "index": "docs" },
            "nav": { "index": "data/nav.json" },
            "locale": { "root": "locales", "langs": ["en", "fr"], "defaultLocale": "en" }
        });
        fs::write(dir.join("yaspp.config.json"), config.to_string()).unwrap();
        fs::create_dir_all(dir.join("data")).unwrap();
        fs::write(dir.join("data/nav.json"), nav.to_string()).unwrap();
    }

    fn valid_nav() -> serde_json::Value {
        json!({
            "items": {
                "home": { "type": "page", "title": "Home", "url": "/", "locale": { "fr": "Accueil" } }
            },
            "sections": { "top": { "title": "Top", "items": ["home"] } },
            "groups": { "main": { "items": ["top"] } }
        })
    }

    #[test]
    fn load_reads_config_and_nav() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), valid_nav());

        let site = Site::load(tmp.path()).unwrap();
        assert_eq!(site.nav_path(), tmp.path().join("data/nav.json"));
        assert!(site.nav.items.contains_key("home"));
        assert!(site.app_root.is_none());
    }

    #[test]
    fn check_reports_missing_translations() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), valid_nav());

        let report = Site::load(tmp.path()).unwrap().check();
        assert!(report.is_valid());
        // "top" has no French title; "home" does.
        assert_eq!(report.missing_translations.len(), 1);
        assert_eq!(report.missing_translations[0].id, "top");
    }

    #[test]
    fn check_reports_integrity_errors() {
        let tmp = TempDir::new().unwrap();
        let mut nav = valid_nav();
        nav["groups"]["main"]["items"] = json!(["top", "main"]);
        write_project(tmp.path(), nav);

        let report = Site::load(tmp.path()).unwrap().check();
        assert!(!report.is_valid());
        assert_eq!(report.integrity[0].kind, IntegrityKind::GroupCycle);
    }

    #[test]
    fn malformed_nav_names_the_file() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), json!({ "items": 3 }));

        let err = Site::load(tmp.path()).unwrap_err();
        assert!(matches!(err, SiteError::Nav { source: NavError::Parse(_), .. }));
        assert!(err.to_string().contains("nav.json"));
    }

    #[test]
    fn config_errors_propagate() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            Site::load(tmp.path()),
            Err(SiteError::Config(ConfigError::NotFound(_)))
        ));
    }

    #[test]
    fn load_with_app_keeps_app_root() {
        let app = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            app.path().join("yaspp.config.json"),
            json!({
                "root": "generator",
                "content": { "root": "content", "index": "docs" },
                "nav": { "index": "data/nav.json" },
                "locale": { "root": "locales", "langs": ["en"], "defaultLocale": "en" }
            })
            .to_string(),
        )
        .unwrap();
        fs::create_dir_all(project.path().join("data")).unwrap();
        fs::write(project.path().join("data/nav.json"), valid_nav().to_string()).unwrap();

        let site = Site::load_with_app(app.path(), project.path()).unwrap();
        assert_eq!(site.app_root.as_deref(), Some("generator"));
        assert_eq!(site.root, project.path());
    }
}
