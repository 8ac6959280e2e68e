//! Navigation model.
//!
//! The navigation source file describes a site's menus as three id-indexed
//! maps. Items are the leaves (links), sections are ordered lists of items,
//! and groups are ordered lists of sections or other groups:
//!
//! ```json
//! {
//!   "items": {
//!     "intro": { "type": "page", "title": "Intro", "url": "/intro", "locale": { "he": "מבוא" } }
//!   },
//!   "sections": {
//!     "basics": { "title": "Basics", "locale": {}, "items": ["intro"] }
//!   },
//!   "groups": {
//!     "main": { "items": ["basics"] }
//!   }
//! }
//! ```
//!
//! A [`NavData`] is loaded once per build and never patched afterwards; a
//! rebuild loads a fresh one. Everything in [`resolve`] and [`validate`] is a
//! read-only projection over that snapshot.
//!
//! ## Locale Fallback
//!
//! Every item and section carries a `locale` map of language → title. When a
//! language has no entry, the base `title` is used.

pub mod resolve;
pub mod validate;

pub use resolve::{NavEntry, NavSection};
pub use validate::{IdCollision, IntegrityError, IntegrityKind, MissingTranslation};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Language code → localized title.
pub type LocaleTitles = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Navigation parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    #[error("Group entry \"{0}\" names both a section and a group")]
    Ambiguous(String),
    #[error("Conflicting definitions for \"{0}\"")]
    DuplicateId(String),
}

/// Which of the three maps an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityKind {
    Item,
    Section,
    Group,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Item => "item",
            EntityKind::Section => "section",
            EntityKind::Group => "group",
        })
    }
}

/// A navigation link as stored in the normalized map (the id is the key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavItemData {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub locale: LocaleTitles,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// A section as stored in the normalized map: item ids in render order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavSectionData {
    pub title: String,
    #[serde(default)]
    pub locale: LocaleTitles,
    #[serde(default)]
    pub items: Vec<String>,
}

/// A group: ids of sections or other groups, in render order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavGroup {
    #[serde(default)]
    pub items: Vec<String>,
}

/// A fully-populated navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub id: String,
    #[serde(flatten)]
    pub data: NavItemData,
}

/// Normalized navigation store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavData {
    #[serde(default)]
    pub items: BTreeMap<String, NavItemData>,
    #[serde(default)]
    pub sections: BTreeMap<String, NavSectionData>,
    #[serde(default)]
    pub groups: BTreeMap<String, NavGroup>,
}

/// Pick the title for `lang`, falling back to `base`.
pub fn localized<'a>(locale: &'a LocaleTitles, lang: &str, base: &'a str) -> &'a str {
    locale.get(lang).map(String::as_str).unwrap_or(base)
}

impl NavData {
    pub fn from_json(source: &str) -> Result<Self, NavError> {
        serde_json::from_str(source).map_err(|e| NavError::Parse(e.to_string()))
    }

    pub fn from_toml(source: &str) -> Result<Self, NavError> {
        toml::from_str(source).map_err(|e| NavError::Parse(e.to_string()))
    }

    /// Build a normalized store from denormalized sections.
    ///
    /// An item referenced from several sections is stored once. Two
    /// different definitions under the same id are a conflict.
    pub fn normalize(
        sections: &[NavSection],
        groups: BTreeMap<String, NavGroup>,
    ) -> Result<Self, NavError> {
        let mut data = NavData {
            groups,
            ..Default::default()
        };
        for section in sections {
            for item in &section.items {
                match data.items.get(&item.id) {
                    Some(existing) if *existing != item.data => {
                        return Err(NavError::DuplicateId(item.id.clone()));
                    }
                    Some(_) => {}
                    None => {
                        data.items.insert(item.id.clone(), item.data.clone());
                    }
                }
            }
            let stored = NavSectionData {
                title: section.title.clone(),
                locale: section.locale.clone(),
                items: section.items.iter().map(|item| item.id.clone()).collect(),
            };
            match data.sections.get(&section.id) {
                Some(existing) if *existing != stored => {
                    return Err(NavError::DuplicateId(section.id.clone()));
                }
                Some(_) => {}
                None => {
                    data.sections.insert(section.id.clone(), stored);
                }
            }
        }
        Ok(data)
    }

    pub fn item(&self, id: &str) -> Option<NavItem> {
        self.items.get(id).map(|data| NavItem {
            id: id.to_string(),
            data: data.clone(),
        })
    }
}

/// Parse a navigation source, picking the format from the file extension.
pub fn load(source: &str, path: &Path) -> Result<NavData, NavError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => NavData::from_toml(source),
        Some("json") | None => NavData::from_json(source),
        Some(other) => Err(NavError::Parse(format!(
            "unsupported navigation format \".{other}\" ({})",
            path.display()
        ))),
    }
}

/// Read and parse the navigation source file.
pub fn load_nav(path: &Path) -> Result<NavData, NavError> {
    let source = fs::read_to_string(path)?;
    let data = load(&source, path)?;
    debug!(
        path = %path.display(),
        items = data.items.len(),
        sections = data.sections.len(),
        groups = data.groups.len(),
        "loaded navigation"
    );
    Ok(data)
}
