//! Denormalized projections of the navigation store.
//!
//! Resolution copies data out of the store, so the returned tree never
//! aliases the snapshot it came from. Titles are localized on the way out.

use super::{EntityKind, IntegrityError, IntegrityKind, LocaleTitles, NavData, NavError, NavItem};
use super::{NavItemData, localized};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A section with its items filled in, in render order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub locale: LocaleTitles,
    pub items: Vec<NavItem>,
}

/// One entry of an expanded group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NavEntry {
    Section(NavSection),
    Group { id: String, entries: Vec<NavEntry> },
}

impl NavEntry {
    pub fn id(&self) -> &str {
        match self {
            NavEntry::Section(section) => &section.id,
            NavEntry::Group { id, .. } => id,
        }
    }
}

impl NavData {
    /// Look up a section and fill in its items, with titles for `locale`.
    pub fn resolve_section(&self, section_id: &str, locale: &str) -> Result<NavSection, NavError> {
        let section = self
            .sections
            .get(section_id)
            .ok_or_else(|| NavError::NotFound {
                kind: EntityKind::Section,
                id: section_id.to_string(),
            })?;

        let items = section
            .items
            .iter()
            .map(|item_id| self.resolve_item(item_id, locale))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NavSection {
            id: section_id.to_string(),
            title: localized(&section.locale, locale, &section.title).to_string(),
            locale: section.locale.clone(),
            items,
        })
    }

    fn resolve_item(&self, item_id: &str, locale: &str) -> Result<NavItem, NavError> {
        let item = self.items.get(item_id).ok_or_else(|| NavError::NotFound {
            kind: EntityKind::Item,
            id: item_id.to_string(),
        })?;
        Ok(NavItem {
            id: item_id.to_string(),
            data: NavItemData {
                title: localized(&item.locale, locale, &item.title).to_string(),
                ..item.clone()
            },
        })
    }

    /// Expand a group into its sections and nested groups.
    ///
    /// Fails with a `GroupCycle` integrity error when a group is reached
    /// again while it is still being expanded, whether or not `validate`
    /// ran first.
    pub fn resolve_group(&self, group_id: &str, locale: &str) -> Result<Vec<NavEntry>, NavError> {
        let mut path = Vec::new();
        self.expand_group(group_id, locale, &mut path)
    }

    fn expand_group<'a>(
        &'a self,
        group_id: &'a str,
        locale: &str,
        path: &mut Vec<&'a str>,
    ) -> Result<Vec<NavEntry>, NavError> {
        if path.contains(&group_id) {
            return Err(NavError::Integrity(IntegrityError {
                kind: IntegrityKind::GroupCycle,
                offending_id: group_id.to_string(),
                referenced_from: path.last().copied().unwrap_or(group_id).to_string(),
            }));
        }
        let group = self.groups.get(group_id).ok_or_else(|| NavError::NotFound {
            kind: EntityKind::Group,
            id: group_id.to_string(),
        })?;

        path.push(group_id);
        let mut entries = Vec::with_capacity(group.items.len());
        for entry in &group.items {
            let is_section = self.sections.contains_key(entry);
            let is_group = self.groups.contains_key(entry);
            let resolved = match (is_section, is_group) {
                (true, true) => return Err(NavError::Ambiguous(entry.clone())),
                (true, false) => NavEntry::Section(self.resolve_section(entry, locale)?),
                (false, true) => NavEntry::Group {
                    id: entry.clone(),
                    entries: self.expand_group(entry, locale, path)?,
                },
                (false, false) => {
                    return Err(NavError::NotFound {
                        kind: EntityKind::Section,
                        id: entry.clone(),
                    });
                }
            };
            entries.push(resolved);
        }
        path.pop();

        Ok(entries)
    }

    /// Groups that no other group contains, in key order.
    pub fn top_level_groups(&self) -> Vec<&str> {
        let nested: HashSet<&str> = self
            .groups
            .values()
            .flat_map(|g| g.items.iter().map(String::as_str))
            .collect();
        self.groups
            .keys()
            .map(String::as_str)
            .filter(|id| !nested.contains(id))
            .collect()
    }
}
