//! Integrity checks over a [`NavData`] snapshot.
//!
//! [`NavData::check`] walks the store in key order and reports every broken
//! reference and every group cycle, so the same source always produces the
//! same report. [`NavData::validate`] is the fail-fast form.

use super::{EntityKind, NavData};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityKind {
    /// A section lists an id that is not in `items`.
    DanglingItemRef,
    /// A group lists an id that is neither in `sections` nor in `groups`.
    DanglingSectionOrGroupRef,
    /// A group contains itself, directly or through other groups.
    GroupCycle,
}

impl fmt::Display for IntegrityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntegrityKind::DanglingItemRef => "dangling item reference",
            IntegrityKind::DanglingSectionOrGroupRef => "dangling section or group reference",
            IntegrityKind::GroupCycle => "group cycle",
        })
    }
}

/// A navigation invariant violation.
///
/// `offending_id` is the id the author has to fix; `referenced_from` is the
/// section or group whose `items` list holds the bad reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: \"{offending_id}\" (in \"{referenced_from}\")")]
pub struct IntegrityError {
    pub kind: IntegrityKind,
    pub offending_id: String,
    pub referenced_from: String,
}

/// The same id used as a key in more than one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCollision {
    pub id: String,
    pub kinds: Vec<EntityKind>,
}

/// An item or section without a title for a configured language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTranslation {
    pub kind: EntityKind,
    pub id: String,
    pub lang: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl NavData {
    /// Check invariants and stop at the first violation.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        match self.check().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Collect every invariant violation: dangling section entries first,
    /// then dangling group entries, then cycles.
    pub fn check(&self) -> Vec<IntegrityError> {
        let mut errors = Vec::new();

        for (section_id, section) in &self.sections {
            for item_id in &section.items {
                if !self.items.contains_key(item_id) {
                    errors.push(IntegrityError {
                        kind: IntegrityKind::DanglingItemRef,
                        offending_id: item_id.clone(),
                        referenced_from: section_id.clone(),
                    });
                }
            }
        }

        for (group_id, group) in &self.groups {
            for entry in &group.items {
                if !self.sections.contains_key(entry) && !self.groups.contains_key(entry) {
                    errors.push(IntegrityError {
                        kind: IntegrityKind::DanglingSectionOrGroupRef,
                        offending_id: entry.clone(),
                        referenced_from: group_id.clone(),
                    });
                }
            }
        }

        let mut marks = HashMap::new();
        for group_id in self.groups.keys() {
            self.find_cycles(group_id, &mut marks, &mut errors);
        }

        errors
    }

    /// Depth-first walk over group → group edges. A back edge to a group
    /// still on the stack closes a cycle.
    fn find_cycles<'a>(
        &'a self,
        group_id: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        errors: &mut Vec<IntegrityError>,
    ) {
        if marks.contains_key(group_id) {
            return;
        }
        marks.insert(group_id, Mark::Visiting);

        if let Some(group) = self.groups.get(group_id) {
            for entry in &group.items {
                if !self.groups.contains_key(entry) {
                    continue;
                }
                match marks.get(entry.as_str()) {
                    Some(Mark::Visiting) => errors.push(IntegrityError {
                        kind: IntegrityKind::GroupCycle,
                        offending_id: entry.clone(),
                        referenced_from: group_id.to_string(),
                    }),
                    Some(Mark::Done) => {}
                    None => self.find_cycles(entry, marks, errors),
                }
            }
        }

        marks.insert(group_id, Mark::Done);
    }

    /// Ids that are keys in more than one of the three maps.
    pub fn id_collisions(&self) -> Vec<IdCollision> {
        let mut kinds: HashMap<&str, Vec<EntityKind>> = HashMap::new();
        let keyed = self
            .items
            .keys()
            .map(|id| (id, EntityKind::Item))
            .chain(self.sections.keys().map(|id| (id, EntityKind::Section)))
            .chain(self.groups.keys().map(|id| (id, EntityKind::Group)));
        for (id, kind) in keyed {
            kinds.entry(id.as_str()).or_default().push(kind);
        }

        let mut collisions: Vec<IdCollision> = kinds
            .into_iter()
            .filter(|(_, kinds)| kinds.len() > 1)
            .map(|(id, kinds)| IdCollision {
                id: id.to_string(),
                kinds,
            })
            .collect();
        collisions.sort_by(|a, b| a.id.cmp(&b.id));
        collisions
    }

    /// Items and sections lacking a title for any of `langs` other than the
    /// default locale, which always falls back to the base title.
    pub fn missing_translations(
        &self,
        langs: &[String],
        default_locale: &str,
    ) -> Vec<MissingTranslation> {
        let secondary: Vec<&String> = langs.iter().filter(|l| *l != default_locale).collect();
        let mut missing = Vec::new();

        let sections = self
            .sections
            .iter()
            .map(|(id, s)| (EntityKind::Section, id, &s.locale));
        let items = self
            .items
            .iter()
            .map(|(id, i)| (EntityKind::Item, id, &i.locale));

        for (kind, id, locale) in sections.chain(items) {
            for lang in &secondary {
                if !locale.contains_key(*lang) {
                    missing.push(MissingTranslation {
                        kind,
                        id: id.clone(),
                        lang: (*lang).clone(),
                    });
                }
            }
        }
        missing
    }
}
