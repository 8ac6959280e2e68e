//! CLI output formatting.
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ## Navigation
//!
//! ```text
//! 001 Basics (2 items)
//!     001 Introduction → /docs/intro
//!     002 Setup → /docs/setup
//! 002 [more]
//!     001 Links (1 item)
//!         001 Repository → https://example.com/yaspp (_blank)
//! ```
//!
//! ## Check
//!
//! ```text
//! Navigation errors
//!     dangling item reference: "ghost" (in "basics")
//! Shared ids
//!     basics: section, group
//! Missing translations
//!     he: item setup
//! ```

use crate::nav::{NavEntry, NavItem, NavSection};
use crate::site::CheckReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn section_header(index: usize, section: &NavSection) -> String {
    let count = section.items.len();
    let noun = if count == 1 { "item" } else { "items" };
    format!("{} {} ({} {})", format_index(index), section.title, count, noun)
}

fn item_line(index: usize, item: &NavItem) -> String {
    match &item.data.target {
        Some(target) => format!(
            "{} {} \u{2192} {} ({})",
            format_index(index),
            item.data.title,
            item.data.url,
            target
        ),
        None => format!(
            "{} {} \u{2192} {}",
            format_index(index),
            item.data.title,
            item.data.url
        ),
    }
}

fn push_section(lines: &mut Vec<String>, index: usize, section: &NavSection, depth: usize) {
    lines.push(format!("{}{}", indent(depth), section_header(index, section)));
    for (i, item) in section.items.iter().enumerate() {
        lines.push(format!("{}{}", indent(depth + 1), item_line(i + 1, item)));
    }
}

fn push_entries(lines: &mut Vec<String>, entries: &[NavEntry], depth: usize) {
    for (i, entry) in entries.iter().enumerate() {
        match entry {
            NavEntry::Section(section) => push_section(lines, i + 1, section, depth),
            NavEntry::Group { id, entries } => {
                lines.push(format!("{}{} [{}]", indent(depth), format_index(i + 1), id));
                push_entries(lines, entries, depth + 1);
            }
        }
    }
}

/// Format a single resolved section.
pub fn format_section(section: &NavSection) -> Vec<String> {
    let mut lines = Vec::new();
    push_section(&mut lines, 1, section, 0);
    lines
}

/// Format an expanded group as an indented tree.
pub fn format_nav_entries(entries: &[NavEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    push_entries(&mut lines, entries, 0);
    lines
}

/// Format navigation check findings. Empty sections are omitted.
pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.integrity.is_empty() {
        lines.push("Navigation errors".to_string());
        for err in &report.integrity {
            lines.push(format!("{}{}", indent(1), err));
        }
    }

    if !report.collisions.is_empty() {
        lines.push("Shared ids".to_string());
        for collision in &report.collisions {
            let kinds: Vec<String> = collision.kinds.iter().map(|k| k.to_string()).collect();
            lines.push(format!("{}{}: {}", indent(1), collision.id, kinds.join(", ")));
        }
    }

    if !report.missing_translations.is_empty() {
        lines.push("Missing translations".to_string());
        for missing in &report.missing_translations {
            lines.push(format!(
                "{}{}: {} {}",
                indent(1),
                missing.lang,
                missing.kind,
                missing.id
            ));
        }
    }

    lines
}

pub fn print_nav_entries(entries: &[NavEntry]) {
    for line in format_nav_entries(entries) {
        println!("{}", line);
    }
}

pub fn print_section(section: &NavSection) {
    for line in format_section(section) {
        println!("{}", line);
    }
}

pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{EntityKind, IdCollision, IntegrityError, IntegrityKind, MissingTranslation};
    use crate::test_helpers::sample_nav;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(123), "123");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn format_group_tree() {
        let entries = sample_nav().resolve_group("main", "en").unwrap();
        assert_eq!(
            format_nav_entries(&entries),
            vec![
                "001 Basics (2 items)",
                "    001 Introduction \u{2192} /docs/intro",
                "    002 Setup \u{2192} /docs/setup",
                "002 [more]",
                "    001 Links (1 item)",
                "        001 Repository \u{2192} https://example.com/yaspp (_blank)",
            ]
        );
    }

    #[test]
    fn format_localized_section() {
        let section = sample_nav().resolve_section("basics", "he").unwrap();
        let lines = format_section(&section);
        assert_eq!(lines[0], "001 יסודות (2 items)");
        assert_eq!(lines[1], "    001 מבוא \u{2192} /docs/intro");
    }

    #[test]
    fn empty_report_has_no_lines() {
        assert!(format_check_report(&CheckReport::default()).is_empty());
    }

    #[test]
    fn format_full_report() {
        let report = CheckReport {
            integrity: vec![IntegrityError {
                kind: IntegrityKind::DanglingItemRef,
                offending_id: "ghost".into(),
                referenced_from: "basics".into(),
            }],
            collisions: vec![IdCollision {
                id: "basics".into(),
                kinds: vec![EntityKind::Section, EntityKind::Group],
            }],
            missing_translations: vec![MissingTranslation {
                kind: EntityKind::Item,
                id: "setup".into(),
                lang: "he".into(),
            }],
        };
        assert_eq!(
            format_check_report(&report),
            vec![
                "Navigation errors",
                "    dangling item reference: \"ghost\" (in \"basics\")",
                "Shared ids",
                "    basics: section, group",
                "Missing translations",
                "    he: item setup",
            ]
        );
    }
}
