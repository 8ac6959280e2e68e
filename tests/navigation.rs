//! End-to-end navigation loading against the projects under `fixtures/`.

use pretty_assertions::assert_eq;
use std::path::PathBuf;
use yaspp::config::PathList;
use yaspp::nav::{EntityKind, IntegrityError, IntegrityKind, NavEntry, NavError};
use yaspp::output;
use yaspp::site::Site;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn integrity(kind: IntegrityKind, offending_id: &str, referenced_from: &str) -> IntegrityError {
    IntegrityError {
        kind,
        offending_id: offending_id.into(),
        referenced_from: referenced_from.into(),
    }
}

#[test]
fn fixture_site_loads() {
    let site = Site::load(&fixture("site")).unwrap();

    assert_eq!(site.config.locale.default_locale, "en");
    assert_eq!(
        site.config.locale.secondary_langs().collect::<Vec<_>>(),
        vec!["he"]
    );
    let style = site.config.style.as_ref().unwrap();
    assert_eq!(style.sheet_paths(), vec!["site.scss", "print.scss"]);
    assert_eq!(
        style.class_bindings,
        Some(PathList::One("bindings.json".into()))
    );
    assert_eq!(site.nav.items.len(), 3);
}

#[test]
fn fixture_site_is_clean() {
    let report = Site::load(&fixture("site")).unwrap().check();
    assert!(report.is_valid());
    assert!(report.collisions.is_empty());
    assert!(report.missing_translations.is_empty());
    assert!(output::format_check_report(&report).is_empty());
}

#[test]
fn shared_item_resolves_in_both_sections() {
    let site = Site::load(&fixture("site")).unwrap();

    let basics = site.nav.resolve_section("basics", "en").unwrap();
    let links = site.nav.resolve_section("links", "en").unwrap();
    let intro_in_basics = basics.items.iter().find(|i| i.id == "intro").unwrap();
    let intro_in_links = links.items.iter().find(|i| i.id == "intro").unwrap();
    assert_eq!(intro_in_basics, intro_in_links);
}

#[test]
fn main_group_in_hebrew() {
    let site = Site::load(&fixture("site")).unwrap();
    let entries = site.nav.resolve_group("main", "he").unwrap();

    assert_eq!(
        entries.iter().map(NavEntry::id).collect::<Vec<_>>(),
        vec!["basics", "more"]
    );
    assert_eq!(
        output::format_nav_entries(&entries),
        vec![
            "001 יסודות (2 items)",
            "    001 מבוא \u{2192} /docs/intro",
            "    002 התקנה \u{2192} /docs/setup",
            "002 [more]",
            "    001 קישורים (2 items)",
            "        001 מאגר \u{2192} https://example.com/yaspp (_blank)",
            "        002 מבוא \u{2192} /docs/intro",
        ]
    );
}

#[test]
fn unknown_language_falls_back_to_base_titles() {
    let site = Site::load(&fixture("site")).unwrap();
    let section = site.nav.resolve_section("basics", "de").unwrap();
    assert_eq!(section.title, "Basics");
    assert_eq!(section.items[1].data.title, "Setup");
}

#[test]
fn only_main_is_top_level() {
    let site = Site::load(&fixture("site")).unwrap();
    assert_eq!(site.nav.top_level_groups(), vec!["main"]);
}

#[test]
fn broken_project_reports_every_problem() {
    let site = Site::load(&fixture("broken")).unwrap();
    let report = site.check();

    assert_eq!(
        report.integrity,
        vec![
            integrity(IntegrityKind::DanglingItemRef, "ghost", "top"),
            integrity(IntegrityKind::DanglingSectionOrGroupRef, "nowhere", "main"),
            integrity(IntegrityKind::GroupCycle, "loop", "main"),
        ]
    );
    assert_eq!(
        report
            .missing_translations
            .iter()
            .map(|m| (m.kind, m.id.as_str(), m.lang.as_str()))
            .collect::<Vec<_>>(),
        vec![
            (EntityKind::Section, "top", "fr"),
            (EntityKind::Item, "home", "fr"),
        ]
    );
}

#[test]
fn broken_project_validate_stops_at_first() {
    let site = Site::load(&fixture("broken")).unwrap();
    assert_eq!(
        site.nav.validate(),
        Err(integrity(IntegrityKind::DanglingItemRef, "ghost", "top"))
    );
}

#[test]
fn broken_project_resolution_errors() {
    let site = Site::load(&fixture("broken")).unwrap();

    assert!(matches!(
        site.nav.resolve_section("top", "en"),
        Err(NavError::NotFound { kind: EntityKind::Item, ref id }) if id == "ghost"
    ));
    // The dangling item inside "top" surfaces before the cycle is reached.
    assert!(matches!(
        site.nav.resolve_group("main", "en"),
        Err(NavError::NotFound { kind: EntityKind::Item, .. })
    ));
    assert!(site.nav.top_level_groups().is_empty());
}

#[test]
fn legacy_style_index_still_applies() {
    let site = Site::load(&fixture("broken")).unwrap();
    let style = site.config.style.as_ref().unwrap();
    assert_eq!(style.sheet_paths(), vec!["legacy.css"]);
}
