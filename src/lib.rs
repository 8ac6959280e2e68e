//! # yaspp
//!
//! The configuration and navigation core of a static site generator, plus the
//! runner the build uses to shell out to external tools.
//!
//! # Architecture
//!
//! ```text
//! yaspp.config.json ──► config ──► site ──► nav file ──► nav (NavData)
//!                                                          │
//!                                 page renderer ◄── resolve_section / resolve_group
//!
//! build step ──► ProcessOptions ──► exec::ProcessRunner ──► ProcessOutput
//! ```
//!
//! The navigation model and the process runner do not depend on each other.
//! Rendering, content copying and content discovery live outside this crate
//! and consume these types.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `yaspp.config.json` schema, layered loading, validation |
//! | [`site`] | Loads a project's config and the navigation file it names |
//! | [`nav`] | Normalized navigation store, integrity checks, localized projections |
//! | [`exec`] | External command runner with dry-run, quiet, streaming and progress |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Normalized Navigation
//!
//! Items, sections and groups are stored in three id-keyed maps and only
//! joined on demand. An item shared by several menus is defined once, and a
//! broken reference is a checkable property of the data rather than a
//! rendering surprise. Resolution is strictly typed by reference site: a
//! section's entries are always items, a group's entries are always sections
//! or groups.
//!
//! ## One Result Shape for Commands
//!
//! [`exec::ProcessRunner::run`] never returns an error. Commands that could
//! not start, timed out, or exited non-zero all come back as a
//! [`exec::ProcessOutput`] with a non-zero `status`, so a build step inspects
//! one value whatever happened.
//!
//! ## Injected Console and Executor
//!
//! The runner writes through a [`exec::Console`] and spawns through a
//! [`exec::CommandExecutor`]. Production uses stdout and `std::process`;
//! tests swap in recorders and scripted fakes.

pub mod config;
pub mod exec;
pub mod nav;
pub mod output;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;
