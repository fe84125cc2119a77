//! # Tagdb Architecture
//!
//! Tagdb is a **UI-agnostic record-store library**. This is not a CLI application
//! that happens to have some library code; it's a library that happens to have a
//! CLI client.
//!
//! Each database is a single JSON document holding a list of free-text entries,
//! every entry carrying an ordered tag set and an ordered key/value attribute
//! map. A flat-file registry maps short database names to file locations so the
//! CLI can address databases without full paths.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (args.rs, wired by main.rs)                      │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine Layer (store.rs, model.rs, format.rs, registry.rs)  │
//! │  - Session open/close, entry CRUD, queries, rendering       │
//! │  - Operates on Rust types, returns Result<T, TagdbError>    │
//! │  - No I/O assumptions beyond the database file itself       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From the library inward, code:
//! - Takes regular Rust function arguments
//! - Returns regular Rust types (`Result<T>`)
//! - **Never** writes to stdout/stderr
//! - **Never** calls `std::process::exit`
//!
//! Advisory conditions (version skew, best-effort backup failures) are
//! collected as warnings on the [`store::Session`]; the caller decides whether
//! and how to surface them.
//!
//! ## Module Overview
//!
//! - [`model`]: Core data types (`Document`, `Entry`, `AttrValue`) and the
//!   mutation/query operations on an open document
//! - [`store`]: Database files on disk: create, open (with backups), save
//! - [`format`]: The `%id`/`%data`/`%tags`/`%attrs` template mini-language
//! - [`registry`]: The flat-file name → path registry
//! - [`config`]: Home directory resolution and environment switches
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod registry;
pub mod store;
