//! # errkb
//!
//! A local knowledge base for build errors.
//!
//! Given an error code, errkb looks for a prior diagnosis in a Markdown
//! document, consults a table of known fix patterns, asks an external
//! search service for related pages, and records the error in the document
//! the first time it is seen.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!   code ───────▶ │ Investigator │ ──────▶ InvestigationResult
//!                 └──┬────┬────┬─┘
//!          find/append│    │    │ search (failures → no results)
//!                     ▼    │    ▼
//!          ┌──────────────┐│ ┌────────────────┐
//!          │KnowledgeStore││ │ ExternalSearch │
//!          │  (Markdown)  ││ │ http / command │
//!          └──────────────┘▼ └────────────────┘
//!                 ┌─────────────────┐
//!                 │ FixPatternTable │
//!                 └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`format`] | Record template and header recognition |
//! | [`store`] | Append-only knowledge base document |
//! | [`lock`] | Scoped lock file around find-then-append |
//! | [`patterns`] | Static fix-pattern table |
//! | [`search`] | External search providers |
//! | [`investigate`] | One end-to-end inquiry |
//! | [`report`] | Text and JSON output |

pub mod config;
pub mod format;
pub mod investigate;
pub mod lock;
pub mod models;
pub mod patterns;
pub mod report;
pub mod search;
pub mod store;
