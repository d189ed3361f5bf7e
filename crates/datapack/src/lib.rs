//! Data pack ingestion.
//!
//! A data pack is a directory tree `data/<namespace>/<category>/**/*.json`.
//! [`DataPack::scan`] lazily walks one category; [`OverrideTable::build`]
//! collects the documents of several categories keyed by the identifier
//! derived from each file's relative path.

#![warn(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::str_to_string,
    clippy::implicit_clone,
    clippy::manual_let_else,
    clippy::redundant_closure_for_method_calls
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod scanner;
pub mod table;

pub use error::{DataPackError, MissingCategory, Result};
pub use scanner::{derive_identifier, CategoryScan, DataPack, ScannedDocument, DEFAULT_NAMESPACE};
pub use table::{CategoryFailure, CategoryMapping, OverrideTable};
