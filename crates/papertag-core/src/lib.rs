// Public fallible APIs in this crate share one concrete error contract (`PapertagError`).
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod catalog;
pub mod client;
pub(crate) mod config;
pub mod cooccurrence;
pub mod error;
pub mod fs;
pub mod groups;
pub(crate) mod jsonl;
pub mod models;
pub mod normalize;
pub(crate) mod text;
pub mod vocabulary;

pub use catalog::DraftFormat;
pub use client::{InitializeReport, Papertag};
pub use config::PapertagConfig;
pub use error::{PapertagError, Result};
pub use groups::GroupUpsert;
pub use normalize::{NormalizationPolicy, TagNormalizer};
