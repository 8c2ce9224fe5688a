//! # Formletter
//!
//! Mail merge onto PDF templates.
//!
//! Given a one-page PDF template, a CSV file and a body text with `{field}`
//! placeholders, formletter writes one PDF per CSV row: the template page
//! with the row's text laid over it. The body may carry bold, italic and
//! underline formatting, and the escapes `\n`, `\t` and `\r` written as
//! literal two-character sequences.
//!
//! ## Architecture
//!
//! ```text
//! MergeConfig ──> [merge] ──> per row:
//!   [template]   substitute {field} tags
//!   [text]       escapes, styled runs, word wrap
//!   [render]     place segments, resolve font variants, underline
//!   [pdf]        overlay page ─> stamp onto template ─> write
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod font;
pub mod merge;
pub mod pdf;
pub mod render;
pub mod template;
pub mod text;

pub use config::{BodyTemplate, MergeConfig, OnError, RawSettings, WrapSetting};
pub use error::{MergeError, Result};
pub use merge::{MergeReport, Merger, RowFailure};

/// Run a merge described by `config`.
///
/// Errors are fatal problems that stopped the run; per-row failures are in
/// the returned report.
pub fn merge(config: &MergeConfig) -> Result<MergeReport> {
    Merger::new(config)?.run()
}
