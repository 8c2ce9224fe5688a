//! # Text Processing
//!
//! Everything between a raw body template and drawable lines:
//!
//! ```text
//! RichText ──[template]──> StyledText ──[escape]──> StyledText
//!     ──[runs]──> Vec<StyledRun> ──[wrap]──> Vec<WrappedLine>
//! ```

pub mod escape;
pub mod runs;
pub mod wrap;

pub use runs::{RichText, Style, StyleKind, StyleSpan, StyledRun, StyledText};
pub use wrap::{wrap_runs, wrap_text, Measure, WidthPolicy, Word, WrappedLine};
