//! # Merge Driver
//!
//! Runs a merge: one output PDF per data row.
//!
//! ```text
//! validate ─> open template ─> for each row:
//!     filename ─> substitute ─> escape ─> wrap ─> render ─> stamp ─> write
//! ```
//!
//! Missing inputs, an unusable template, an unreadable data source or an
//! output directory that cannot be created stop the run before any row is
//! written. A row that fails (unknown filename tag, write error) is recorded
//! and, under [`OnError::Continue`], the run goes on with the next row.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{MergeConfig, OnError, WrapSetting};
use crate::data::{CsvSource, Row};
use crate::error::{MergeError, Result};
use crate::font::FontContext;
use crate::pdf::canvas::OverlayPage;
use crate::pdf::compose::write_atomic;
use crate::pdf::{PageCanvas, PdfWriter, TemplateDocument};
use crate::render::{Cursor, SegmentRenderer};
use crate::template::{self, TagMode};
use crate::text::runs::StyledText;
use crate::text::wrap::{wrap_runs, wrap_text, WidthPolicy, WrappedLine};
use crate::text::escape;

/// A row that produced no output, and why.
#[derive(Debug)]
pub struct RowFailure {
    /// 1-based data row number.
    pub row: usize,
    pub label: String,
    pub error: MergeError,
}

/// Outcome of a merge run.
#[derive(Debug, Default)]
pub struct MergeReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<RowFailure>,
    /// The run stopped at the first failure.
    pub aborted: bool,
}

impl MergeReport {
    /// Rows attempted, successful or not.
    pub fn rows(&self) -> usize {
        self.written.len() + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The single message shown to the user at the end of a run.
    pub fn summary(&self) -> String {
        if self.is_success() {
            return format!(
                "PDFs generated successfully! {} file{} written.",
                self.written.len(),
                plural(self.written.len())
            );
        }

        let mut out = format!(
            "{} of {} PDFs generated. {} row{} failed:",
            self.written.len(),
            self.rows(),
            self.failures.len(),
            plural(self.failures.len())
        );
        for failure in &self.failures {
            out.push_str(&format!("\n  {}: {}", failure.label, failure.error));
        }
        if self.aborted {
            out.push_str("\nStopped at the first failed row.");
        }
        out
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Wrapped body lines for one row.
///
/// Only a plain body wrapped by character count is `Raw` and keeps its
/// leading whitespace. Every other body is `Styled`, where whitespace only
/// separates words, so `\t` indentation is not drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// Plain text wrapped by character count, drawn verbatim.
    Raw(Vec<String>),
    /// Styled words, drawn word by word.
    Styled(Vec<WrappedLine>),
}

impl Layout {
    pub fn line_count(&self) -> usize {
        match self {
            Layout::Raw(lines) => lines.len(),
            Layout::Styled(lines) => lines.len(),
        }
    }
}

/// A merge run bound to a loaded template.
pub struct Merger<'a> {
    config: &'a MergeConfig,
    template: TemplateDocument,
    fonts: FontContext,
    body: StyledText,
}

impl<'a> Merger<'a> {
    /// Validate `config` and load its template.
    pub fn new(config: &'a MergeConfig) -> Result<Self> {
        config.validate()?;
        let template = TemplateDocument::open(&config.template)?;
        Ok(Self::with_template(config, template))
    }

    pub fn with_template(config: &'a MergeConfig, template: TemplateDocument) -> Self {
        Self {
            config,
            template,
            fonts: FontContext::new(config.font, f64::from(config.font_size)),
            body: config.body.rich_text().to_styled(),
        }
    }

    /// Where the first baseline of the body starts.
    pub fn origin(&self) -> Cursor {
        let size = self.template.page_size();
        Cursor::at_percent(size.width, size.height, self.config.x, self.config.y)
    }

    /// Substitute, expand escapes and wrap the body for `row`.
    ///
    /// A plain body with `WrapSetting::Chars` gives `Layout::Raw`; styled
    /// bodies and `WrapSetting::PageFraction` give `Layout::Styled`.
    pub fn layout(&self, row: &Row) -> Layout {
        let substituted = template::substitute_styled(&self.body, row);

        match self.config.wrap {
            WrapSetting::Chars(max_chars) if !self.config.body.is_styled() => {
                let text = escape::process(&substituted.text());
                Layout::Raw(wrap_text(&text, max_chars))
            }
            wrap => {
                let policy = match wrap {
                    WrapSetting::Chars(max_chars) => WidthPolicy::Chars(max_chars),
                    WrapSetting::PageFraction(fraction) => {
                        let page_width = self.template.page_size().width;
                        WidthPolicy::Measured(fraction * page_width - self.origin().x)
                    }
                };
                let runs = escape::process_styled(&substituted).runs();
                Layout::Styled(wrap_runs(&runs, policy, &self.fonts))
            }
        }
    }

    /// Draw a laid-out body onto a fresh overlay page.
    pub fn overlay(&self, layout: &Layout) -> OverlayPage {
        let mut canvas = PageCanvas::new(self.template.page_size());
        let renderer = SegmentRenderer::new(&self.fonts);
        let start = self.origin();
        match layout {
            Layout::Raw(lines) => renderer.render_raw_lines(&mut canvas, lines, start),
            Layout::Styled(lines) => renderer.render_lines(&mut canvas, lines, start),
        };
        canvas.finish()
    }

    /// Produce the finished PDF for `row`.
    pub fn render_row(&self, row: &Row) -> Result<Vec<u8>> {
        let layout = self.layout(row);
        log::debug!("{}: {} wrapped line(s)", row.label(), layout.line_count());
        let overlay = PdfWriter::new().write(&self.overlay(&layout));
        self.template.stamp(&overlay)
    }

    /// Render `row` and write it into `out_dir`. Returns the written path.
    pub fn process_row(&self, row: &Row, out_dir: &Path) -> Result<PathBuf> {
        let filename = template::resolve_filename(&self.config.filename, row)?;
        let path = out_dir.join(&filename);
        log::debug!("{} -> {}", row.label(), path.display());
        let bytes = self.render_row(row)?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Process every row of the data source.
    pub fn run(&self) -> Result<MergeReport> {
        let out_dir = &self.config.output_dir;
        fs::create_dir_all(out_dir).map_err(|source| MergeError::IoWrite {
            path: out_dir.clone(),
            source,
        })?;
        let source = CsvSource::open(&self.config.data)?;

        log::info!(
            "Merging {} onto {} (tags: {})",
            self.config.data.display(),
            self.config.template.display(),
            source.headers().join(", ")
        );
        let unknown: Vec<String> = template::tags(&self.config.filename)
            .into_iter()
            .filter(|tag| !source.headers().contains(tag))
            .collect();
        if !unknown.is_empty() {
            log::warn!(
                "Filename template uses unknown tag(s) {}; every row will fail",
                unknown.join(", ")
            );
        }

        let mut report = MergeReport::default();
        for row in source {
            let row = match row {
                Ok(row) => row,
                Err(MergeError::Csv(source)) => {
                    log::error!(
                        "Data source failed after {} document(s) were written",
                        report.written.len()
                    );
                    return Err(MergeError::DataInterrupted {
                        written: report.written,
                        source,
                    });
                }
                Err(error) => return Err(error),
            };
            match self.process_row(&row, out_dir) {
                Ok(path) => report.written.push(path),
                Err(error) if error.is_row_scoped() => {
                    log::warn!("Skipping {}: {}", row.label(), error);
                    report.failures.push(RowFailure {
                        row: row.index(),
                        label: row.label(),
                        error,
                    });
                    if self.config.on_error == OnError::Abort {
                        report.aborted = true;
                        break;
                    }
                }
                Err(error) => return Err(error),
            }
        }

        log::info!(
            "Wrote {} of {} document(s) to {}",
            report.written.len(),
            report.rows(),
            out_dir.display()
        );
        Ok(report)
    }
}

/// Body text substituted for `row` with unknown tags left in place.
pub fn preview(config: &MergeConfig, row: &Row) -> Result<String> {
    template::substitute(&config.body.rich_text().text, row, TagMode::Lenient)
}
