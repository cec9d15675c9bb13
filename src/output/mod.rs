//! Result presentation for sqlfan.
//!
//! Writes outcomes to any `io::Write` in one of three layouts, mimicking the
//! mysql client. Each endpoint's label gets its own color; colors can be
//! switched off entirely.

mod table;

pub use table::{bordered_lines, tab_separated_lines, vertical_lines};

use std::io::Write;
use std::time::Duration;

use crossterm::style::{Color, Stylize};

use crate::config::Verbosity;
use crate::error::Result;
use crate::query::{EndpointReport, ExecutionOutcome};

/// Colors assigned to endpoints, cycling by position.
pub const ENDPOINT_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Red,
];

/// Separator printed after every outcome.
const OUTCOME_SEPARATOR: &str = "---";

/// Width of the dashed line printed before results at verbosity 1 and up.
const STATEMENT_SEPARATOR_WIDTH: usize = 14;

/// How a result set is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Bold tab-separated header, tab-separated rows.
    Plain,
    /// One block per row, as with `\G`.
    Vertical,
    /// Bordered table.
    Bordered,
}

impl RenderMode {
    /// Selects the layout for a run.
    pub fn for_run(table: bool) -> Self {
        if table {
            Self::Bordered
        } else {
            Self::Plain
        }
    }

    /// Layout for one outcome: statements ending in `\G` always go vertical.
    pub fn for_outcome(self, outcome: &ExecutionOutcome) -> Self {
        if outcome.vertical {
            Self::Vertical
        } else {
            self
        }
    }
}

/// Terminal styling, or none of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Color of the endpoint at `index`.
    pub fn endpoint_color(index: usize) -> Color {
        ENDPOINT_COLORS[index % ENDPOINT_COLORS.len()]
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.enabled {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Writes run output.
pub struct Presenter<W: Write> {
    out: W,
    mode: RenderMode,
    palette: Palette,
    verbosity: Verbosity,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W, mode: RenderMode, palette: Palette, verbosity: Verbosity) -> Self {
        Self {
            out,
            mode,
            palette,
            verbosity,
        }
    }

    /// Writes the run banner.
    pub fn begin(&mut self, endpoints: usize, concurrent: bool) -> Result<()> {
        writeln!(
            self.out,
            "Executing statements on {endpoints} instance(s) (concurrent: {concurrent})..."
        )?;
        Ok(())
    }

    /// Writes every outcome of one endpoint.
    pub fn report(&mut self, report: &EndpointReport) -> Result<()> {
        for outcome in &report.outcomes {
            self.outcome(report.index, outcome)?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Writes one outcome of the endpoint at `index`, followed by `---`.
    pub fn outcome(&mut self, index: usize, outcome: &ExecutionOutcome) -> Result<()> {
        let label = self.palette.paint(
            &format!("[{}]", outcome.endpoint.masked()),
            Palette::endpoint_color(index),
        );

        match &outcome.error {
            Some(error) => {
                let tag = self.palette.paint("ERROR", Color::Red);
                writeln!(self.out, "{label} {tag} {}: {error}", outcome.statement)?;
            }
            None => self.result(&label, outcome)?,
        }

        writeln!(self.out, "{OUTCOME_SEPARATOR}")?;
        Ok(())
    }

    /// Writes the closing line and flushes.
    pub fn finish(&mut self) -> Result<()> {
        writeln!(self.out, "All executions complete.")?;
        self.out.flush()?;
        Ok(())
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn result(&mut self, label: &str, outcome: &ExecutionOutcome) -> Result<()> {
        if self.verbosity.shows_separators() {
            writeln!(self.out, "{}", "-".repeat(STATEMENT_SEPARATOR_WIDTH))?;
        }

        writeln!(self.out, "{label} {}", outcome.statement)?;

        if self.verbosity.captures_timing() {
            writeln!(self.out, "Query time: {:?}", duration_of(outcome))?;
        }

        match self.mode.for_outcome(outcome) {
            RenderMode::Vertical => {
                if outcome.rows.is_empty() {
                    writeln!(self.out, "Empty set.")?;
                } else {
                    self.lines(vertical_lines(&outcome.columns, &outcome.rows))?;
                }
            }
            RenderMode::Bordered => {
                if outcome.columns.is_empty() {
                    return self.no_columns(outcome);
                }
                if outcome.rows.is_empty() {
                    writeln!(self.out, "Empty set.")?;
                } else {
                    self.lines(bordered_lines(&outcome.columns, &outcome.rows))?;
                }
            }
            RenderMode::Plain => {
                if outcome.columns.is_empty() {
                    return self.no_columns(outcome);
                }
                let header = self.palette.bold(&outcome.columns.join("\t"));
                writeln!(self.out, "{header}")?;
                if outcome.rows.is_empty() {
                    writeln!(self.out, "Empty set.")?;
                } else {
                    self.lines(tab_separated_lines(&outcome.rows))?;
                }
            }
        }

        self.row_count_footer(outcome)
    }

    fn no_columns(&mut self, outcome: &ExecutionOutcome) -> Result<()> {
        writeln!(
            self.out,
            "Statement executed successfully, no columns returned."
        )?;
        if self.verbosity.captures_row_count() {
            if self.verbosity.captures_timing() {
                writeln!(self.out, "Query OK ({:?})", duration_of(outcome))?;
            } else {
                writeln!(self.out, "Query OK")?;
            }
        }
        Ok(())
    }

    fn row_count_footer(&mut self, outcome: &ExecutionOutcome) -> Result<()> {
        if !self.verbosity.captures_row_count() {
            return Ok(());
        }

        let rows = outcome.row_count.unwrap_or(outcome.rows.len());
        if self.verbosity.captures_timing() {
            writeln!(
                self.out,
                "({rows} rows in set ({:?}))",
                duration_of(outcome)
            )?;
        } else {
            writeln!(self.out, "({rows} rows in set)")?;
        }
        Ok(())
    }

    fn lines(&mut self, lines: Vec<String>) -> Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }
}

fn duration_of(outcome: &ExecutionOutcome) -> Duration {
    outcome.duration.unwrap_or_default()
}
