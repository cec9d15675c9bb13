//! Statement segmentation.
//!
//! Splits a raw SQL blob into statements on `;`, ignoring semicolons inside
//! quotes (`'`, `"`, `` ` ``) and comments (`-- ...`, `/* ... */`). A trailing
//! `\G` marks a statement for vertical display. Comment text stays in the
//! statement it appears in; the server discards it.
//!
//! The splitter never fails: unterminated quotes or comments simply run to
//! the end of the input.

/// Marker that requests vertical output, as in the mysql client.
pub const VERTICAL_MARKER: &str = "\\G";

/// One statement to run on every endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementUnit {
    /// Statement text, trimmed, without the `\G` marker.
    pub text: String,
    /// True if the statement ended with `\G`.
    pub vertical: bool,
}

impl StatementUnit {
    /// Creates a statement unit.
    pub fn new(text: impl Into<String>, vertical: bool) -> Self {
        Self {
            text: text.into(),
            vertical,
        }
    }

    /// Returns the statement as the user wrote it, `\G` included.
    pub fn display_text(&self) -> String {
        if self.vertical {
            format!("{}{VERTICAL_MARKER}", self.text)
        } else {
            self.text.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Normal,
    SingleQuote,
    DoubleQuote,
    Backtick,
    LineComment,
    BlockComment,
}

impl LexState {
    fn is_quoted(self) -> bool {
        matches!(self, Self::SingleQuote | Self::DoubleQuote | Self::Backtick)
    }
}

/// Splits `sql` into statements.
pub fn split_statements(sql: &str) -> Vec<StatementUnit> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = LexState::Normal;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        // Backslash escapes are only meaningful inside quotes.
        if state.is_quoted() && c == '\\' {
            current.push(c);
            if let Some(escaped) = chars.next() {
                current.push(escaped);
            }
            continue;
        }

        match state {
            LexState::Normal => match c {
                ';' => {
                    push_statement(&mut statements, &current);
                    current.clear();
                    continue;
                }
                '\'' => state = LexState::SingleQuote,
                '"' => state = LexState::DoubleQuote,
                '`' => state = LexState::Backtick,
                '-' if chars.peek() == Some(&'-') => state = LexState::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    // Consume the '*' so "/*/" doesn't close immediately.
                    current.push(c);
                    if let Some(star) = chars.next() {
                        current.push(star);
                    }
                    state = LexState::BlockComment;
                    continue;
                }
                _ => {}
            },
            LexState::SingleQuote if c == '\'' => state = LexState::Normal,
            LexState::DoubleQuote if c == '"' => state = LexState::Normal,
            LexState::Backtick if c == '`' => state = LexState::Normal,
            LexState::LineComment if c == '\n' || c == '\r' => state = LexState::Normal,
            LexState::BlockComment if c == '*' && chars.peek() == Some(&'/') => {
                current.push(c);
                if let Some(slash) = chars.next() {
                    current.push(slash);
                }
                state = LexState::Normal;
                continue;
            }
            _ => {}
        }

        current.push(c);
    }

    push_statement(&mut statements, &current);
    statements
}

/// Trims a buffered statement, detects `\G`, and keeps it if non-empty.
fn push_statement(statements: &mut Vec<StatementUnit>, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }

    let unit = match trimmed.strip_suffix(VERTICAL_MARKER) {
        Some(rest) => StatementUnit::new(rest.trim_end(), true),
        None => StatementUnit::new(trimmed, false),
    };

    if !unit.text.is_empty() {
        statements.push(unit);
    }
}
