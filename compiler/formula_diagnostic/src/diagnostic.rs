//! Core diagnostic types.
//!
//! Defines [`Diagnostic`], [`Label`] and [`Severity`], which every checking
//! stage uses to report problems.

use std::fmt;
use std::fmt::Write as _;

use formula_ir::{Location, StringInterner};

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A labeled location with a message.
///
/// Locations carry their file, so a label may point at a definition in an
/// imported module.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub location: Location,
    pub message: String,
    /// Whether this is the main error location.
    pub is_primary: bool,
}

impl Label {
    pub fn primary(location: Location, message: impl Into<String>) -> Self {
        Label {
            location,
            message: message.into(),
            is_primary: true,
        }
    }

    pub fn secondary(location: Location, message: impl Into<String>) -> Self {
        Label {
            location,
            message: message.into(),
            is_primary: false,
        }
    }
}

/// A diagnostic with everything a renderer needs.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    #[cold]
    pub fn error(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Error)
    }

    /// Create a new warning diagnostic.
    #[cold]
    pub fn warning(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Warning)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a primary label.
    pub fn with_label(mut self, location: Location, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(location, message));
        self
    }

    /// Add a secondary label for context.
    pub fn with_secondary_label(mut self, location: Location, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(location, message));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Location of the first primary label.
    pub fn primary_location(&self) -> Option<Location> {
        self.labels
            .iter()
            .find(|l| l.is_primary)
            .map(|l| l.location)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Plain text form with file paths looked up in `interner`.
    pub fn render(&self, interner: &StringInterner) -> String {
        let mut out = format!("{} [{}]: {}", self.severity, self.code, self.message);
        for label in &self.labels {
            let marker = if label.is_primary { "-->" } else { "   " };
            let file = if label.location.file.is_empty() {
                "<generated>"
            } else {
                interner.lookup(label.location.file)
            };
            // Writing to a String cannot fail.
            let _ = write!(
                out,
                "\n  {marker} {file}:{:?}: {}",
                label.location.span, label.message
            );
        }
        for note in &self.notes {
            let _ = write!(out, "\n  = note: {note}");
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)?;
        for label in &self.labels {
            let marker = if label.is_primary { "-->" } else { "   " };
            write!(f, "\n  {marker} {:?}: {}", label.location, label.message)?;
        }
        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }
        Ok(())
    }
}
