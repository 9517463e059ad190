//! Source location spans.

use std::fmt;

use crate::Name;

/// Byte range within one source file.
///
/// Layout: 8 bytes total (`start` inclusive, `end` exclusive).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Dummy span for compiler-generated declarations.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Merge two spans to create one covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A span qualified by the file it belongs to.
///
/// Symbols imported from another module keep the location of their original
/// definition, so diagnostics can point across files.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Location {
    /// Interned path of the source file.
    pub file: Name,
    pub span: Span,
}

impl Location {
    /// Location of compiler-generated declarations.
    pub const GENERATED: Location = Location {
        file: Name::EMPTY,
        span: Span::DUMMY,
    };

    #[inline]
    pub const fn new(file: Name, span: Span) -> Self {
        Location { file, span }
    }

    /// Same file, different span.
    #[inline]
    #[must_use]
    pub const fn with_span(self, span: Span) -> Self {
        Location {
            file: self.file,
            span,
        }
    }

    /// Whether this location was synthesized by the compiler.
    #[inline]
    pub fn is_generated(&self) -> bool {
        self.file.is_empty() && self.span == Span::DUMMY
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.file, self.span)
    }
}
