//! Source location tracking

use serde::{Deserialize, Serialize};

/// A byte range in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start
    pub start: usize,
    /// Byte offset of the end (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A line range in a rule file (1-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end: end.max(start) }
    }

    pub fn single(line: usize) -> Self {
        Self { start: line, end: line }
    }

    /// Merge two ranges into one that covers both
    pub fn merge(self, other: LineRange) -> LineRange {
        LineRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Where an axiom came from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(rename = "source_file")]
    pub file: String,
    pub module: String,
    pub line_start: usize,
    pub line_end: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, module: impl Into<String>, lines: LineRange) -> Self {
        Self {
            file: file.into(),
            module: module.into(),
            line_start: lines.start,
            line_end: lines.end,
        }
    }

    pub fn lines(&self) -> LineRange {
        LineRange::new(self.line_start, self.line_end)
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{} ({})", self.file, self.line_start, self.line_end, self.module)
    }
}
