//! Parsed rule records

use crate::LineRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Module name used when a rule file declares none
pub const UNKNOWN_MODULE: &str = "UNKNOWN";

/// Kind of behaviour an error marker denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorType {
    /// Undefined behaviour
    Undef,
    /// Constraint violation
    Cv,
    /// Implementation-defined behaviour
    Impl,
    /// Unspecified behaviour
    Unspec,
    /// Syntax error
    Se,
    /// Implementation-defined undefined behaviour
    ImplUb,
}

impl ErrorType {
    pub const ALL: [ErrorType; 6] = [
        ErrorType::Undef,
        ErrorType::Cv,
        ErrorType::Impl,
        ErrorType::Unspec,
        ErrorType::Se,
        ErrorType::ImplUb,
    ];

    /// The keyword used in rule text
    pub fn keyword(&self) -> &'static str {
        match self {
            ErrorType::Undef => "UNDEF",
            ErrorType::Cv => "CV",
            ErrorType::Impl => "IMPL",
            ErrorType::Unspec => "UNSPEC",
            ErrorType::Se => "SE",
            ErrorType::ImplUb => "IMPLUB",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.keyword() == s)
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// An embedded `TAG("CODE", "message")` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMarker {
    pub error_type: ErrorType,
    pub code: String,
    pub message: String,
}

impl ErrorMarker {
    /// The `on_violation` text for axioms built from this marker
    pub fn violation(&self) -> String {
        format!("{}: {}", self.error_type, self.code)
    }
}

/// A paragraph citation taken from a documentation comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardRef {
    /// Document identifier, e.g. `n1570`
    pub source: String,
    /// Section number, e.g. `7.22.3.4`
    pub section: String,
    /// Paragraph or paragraph range, e.g. `2` or `2--3`
    pub paragraph: String,
    /// Cleaned excerpt of the cited prose
    pub text: String,
}

impl StandardRef {
    /// Citation string recorded in `c_standard_refs`
    pub fn citation(&self) -> String {
        format!("{} {}p{}", self.source, self.section, self.paragraph)
    }
}

/// How a rule's function name was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionOrigin {
    /// `builtin("name", ...)` inside the rule block
    Builtin,
    /// Head token of a call-shaped left-hand side
    LhsHead,
    /// `\cinline{name}` function named by the documentation citation
    Citation,
}

/// One rewrite rule extracted from a rule file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRule {
    pub lhs: String,
    /// May be empty for partial rules
    pub rhs: String,
    pub requires: Option<String>,
    pub module: String,
    pub source_file: String,
    pub line_start: usize,
    pub line_end: usize,
    pub error_marker: Option<ErrorMarker>,
    pub attributes: Vec<String>,
    /// Label of a `rule [label]: ...` rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_origin: Option<FunctionOrigin>,
    pub standard_ref: Option<StandardRef>,
    pub preceding_comment: Option<String>,
}

impl ParsedRule {
    pub fn new(lhs: impl Into<String>, rhs: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into(),
            requires: None,
            module: module.into(),
            source_file: String::new(),
            line_start: 0,
            line_end: 0,
            error_marker: None,
            attributes: Vec::new(),
            label: None,
            function: None,
            function_origin: None,
            standard_ref: None,
            preceding_comment: None,
        }
    }

    pub fn lines(&self) -> LineRange {
        LineRange::new(self.line_start, self.line_end)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    /// Whether the function came from an explicit builtin citation
    pub fn is_builtin(&self) -> bool {
        self.function_origin == Some(FunctionOrigin::Builtin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_keywords_round_trip() {
        for ty in ErrorType::ALL {
            assert_eq!(ErrorType::from_keyword(ty.keyword()), Some(ty));
        }
        assert_eq!(ErrorType::from_keyword("WARN"), None);
    }

    #[test]
    fn test_violation_text() {
        let marker = ErrorMarker {
            error_type: ErrorType::Undef,
            code: "CMD1".into(),
            message: "Division by zero.".into(),
        };
        assert_eq!(marker.violation(), "UNDEF: CMD1");
    }

    #[test]
    fn test_citation_string() {
        let r = StandardRef {
            source: "n1570".into(),
            section: "7.22.3.4".into(),
            paragraph: "2".into(),
            text: String::new(),
        };
        assert_eq!(r.citation(), "n1570 7.22.3.4p2");
    }
}
