//! Content synthesis
//!
//! Turns a requires clause into an English sentence by splitting it on
//! top-level `andBool`, describing each condition, and joining the results.

use axiom_parser::{parse_citation, regex};
use std::collections::BTreeMap;

/// Returned for an empty formal spec
pub const NO_PRECONDITIONS: &str = "No preconditions specified.";

/// Leaves longer than this with no table match are dropped
pub const MAX_LEAF_LEN: usize = 80;

/// Fallback sentences truncate the formal spec to this many characters
pub const FALLBACK_LEN: usize = 100;

/// Default predicate phrases for the C semantics
pub const C_PREDICATES: &[(&str, &str)] = &[
    ("notBool isZero", "divisor must be non-zero"),
    ("isZero", "operand is zero"),
    ("isPromoted", "operand must be integer-promoted"),
    ("==Type", "operand types must match"),
    ("=/=Type", "operand types must differ"),
    ("notBool isConstType", "operand must not be const-qualified"),
    ("isConstType", "operand must be const-qualified"),
    ("isCompleteType", "operand must be a complete type"),
    ("isPointerType", "operand must be a pointer type"),
    ("isIntegerType", "operand must be an integer type"),
    ("hasIntegerType", "operand must have integer type"),
    ("isFloatType", "operand must be a floating-point type"),
    ("notBool isVoidType", "operand must not be void"),
    ("isVoidType", "operand must be void type"),
    ("isArithmeticType", "operand must be an arithmetic type"),
    ("isScalarType", "operand must be a scalar type"),
    ("isUnknown", "operand value is unknown"),
    ("notBool isUnknown", "operand value must be known"),
    ("min(T) <=Int", "result must be within minimum bound"),
    ("max(T) >=Int", "result must be within maximum bound"),
];

/// Default display names for inferred operations
pub const C_OPERATIONS: &[(&str, &str)] = &[
    ("division", "Integer division"),
    ("modulus", "Modulus operation"),
    ("multiplication", "Integer multiplication"),
    ("addition", "Addition"),
    ("subtraction", "Subtraction"),
    ("shift", "Bit shift operation"),
    ("bitwise", "Bitwise operation"),
    ("comparison", "Comparison"),
    ("assignment", "Assignment"),
    ("operation", "Operation"),
];

/// Formal fragment -> phrase table, matched longest pattern first
#[derive(Debug, Clone)]
pub struct PredicateTable {
    entries: Vec<(String, String)>,
}

impl PredicateTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries: Vec<(String, String)> =
            entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries }
    }

    pub fn lookup(&self, condition: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(pattern, _)| condition.contains(pattern.as_str()))
            .map(|(_, phrase)| phrase.as_str())
    }
}

impl Default for PredicateTable {
    fn default() -> Self {
        Self::new(C_PREDICATES.iter().copied())
    }
}

/// Operation category -> sentence subject
#[derive(Debug, Clone)]
pub struct OperationNames {
    names: BTreeMap<String, String>,
}

impl OperationNames {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn display(&self, operation: Option<&str>) -> &str {
        operation
            .and_then(|op| self.names.get(op))
            .map_or("Operation", String::as_str)
    }
}

impl Default for OperationNames {
    fn default() -> Self {
        Self::new(C_OPERATIONS.iter().copied())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentSynthesizer {
    predicates: PredicateTable,
    operations: OperationNames,
}

impl ContentSynthesizer {
    pub fn new(predicates: PredicateTable, operations: OperationNames) -> Self {
        Self { predicates, operations }
    }

    /// Describe a formal spec in English. Never fails, never returns "".
    pub fn synthesize(&self, formal_spec: &str, operation: Option<&str>) -> String {
        if formal_spec.trim().is_empty() {
            return NO_PRECONDITIONS.to_string();
        }

        if let Some(text) = parse_citation(formal_spec)
            .map(|r| r.text)
            .filter(|t| !t.is_empty())
        {
            return text;
        }

        let descriptions: Vec<String> = self
            .conditions(formal_spec)
            .iter()
            .map(|c| self.describe(c))
            .filter(|d| !d.is_empty())
            .collect();

        let subject = self.operations.display(operation);
        match descriptions.as_slice() {
            [] => format!(
                "Requires: {}",
                truncate_chars(&clean_formal_spec(&strip_directives(formal_spec)), FALLBACK_LEN)
            ),
            [only] => format!("{subject} requires: {only}."),
            [init @ .., last] => format!("{subject} requires: {}, and {last}.", init.join(", ")),
        }
    }

    /// Top-level `andBool` conjuncts, in source order
    pub fn conditions(&self, formal_spec: &str) -> Vec<String> {
        let spec = strip_directives(formal_spec);
        split_connective(&spec, "andBool")
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Describe one condition; "" when it carries no usable description
    pub fn describe(&self, condition: &str) -> String {
        let cond = strip_outer_parens(condition.trim());

        let parts = split_connective(cond, "impliesBool");
        if parts.len() >= 2 {
            let (premise, conclusion) = parts.split_at(1);
            return format!(
                "if {} then {}",
                self.describe_or_clean(premise[0]),
                self.describe_or_clean(&conclusion.join(" impliesBool "))
            );
        }

        let parts = split_connective(cond, "orBool");
        if parts.len() >= 2 {
            let described: Vec<String> = parts
                .iter()
                .map(|p| self.describe(p))
                .filter(|d| !d.is_empty())
                .collect();
            return match described.as_slice() {
                [] => String::new(),
                [one] => one.clone(),
                [a, b] => format!("either {a} or {b}"),
                many => format!("one of: {}", many.join(", ")),
            };
        }

        let parts = split_connective(cond, "xorBool");
        if parts.len() >= 2 {
            let described: Vec<String> = parts.iter().map(|p| self.describe_or_clean(p)).collect();
            return format!("exactly one of ({})", described.join(") or ("));
        }

        let parts = split_connective(cond, "andBool");
        if parts.len() >= 2 {
            let described: Vec<String> = parts
                .iter()
                .map(|p| self.describe(p))
                .filter(|d| !d.is_empty())
                .collect();
            return described.join(" and ");
        }

        self.describe_leaf(cond)
    }

    fn describe_leaf(&self, leaf: &str) -> String {
        if let Some(phrase) = self.predicates.lookup(leaf) {
            return phrase.to_string();
        }

        if let Some(inner) = leaf.strip_prefix("notBool ") {
            let inner = self.describe(inner);
            if !inner.is_empty() {
                return format!("NOT: {inner}");
            }
        }

        let cleaned = clean_formal_spec(leaf);
        if cleaned.chars().count() <= MAX_LEAF_LEN {
            cleaned
        } else {
            String::new()
        }
    }

    fn describe_or_clean(&self, part: &str) -> String {
        let described = self.describe(part);
        if described.is_empty() {
            truncate_chars(&clean_formal_spec(part), FALLBACK_LEN)
        } else {
            described
        }
    }
}

/// Drop comments and `syntax` lines, collapse whitespace
fn strip_directives(spec: &str) -> String {
    let without_block = regex!(r"(?s)/\*.*?\*/").replace_all(spec, " ");
    let without_line = regex!(r"//[^\n]*").replace_all(&without_block, " ");
    without_line
        .lines()
        .filter(|l| !l.trim_start().starts_with("syntax "))
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove sort annotations and one layer of wrapping parentheses
pub fn clean_formal_spec(spec: &str) -> String {
    let mut spec = strip_outer_parens(spec.trim()).to_string();
    for sort in ["::UType", "::CValue", "::Type", ":Int", ":Float"] {
        spec = spec.replace(sort, "");
    }
    spec.trim().to_string()
}

/// Truncate to `max` characters, marking the cut with "..."
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}

/// Strip parentheses that wrap the whole expression, repeatedly
fn strip_outer_parens(s: &str) -> &str {
    let mut s = s.trim();
    while s.starts_with('(') && s.ends_with(')') && closing_paren(s) == Some(s.len() - 1) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

/// Index of the paren closing the one at position 0
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on a word-delimited connective outside parentheses
fn split_connective<'a>(s: &'a str, keyword: &str) -> Vec<&'a str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        match bytes[idx] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {
                if depth == 0 && s.is_char_boundary(idx) && s[idx..].starts_with(keyword) {
                    let before_ok = idx == 0 || bytes[idx - 1].is_ascii_whitespace();
                    let end = idx + keyword.len();
                    let after_ok = end == bytes.len() || bytes[end].is_ascii_whitespace();
                    if before_ok && after_ok {
                        parts.push(s[start..idx].trim());
                        start = end;
                        idx = end;
                        continue;
                    }
                }
            }
        }
        idx += 1;
    }
    parts.push(s[start..].trim());
    parts
}
