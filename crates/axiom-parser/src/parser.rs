//! Rule parser
//!
//! Turns one rule block into a [`ParsedRule`]: rewrite sides, requires
//! clause, error marker, attributes, function name and citation.

use crate::citation::{cited_function, parse_citation};
use crate::error::ParseError;
use crate::primitives::PrimitiveSet;
use crate::regex;
use axiom_lexer::{scan_rule_blocks, tokenize, RuleBlock, TokenKind};
use axiom_model::{ErrorMarker, ErrorType, FunctionOrigin, ParsedRule, Span, UNKNOWN_MODULE};

/// Parser for rule blocks
#[derive(Debug, Clone, Default)]
pub struct RuleParser {
    primitives: PrimitiveSet,
}

impl RuleParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primitives(primitives: PrimitiveSet) -> Self {
        Self { primitives }
    }

    pub fn primitives(&self) -> &PrimitiveSet {
        &self.primitives
    }

    /// Parse every rule in a rule file, skipping blocks that do not parse
    pub fn parse_source(&self, source: &str, source_file: &str) -> Vec<ParsedRule> {
        let file_module = extract_module_name(source);
        let mut rules = Vec::new();

        for block in scan_rule_blocks(source) {
            match self.parse_block(&block, file_module.as_deref(), source_file) {
                Ok(rule) => rules.push(rule),
                Err(err) => {
                    tracing::debug!(file = source_file, error = %err, "skipping rule block");
                }
            }
        }

        rules
    }

    /// Parse a block produced by the tokenizer
    pub fn parse_block(
        &self,
        block: &RuleBlock,
        file_module: Option<&str>,
        source_file: &str,
    ) -> Result<ParsedRule, ParseError> {
        let module = block
            .module
            .as_deref()
            .or(file_module)
            .unwrap_or(UNKNOWN_MODULE);
        let mut rule = self.parse(
            &block.text,
            module,
            source_file,
            block.line_start,
            block.comment.as_deref(),
        )?;
        rule.line_end = block.line_end;
        Ok(rule)
    }

    /// Parse one rule's text
    pub fn parse(
        &self,
        text: &str,
        module: &str,
        source_file: &str,
        line_start: usize,
        preceding_comment: Option<&str>,
    ) -> Result<ParsedRule, ParseError> {
        let body = text
            .trim_start()
            .strip_prefix("rule")
            .ok_or(ParseError::NotARule { line: line_start })?;
        let (label, body) = split_label(body);

        let (lhs, rhs) = split_rewrite(body).ok_or(ParseError::NoRewriteArrow { line: line_start })?;
        if lhs.is_empty() {
            return Err(ParseError::EmptyLhs { line: line_start });
        }

        let mut rule = ParsedRule::new(lhs, rhs, module);
        rule.label = label;
        rule.source_file = source_file.to_string();
        rule.line_start = line_start;
        rule.line_end = line_start + text.trim_end().matches('\n').count();
        rule.requires = extract_requires(text);
        rule.error_marker = extract_error_marker(text);
        rule.attributes = extract_attributes(text);
        rule.preceding_comment = preceding_comment.map(str::to_string);
        rule.standard_ref = preceding_comment.and_then(parse_citation);

        if let Some((name, origin)) = self.resolve_function(text, &rule.lhs, preceding_comment) {
            rule.function = Some(name);
            rule.function_origin = Some(origin);
        }

        Ok(rule)
    }

    /// Function name, in priority order: builtin citation, LHS head, doc citation
    fn resolve_function(
        &self,
        text: &str,
        lhs: &str,
        comment: Option<&str>,
    ) -> Option<(String, FunctionOrigin)> {
        if let Some(name) = builtin_target(text) {
            return Some((name, FunctionOrigin::Builtin));
        }
        if let Some(name) = self.lhs_head(lhs) {
            return Some((name, FunctionOrigin::LhsHead));
        }
        comment
            .and_then(cited_function)
            .map(|name| (name, FunctionOrigin::Citation))
    }

    /// The head of a call-shaped LHS, past any leading cell tags
    fn lhs_head(&self, lhs: &str) -> Option<String> {
        let tokens = tokenize(lhs);
        let mut iter = tokens
            .iter()
            .skip_while(|t| matches!(t.kind, TokenKind::CellOpen | TokenKind::Ellipsis));
        let head = iter.next()?;
        let next = iter.next();
        if !head.is_call_head(next) {
            return None;
        }
        let name = head.text(lhs);
        if self.primitives.contains(name) || name.starts_with(|c: char| c.is_ascii_uppercase()) {
            return None;
        }
        Some(name.to_string())
    }
}

/// Module declared in a rule file, if any
pub fn extract_module_name(source: &str) -> Option<String> {
    regex!(r"(?m)^\s*module\s+([A-Z0-9_-]+)")
        .captures(source)
        .map(|c| c[1].to_string())
}

/// `builtin("name"` target anywhere in the text
pub fn builtin_target(text: &str) -> Option<String> {
    regex!(r#"builtin\s*\(\s*"([^"]+)""#)
        .captures(text)
        .map(|c| c[1].to_string())
}

/// Every `builtin("name"` target in the text
pub fn builtin_targets(text: &str) -> Vec<String> {
    regex!(r#"builtin\s*\(\s*"([^"]+)""#)
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

fn split_label(body: &str) -> (Option<String>, &str) {
    match regex!(r"^\s*\[([^\]]*)\]\s*:").captures(body) {
        Some(caps) => {
            let end = caps.get(0).map_or(0, |m| m.end());
            (Some(caps[1].trim().to_string()), &body[end..])
        }
        None => (None, body),
    }
}

/// Split at the first `=>` that has a right-hand side of its own.
///
/// The RHS stops before a `requires` clause or a trailing attribute list.
fn split_rewrite(body: &str) -> Option<(String, String)> {
    for (idx, _) in body.match_indices("=>") {
        let after = &body[idx + 2..];
        let rhs_start = after.trim_start();
        if rhs_start.is_empty() || rhs_start.starts_with("requires") || rhs_start.starts_with('[') {
            continue;
        }
        let lhs = body[..idx].trim().to_string();
        let rhs = rhs_start[..rhs_end(rhs_start)].trim().to_string();
        return Some((lhs, rhs));
    }
    None
}

fn rhs_end(rhs: &str) -> usize {
    [requires_keyword(rhs).map(|span| span.start), attribute_start(rhs)]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rhs.len())
}

/// Span of the first `requires` keyword token; string literals never match
fn requires_keyword(text: &str) -> Option<Span> {
    tokenize(text)
        .into_iter()
        .find(|t| t.kind == TokenKind::Requires)
        .map(|t| t.span)
}

/// Offset of the `[` opening a trailing attribute list
fn attribute_start(text: &str) -> Option<usize> {
    let tokens = tokenize(text);
    let mut rev = tokens.iter().rev().filter(|t| t.kind != TokenKind::Eof);
    if rev.next()?.kind != TokenKind::RBracket {
        return None;
    }
    let mut depth = 1usize;
    for token in rev {
        match token.kind {
            TokenKind::RBracket => depth += 1,
            TokenKind::LBracket => {
                depth -= 1;
                if depth == 0 {
                    let start = token.span.start;
                    // `M[K]` is a lookup, not an attribute list
                    let detached = text[..start].chars().next_back().map_or(true, char::is_whitespace);
                    return detached.then_some(start);
                }
            }
            _ => {}
        }
    }
    None
}

/// Requires clause with internal whitespace collapsed
pub fn extract_requires(text: &str) -> Option<String> {
    let rest = &text[requires_keyword(text)?.end..];
    let end = attribute_start(rest).unwrap_or(rest.len());
    let clause = rest[..end].split_whitespace().collect::<Vec<_>>().join(" ");
    (!clause.is_empty()).then_some(clause)
}

/// First `TAG("CODE", "message"` marker in the text
pub fn extract_error_marker(text: &str) -> Option<ErrorMarker> {
    let caps = regex!(r#"\b(UNDEF|CV|IMPLUB|IMPL|UNSPEC|SE)\s*\(\s*"([^"]+)"\s*,\s*"([^"]+)""#)
        .captures(text)?;
    Some(ErrorMarker {
        error_type: ErrorType::from_keyword(&caps[1])?,
        code: caps[2].to_string(),
        message: caps[3].to_string(),
    })
}

/// Entries of the trailing `[attr, ...]` list
pub fn extract_attributes(text: &str) -> Vec<String> {
    let Some(list) = attribute_start(text).map(|start| &text[start + 1..]) else {
        return Vec::new();
    };
    let inner = list.rfind(']').map_or(list, |close| &list[..close]);
    split_top_level(inner, ',')
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

/// Split on `sep` outside parentheses
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&s[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ParsedRule, ParseError> {
        RuleParser::new().parse(text, "C-COMMON-EXPR-MULTIPLICATIVE", "mult.k", 10, None)
    }

    #[test]
    fn test_simple_rule() {
        let rule = parse("rule foo(X) => bar(X)").unwrap();
        assert_eq!(rule.lhs, "foo(X)");
        assert_eq!(rule.rhs, "bar(X)");
        assert_eq!(rule.requires, None);
        assert_eq!(rule.function.as_deref(), Some("foo"));
        assert_eq!(rule.function_origin, Some(FunctionOrigin::LhsHead));
    }

    #[test]
    fn test_requires_is_joined() {
        let text = "rule tv(I1:Int, T) / tv(I2:Int, T)\n    => tv(I1 /Int I2, T)\n    requires isPromoted(T)\n        andBool notBool isZero(I2)\n    [structural]";
        let rule = parse(text).unwrap();
        assert_eq!(rule.lhs, "tv(I1:Int, T) / tv(I2:Int, T)");
        assert_eq!(rule.rhs, "tv(I1 /Int I2, T)");
        assert_eq!(rule.requires.as_deref(), Some("isPromoted(T) andBool notBool isZero(I2)"));
        assert_eq!(rule.attributes, vec!["structural".to_string()]);
        assert_eq!(rule.line_end, 14);
        // tv is a primitive
        assert_eq!(rule.function, None);
    }

    #[test]
    fn test_no_arrow_is_skipped() {
        assert_eq!(parse("rule foo(X)"), Err(ParseError::NoRewriteArrow { line: 10 }));
    }

    #[test]
    fn test_empty_lhs() {
        assert_eq!(parse("rule => foo"), Err(ParseError::EmptyLhs { line: 10 }));
    }

    #[test]
    fn test_error_marker() {
        let text = r#"rule tv(_:Int, T) / tv(0, T) => UNDEF("CEMX1", "Division by 0.") requires isPromoted(T)"#;
        let rule = parse(text).unwrap();
        let marker = rule.error_marker.unwrap();
        assert_eq!(marker.error_type, ErrorType::Undef);
        assert_eq!(marker.code, "CEMX1");
        assert_eq!(marker.message, "Division by 0.");
        assert_eq!(rule.requires.as_deref(), Some("isPromoted(T)"));
    }

    #[test]
    fn test_implub_marker() {
        let marker = extract_error_marker(r#"=> IMPLUB("X1", "msg")"#).unwrap();
        assert_eq!(marker.error_type, ErrorType::ImplUb);
    }

    #[test]
    fn test_builtin_beats_lhs_head() {
        let text = "rule builtin(\"malloc\", tv(Len:Int, _))\n    => alignedAlloc(cfg:alignofMalloc, Len)\n    [structural]";
        let rule = parse(text).unwrap();
        assert_eq!(rule.function.as_deref(), Some("malloc"));
        assert!(rule.is_builtin());
        assert_eq!(rule.rhs, "alignedAlloc(cfg:alignofMalloc, Len)");
    }

    #[test]
    fn test_cell_prefix_skipped_for_head() {
        let text = "rule <k> alignedAlloc(Align::Int, Sz::Int) => tv(X, T) ...</k>";
        let rule = parse(text).unwrap();
        assert_eq!(rule.function.as_deref(), Some("alignedAlloc"));
    }

    #[test]
    fn test_citation_fallback_for_function() {
        let comment = r"/*@ \fromStandard{\source[n1570]{\para{7.22.3.3}{2}}}{The \cinline{free} function causes the space to be deallocated.} */";
        let rule = RuleParser::new()
            .parse("rule X:K => .K", "LIBC-STDLIB", "stdlib.k", 1, Some(comment))
            .unwrap();
        assert_eq!(rule.function.as_deref(), Some("free"));
        assert_eq!(rule.function_origin, Some(FunctionOrigin::Citation));
        assert_eq!(rule.standard_ref.map(|r| r.section), Some("7.22.3.3".to_string()));
    }

    #[test]
    fn test_requires_inside_string_is_not_a_clause() {
        let text = "rule <k> builtin(\"free\", tv(Loc:SymLoc, _))\n       => UNDEF(\"STDLIB9\", \"free requires an allocated pointer.\") ~> cleanup(Loc) ...</k>\n       requires notBool isMalloced(Loc)\n  [structural]";
        let rule = RuleParser::new().parse(text, "LIBC-STDLIB", "stdlib.k", 1, None).unwrap();
        assert_eq!(
            rule.rhs,
            "UNDEF(\"STDLIB9\", \"free requires an allocated pointer.\") ~> cleanup(Loc) ...</k>"
        );
        assert_eq!(rule.requires.as_deref(), Some("notBool isMalloced(Loc)"));
        assert_eq!(rule.attributes, vec!["structural".to_string()]);
        assert_eq!(rule.error_marker.map(|m| m.message), Some("free requires an allocated pointer.".to_string()));

        let no_clause = r#"rule f(X) => g("X requires care")"#;
        assert_eq!(extract_requires(no_clause), None);
        assert_eq!(parse(no_clause).unwrap().rhs, r#"g("X requires care")"#);
    }

    #[test]
    fn test_label_is_stripped() {
        let rule = parse("rule [div-zero]: foo(X) => bar").unwrap();
        assert_eq!(rule.label.as_deref(), Some("div-zero"));
        assert_eq!(rule.lhs, "foo(X)");
    }

    #[test]
    fn test_arrow_followed_by_requires_is_skipped() {
        let (lhs, rhs) = split_rewrite(" a => requires b => c").unwrap();
        assert_eq!(lhs, "a => requires b");
        assert_eq!(rhs, "c");
    }

    #[test]
    fn test_attributes_with_parens() {
        let attrs = extract_attributes("rule a => b\n  [structural, klabel(foo, bar)]");
        assert_eq!(attrs, vec!["structural".to_string(), "klabel(foo, bar)".to_string()]);
        assert!(extract_attributes("rule a => M[X]").is_empty());
    }

    #[test]
    fn test_module_name() {
        let src = "require \"x.k\"\nmodule LIBC-STDLIB\n  imports C\nendmodule";
        assert_eq!(extract_module_name(src).as_deref(), Some("LIBC-STDLIB"));
        assert_eq!(extract_module_name("nothing"), None);
    }

    #[test]
    fn test_parse_source_uses_block_module() {
        let src = "module A\nrule f(X) => X\nendmodule\nmodule B\nrule g(X) => X\nrule broken\nendmodule\n";
        let rules = RuleParser::new().parse_source(src, "ab.k");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].module, "A");
        assert_eq!(rules[1].module, "B");
        assert_eq!(rules[1].source_file, "ab.k");
    }

    #[test]
    fn test_unknown_module_default() {
        let rules = RuleParser::new().parse_source("rule f(X) => X\n", "f.k");
        assert_eq!(rules[0].module, UNKNOWN_MODULE);
    }
}
