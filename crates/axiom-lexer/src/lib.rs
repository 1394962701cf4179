//! Axiom Lexer - Rule-file scanning and rule-body tokenization
//!
//! Two layers:
//! - [`scan_rule_blocks`] splits a rule file into rule blocks with their
//!   documentation comments and line ranges (an explicit state machine).
//! - [`tokenize`] turns rule text into tokens using logos.

mod blocks;
mod token;

pub use blocks::*;
pub use token::*;

use axiom_model::Span;
use logos::Logos;

/// Tokenize rule text into a vector of tokens
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        let kind = match result {
            Ok(kind) => kind,
            Err(_) => TokenKind::Error,
        };
        tokens.push(Token { kind, span });
    }

    let end = source.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
    });

    tokens
}

/// A token with its span
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }

    /// Whether this token is immediately followed by `(` (whitespace allowed)
    pub fn is_call_head(&self, next: Option<&Token>) -> bool {
        matches!(self.kind, TokenKind::Ident)
            && next.is_some_and(|n| n.kind == TokenKind::LParen)
    }
}

/// Identifiers applied as functions, in source order
pub fn call_heads(source: &str) -> Vec<&str> {
    let tokens = tokenize(source);
    tokens
        .windows(2)
        .filter(|w| w[0].is_call_head(Some(&w[1])))
        .map(|w| w[0].text(source))
        .collect()
}
