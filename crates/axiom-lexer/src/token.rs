//! Token definitions for rule bodies

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]  // Skip whitespace
#[logos(skip r"//[^\n]*")]      // Skip line comments
pub enum TokenKind {
    // === Keywords ===
    #[token("rule")]
    Rule,
    #[token("requires")]
    Requires,
    #[token("ensures")]
    Ensures,
    #[token("builtin")]
    Builtin,
    #[token("module")]
    Module,
    #[token("endmodule")]
    EndModule,
    #[token("syntax")]
    Syntax,
    #[token("context")]
    Context,
    #[token("imports")]
    Imports,

    // === Rewrite operators ===
    #[token("=>")]
    Arrow,
    #[token("~>")]
    KSeq,
    #[token("|->")]
    MapsTo,
    #[token("...")]
    Ellipsis,

    // === Configuration cells ===
    #[regex(r"<[A-Za-z][A-Za-z0-9_\-]*>")]
    CellOpen,
    #[regex(r"</[A-Za-z][A-Za-z0-9_\-]*>")]
    CellClose,

    /// Unit of a collection sort, e.g. `.Map`, `.K`
    #[regex(r"\.[A-Z][A-Za-z]*")]
    DotUnit,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,

    // === Literals ===
    #[regex(r#""([^"\\]|\\.)*""#)]
    String,
    #[regex(r"[0-9][A-Za-z0-9_]*")]
    Number,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // === Special ===
    /// Operator characters and anything else without its own token
    Error,
    Eof,
}

impl TokenKind {
    /// Keywords are never function names
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Rule
                | TokenKind::Requires
                | TokenKind::Ensures
                | TokenKind::Module
                | TokenKind::EndModule
                | TokenKind::Syntax
                | TokenKind::Context
                | TokenKind::Imports
        )
    }
}
