//! Axiom Parser - Rule blocks to structured rule records
//!
//! Parses the rule blocks produced by `axiom-lexer` into
//! [`ParsedRule`](axiom_model::ParsedRule) values.

mod macros;
mod citation;
mod error;
mod parser;
mod primitives;

pub use citation::*;
pub use error::*;
pub use parser::*;
pub use primitives::*;

use axiom_model::ParsedRule;

/// Parse a rule file with the default primitive set
pub fn parse_rules(source: &str, source_file: &str) -> Vec<ParsedRule> {
    RuleParser::new().parse_source(source, source_file)
}
