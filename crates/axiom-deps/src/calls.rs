//! Call-site scanning of rule right-hand sides

use axiom_lexer::tokenize;
use axiom_parser::{builtin_targets, PrimitiveSet};
use std::collections::BTreeSet;

/// Finds the functions a rule body calls
#[derive(Debug, Clone, Default)]
pub struct CallScanner {
    primitives: PrimitiveSet,
}

impl CallScanner {
    pub fn new(primitives: PrimitiveSet) -> Self {
        Self { primitives }
    }

    /// Sorted, unique names applied as `name(` plus `builtin("name"` targets,
    /// minus primitives
    pub fn extract_function_calls(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        let mut names: BTreeSet<String> = tokens
            .windows(2)
            .filter(|w| w[0].is_call_head(Some(&w[1])))
            .map(|w| w[0].text(text))
            .filter(|name| !self.primitives.contains(name))
            .map(str::to_string)
            .collect();

        names.extend(builtin_targets(text));
        names.into_iter().collect()
    }
}
