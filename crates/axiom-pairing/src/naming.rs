//! Naming-convention pairing heuristics

use axiom_model::{placeholder_id, Pairing, PairingSource};
use std::collections::HashSet;

pub const NAMING_CONFIDENCE: f64 = 0.7;

/// Opener/closer name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingPattern {
    /// `{base}_lock` -> `{base}_unlock`
    Suffix { opener: String, closer: String },
    /// `create_{base}` -> `destroy_{base}`
    Prefix { opener: String, closer: String },
}

impl NamingPattern {
    pub fn suffix(opener: &str, closer: &str) -> Self {
        NamingPattern::Suffix {
            opener: opener.to_string(),
            closer: closer.to_string(),
        }
    }

    pub fn prefix(opener: &str, closer: &str) -> Self {
        NamingPattern::Prefix {
            opener: opener.to_string(),
            closer: closer.to_string(),
        }
    }

    /// The closer name this pattern predicts for `function`
    pub fn closer_for(&self, function: &str) -> Option<String> {
        match self {
            NamingPattern::Suffix { opener, closer } => function
                .strip_suffix(opener.as_str())
                .filter(|base| !base.is_empty())
                .map(|base| format!("{base}{closer}")),
            NamingPattern::Prefix { opener, closer } => function
                .strip_prefix(opener.as_str())
                .filter(|base| !base.is_empty())
                .map(|base| format!("{closer}{base}")),
        }
    }
}

/// Ordered table of naming patterns
#[derive(Debug, Clone)]
pub struct NamingTable {
    patterns: Vec<NamingPattern>,
}

impl Default for NamingTable {
    fn default() -> Self {
        Self::new(vec![
            NamingPattern::suffix("_begin", "_end"),
            NamingPattern::suffix("_start", "_stop"),
            NamingPattern::suffix("_open", "_close"),
            NamingPattern::suffix("_lock", "_unlock"),
            NamingPattern::suffix("_init", "_destroy"),
            NamingPattern::suffix("_init", "_cleanup"),
            NamingPattern::suffix("_init", "_free"),
            NamingPattern::suffix("_init", "_finish"),
            NamingPattern::suffix("_acquire", "_release"),
            NamingPattern::prefix("create_", "destroy_"),
            NamingPattern::prefix("alloc_", "free_"),
            NamingPattern::prefix("new_", "delete_"),
        ])
    }
}

impl NamingTable {
    pub fn new(patterns: Vec<NamingPattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[NamingPattern] {
        &self.patterns
    }

    /// Pair each function with every predicted closer present in `functions`
    pub fn detect<S: AsRef<str>>(&self, functions: &[S]) -> Vec<Pairing> {
        let known: HashSet<&str> = functions.iter().map(AsRef::as_ref).collect();
        let mut pairings = Vec::new();
        for function in functions {
            let function: &str = function.as_ref();
            for pattern in &self.patterns {
                let Some(closer) = pattern.closer_for(function) else {
                    continue;
                };
                if !known.contains(closer.as_str()) {
                    continue;
                }
                pairings.push(Pairing {
                    opener_id: placeholder_id(function),
                    closer_id: placeholder_id(&closer),
                    required: true,
                    source: PairingSource::NamingHeuristic,
                    confidence: NAMING_CONFIDENCE,
                    cell: None,
                    evidence: format!("Naming pattern: {function} -> {closer}"),
                });
            }
        }
        pairings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutex_lock_pairs_with_unlock() {
        let pairings = NamingTable::default().detect(&["mutex_lock", "mutex_unlock", "mutex_trylock"]);
        assert_eq!(pairings.len(), 1);
        assert_eq!(pairings[0].key(), ("axiom_for_mutex_lock", "axiom_for_mutex_unlock"));
        assert_eq!(pairings[0].confidence, 0.7);
        assert!(pairings[0].required);
        assert_eq!(pairings[0].source, PairingSource::NamingHeuristic);
        assert!(pairings.iter().all(|p| !p.opener_id.contains("trylock") && !p.closer_id.contains("trylock")));
    }

    #[test]
    fn test_init_has_several_closers() {
        let functions = vec!["ctx_init".to_string(), "ctx_free".to_string(), "ctx_destroy".to_string()];
        let closers: Vec<_> = NamingTable::default()
            .detect(&functions)
            .into_iter()
            .map(|p| p.closer_id)
            .collect();
        assert_eq!(closers, vec!["axiom_for_ctx_destroy", "axiom_for_ctx_free"]);
    }

    #[test]
    fn test_prefix_patterns() {
        let pairings = NamingTable::default().detect(&["create_window", "destroy_window", "alloc_page"]);
        assert_eq!(pairings.len(), 1);
        assert_eq!(pairings[0].evidence, "Naming pattern: create_window -> destroy_window");
    }

    #[test]
    fn test_bare_affix_does_not_match() {
        let pattern = NamingPattern::suffix("_lock", "_unlock");
        assert_eq!(pattern.closer_for("_lock"), None);
        assert_eq!(NamingPattern::prefix("new_", "delete_").closer_for("new_"), None);
        assert_eq!(pattern.closer_for("spin_lock").as_deref(), Some("spin_unlock"));
    }
}
