//! Axiom construction
//!
//! Each parsed rule yields at most one axiom. The first matching case wins:
//!
//! 1. requires clause, no error marker: precondition
//! 2. citation and function, no requires, no error marker: postcondition
//! 3. error marker and function: constraint
//! 4. function in a library module (or from a builtin citation): effect

use crate::config::ExtractConfig;
use crate::content::{truncate_chars, ContentSynthesizer};
use axiom_model::{Axiom, AxiomType, ParsedRule, SourceLocation, StandardRef};
use axiom_parser::regex;
use sha2::{Digest, Sha256};

/// Characters of text fed into ids for citation and effect axioms
const ID_TEXT_LEN: usize = 100;

/// Characters of the RHS shown in effect content
const EFFECT_RHS_LEN: usize = 100;

/// Characters of a requires clause shown in effect content
const EFFECT_REQUIRES_LEN: usize = 80;

/// Builds axioms from parsed rules
#[derive(Debug, Clone, Default)]
pub struct AxiomBuilder {
    config: ExtractConfig,
    synthesizer: ContentSynthesizer,
}

impl AxiomBuilder {
    pub fn new(config: ExtractConfig) -> Self {
        Self {
            config,
            synthesizer: ContentSynthesizer::default(),
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: ContentSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Build the axiom for a rule, if any case applies
    pub fn build(&self, rule: &ParsedRule) -> Option<Axiom> {
        let citation = rule.standard_ref.as_ref().filter(|r| !r.text.is_empty());
        let operation = infer_operation(&rule.lhs);

        let mut axiom = match (&rule.requires, &rule.error_marker, &rule.function) {
            (Some(requires), None, _) => {
                let content = match citation {
                    Some(c) => c.text.clone(),
                    None => self.synthesizer.synthesize(requires, Some(operation)),
                };
                let segment = rule.function.as_deref().unwrap_or(operation);
                let id = self.generate_id(&rule.module, segment, requires);
                let mut axiom = self.axiom(rule, id, content, AxiomType::Precondition);
                axiom.formal_spec = requires.clone();
                axiom
            }
            (None, None, Some(function)) if citation.is_some() => {
                let text = citation.map(|c| c.text.clone()).unwrap_or_default();
                let id = self.generate_id(&rule.module, function, &truncate_prefix(&text, ID_TEXT_LEN));
                self.axiom(rule, id, text, AxiomType::Postcondition)
            }
            (_, Some(marker), Some(function)) => {
                let id = self.generate_id(&rule.module, function, &marker.message);
                let mut axiom = self.axiom(rule, id, marker.message.clone(), AxiomType::Constraint);
                axiom.formal_spec = rule.requires.clone().unwrap_or_default();
                axiom.on_violation = Some(marker.violation());
                axiom.violated_by.push(marker.into());
                axiom.tags.push(marker.error_type.keyword().to_ascii_lowercase());
                axiom
            }
            (None, None, Some(function)) if self.is_library_rule(rule) => {
                let id = self.generate_id(&rule.module, function, &truncate_prefix(&rule.rhs, ID_TEXT_LEN));
                let content = effect_content(function, &rule.rhs, rule.requires.as_deref());
                let mut axiom = self.axiom(rule, id, content, AxiomType::Effect);
                axiom.formal_spec = rule.rhs.clone();
                axiom
            }
            _ => return None,
        };

        axiom.c_standard_refs = rule
            .standard_ref
            .as_ref()
            .map(StandardRef::citation)
            .into_iter()
            .collect();
        Some(axiom)
    }

    /// Content-addressed id for (module, operation, formal spec)
    pub fn generate_id(&self, module: &str, operation: &str, formal_spec: &str) -> String {
        generate_axiom_id(&self.config.id_prefix, module, operation, formal_spec)
    }

    fn is_library_rule(&self, rule: &ParsedRule) -> bool {
        rule.is_builtin() || self.config.is_library_module(&rule.module)
    }

    fn axiom(&self, rule: &ParsedRule, id: String, content: String, axiom_type: AxiomType) -> Axiom {
        let source = SourceLocation::new(rule.source_file.clone(), rule.module.clone(), rule.lines());
        let mut axiom = Axiom::new(id, content, axiom_type, source);
        axiom.layer = self.config.layer.clone();
        axiom.function = rule.function.clone();
        axiom.header = self.config.header_for(&rule.module);
        axiom.tags = infer_tags(rule.requires.as_deref(), infer_operation(&rule.lhs));
        axiom
    }
}

/// `{prefix}_{module}_{operation}_{hash8}`
pub fn generate_axiom_id(prefix: &str, module: &str, operation: &str, formal_spec: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{module}:{operation}:{formal_spec}").as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    let mut module_part = module.to_lowercase().replace('-', "_");
    if module_part.len() > 30 {
        module_part = module_part
            .split('_')
            .filter(|p| !matches!(*p, "c" | "common" | "syntax"))
            .collect::<Vec<_>>()
            .join("_")
            .chars()
            .take(25)
            .collect();
    }

    format!("{prefix}_{module_part}_{}_{}", sanitize_segment(operation), &hash[..8])
}

/// Lowercase `[a-z0-9_]` form of an id segment
fn sanitize_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_');
    if out.is_empty() {
        "op".to_string()
    } else {
        out.to_string()
    }
}

fn truncate_prefix(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Operation category of a rule's left-hand side, ignoring cell tags
pub fn infer_operation(lhs: &str) -> &'static str {
    let stripped = regex!(r"</?[A-Za-z][A-Za-z0-9_\-]*>").replace_all(lhs, " ");
    let lhs = stripped.as_ref();
    let lower = lhs.to_lowercase();

    if lhs.contains('/') && !lower.contains("div") {
        "division"
    } else if lhs.contains('%') {
        "modulus"
    } else if lhs.contains('*') && !lower.contains("mult") {
        "multiplication"
    } else if lhs.contains('+') {
        "addition"
    } else if lhs.contains('-') {
        "subtraction"
    } else if lhs.contains("<<") || lhs.contains(">>") {
        "shift"
    } else if lhs.contains(['&', '|', '^']) {
        "bitwise"
    } else if lhs.contains("==") || lhs.contains("!=") || lhs.contains(['<', '>']) {
        "comparison"
    } else if lhs.contains(":=") || lhs.contains('=') {
        "assignment"
    } else {
        "operation"
    }
}

/// Topical tags from the requires clause and operation
pub fn infer_tags(requires: Option<&str>, operation: &str) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(req) = requires {
        let checks: [(&[&str], &str); 6] = [
            (&["isPromoted"], "type_promotion"),
            (&["isZero"], "zero_check"),
            (&["==Type", "=/=Type"], "type_compatibility"),
            (&["isPointer"], "pointer"),
            (&["isInteger"], "integer"),
            (&["isFloat"], "float"),
        ];
        for (needles, tag) in checks {
            if needles.iter().any(|n| req.contains(n)) {
                tags.push(tag.to_string());
            }
        }
    }

    if operation != "operation" {
        tags.push(operation.to_string());
    }
    tags
}

/// `<function> transforms to <rhs>[ when <requires>]`
pub fn effect_content(function: &str, rhs: &str, requires: Option<&str>) -> String {
    let mut content = format!("{function} transforms to {}", truncate_chars(rhs, EFFECT_RHS_LEN));
    if let Some(req) = requires.filter(|r| !r.is_empty()) {
        content.push_str(" when ");
        content.push_str(&truncate_chars(req, EFFECT_REQUIRES_LEN));
    }
    content
}
