//! Prompt templates for LLM interactions

use axiom_model::Axiom;

const ENRICHMENT_INSTRUCTIONS: &str = r#"You are enriching axioms extracted from C and C++ semantics.

For each axiom, add an on_violation field describing what error or undefined behavior
occurs when the axiom is violated. Be specific and concise.

For PRECONDITION axioms, describe the runtime error or UB.
For EFFECT axioms, describe what state change occurs.
For CONSTRAINT axioms, describe what compilation or runtime issue arises.

If you can infer a POSTCONDITION from the function or its axioms,
add it as a new axiom with axiom_type = '''POSTCONDITION'''.

CRITICAL: Your response must contain ONLY the TOML output below. Do NOT include:
- Any explanatory text before or after the TOML
- Markdown code fences
- Comments or notes about what you changed

Start your response with [[axioms]] and use triple-quoted strings for all values:
"#;

const ENRICHMENT_FOOTER: &str = r#"Add on_violation = '''...''' to each axiom. Keep all original fields.
If inferring new axioms, use a new id like "function.inferred.postcond"."#;

/// Prompt asking for `on_violation` on every axiom in the batch
pub fn build_enrichment_prompt(axioms: &[Axiom]) -> String {
    let blocks: Vec<String> = axioms
        .iter()
        .map(|a| {
            format!(
                "[[axioms]]\nid = '''{}'''\ncontent = '''{}'''\nformal_spec = '''{}'''\naxiom_type = '''{}'''\nfunction = '''{}'''\n",
                a.id,
                a.content,
                a.formal_spec,
                a.axiom_type.as_str().to_uppercase(),
                a.function.as_deref().unwrap_or(""),
            )
        })
        .collect();
    format!("{ENRICHMENT_INSTRUCTIONS}\n{}\n{ENRICHMENT_FOOTER}", blocks.join("\n"))
}
