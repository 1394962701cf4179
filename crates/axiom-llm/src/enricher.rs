//! Batched enrichment of extracted axioms

use std::collections::HashMap;
use std::path::PathBuf;

use axiom_model::{Axiom, AxiomType, LineRange, SourceLocation};
use serde::{Deserialize, Serialize};

use crate::{build_enrichment_prompt, extract_toml, ChatModel, EnrichmentReport, EnrichmentResponse, LlmError};

/// Group key for axioms without a function
pub const GLOBAL_GROUP: &str = "__global__";

pub const DEFAULT_BATCH_SIZE: usize = 15;

const INFERRED_MODULE: &str = "llm_inferred";

/// Enrichment settings, loadable from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Function groups per model call
    pub batch_size: usize,
    /// Where responses are cached; no caching when unset
    pub cache_dir: Option<PathBuf>,
    /// Confidence of axioms the model infers
    pub confidence: f64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            cache_dir: None,
            confidence: 0.85,
        }
    }
}

impl EnrichConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, LlmError> {
        Ok(toml::from_str(s)?)
    }
}

/// Axioms grouped by function, in first-seen order
pub fn group_by_function(axioms: Vec<Axiom>) -> Vec<(String, Vec<Axiom>)> {
    let mut groups: Vec<(String, Vec<Axiom>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for axiom in axioms {
        let key = axiom.function.clone().unwrap_or_else(|| GLOBAL_GROUP.to_string());
        match positions.get(&key) {
            Some(&i) => groups[i].1.push(axiom),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![axiom]));
            }
        }
    }
    groups
}

/// Apply a model response to a batch
///
/// Existing axioms gain `on_violation` where they had none; unknown ids
/// become new axioms in `layer` with the given confidence. Returns the
/// number of enriched and inferred axioms.
pub fn parse_enrichment_response(
    response: &str,
    axioms: &mut Vec<Axiom>,
    layer: &str,
    confidence: f64,
) -> Result<(usize, usize), LlmError> {
    let body = extract_toml(response).trim();
    if body.is_empty() {
        return Err(LlmError::NoResponse);
    }
    let parsed: EnrichmentResponse = toml::from_str(body)?;

    // Validate before touching the batch so a bad entry leaves it untouched
    let mut inferred = Vec::new();
    for entry in &parsed.axioms {
        if entry.id.is_empty() || axioms.iter().any(|a| a.id == entry.id) {
            continue;
        }
        let axiom_type = match entry.axiom_type.as_deref() {
            Some(name) => AxiomType::parse(name).ok_or_else(|| LlmError::UnknownAxiomType(name.to_string()))?,
            None => AxiomType::Postcondition,
        };
        let source = SourceLocation::new("", INFERRED_MODULE, LineRange::single(0));
        let mut axiom = Axiom::new(entry.id.clone(), entry.content.clone(), axiom_type, source);
        axiom.formal_spec = entry.formal_spec.clone();
        axiom.layer = layer.to_string();
        axiom.confidence = confidence;
        axiom.function = entry.function.clone().filter(|f| !f.is_empty());
        axiom.on_violation = entry.on_violation.clone().filter(|v| !v.is_empty());
        inferred.push(axiom);
    }

    let mut enriched = 0;
    for entry in &parsed.axioms {
        let Some(on_violation) = entry.on_violation.as_deref().filter(|v| !v.is_empty()) else {
            continue;
        };
        if let Some(axiom) = axioms.iter_mut().find(|a| a.id == entry.id) {
            if axiom.on_violation.is_none() {
                axiom.on_violation = Some(on_violation.to_string());
                enriched += 1;
            }
        }
    }

    let mut added = 0;
    for axiom in inferred {
        if !axioms.iter().any(|a| a.id == axiom.id) {
            axioms.push(axiom);
            added += 1;
        }
    }
    Ok((enriched, added))
}

/// Sends axioms to a model in batches of whole function groups
pub struct Enricher<M> {
    model: M,
    config: EnrichConfig,
}

impl<M: ChatModel> Enricher<M> {
    pub fn new(model: M) -> Self {
        Self::with_config(model, EnrichConfig::default())
    }

    pub fn with_config(model: M, config: EnrichConfig) -> Self {
        Self { model, config }
    }

    /// Number of function groups per model call
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    pub fn enrich(&self, axioms: Vec<Axiom>) -> (Vec<Axiom>, EnrichmentReport) {
        let groups = group_by_function(axioms);
        let mut report = EnrichmentReport::default();
        let mut output = Vec::new();

        let mut groups = groups.into_iter().peekable();
        while groups.peek().is_some() {
            let batch: Vec<Axiom> = groups
                .by_ref()
                .take(self.config.batch_size.max(1))
                .flat_map(|(_, axioms)| axioms)
                .collect();
            report.batches += 1;
            output.extend(self.enrich_batch(batch, &mut report));
        }

        tracing::info!(
            batches = report.batches,
            failed = report.failed_batches,
            enriched = report.enriched,
            inferred = report.inferred,
            "enrichment finished"
        );
        (output, report)
    }

    fn enrich_batch(&self, batch: Vec<Axiom>, report: &mut EnrichmentReport) -> Vec<Axiom> {
        let layer = batch
            .first()
            .map(|a| a.layer.clone())
            .unwrap_or_else(|| axiom_model::DEFAULT_LAYER.to_string());
        let prompt = build_enrichment_prompt(&batch);

        let mut updated = batch.clone();
        let result = self
            .model
            .complete(&prompt)
            .and_then(|response| parse_enrichment_response(&response, &mut updated, &layer, self.config.confidence));
        match result {
            Ok((enriched, inferred)) => {
                report.enriched += enriched;
                report.inferred += inferred;
                updated
            }
            Err(e) => {
                tracing::warn!(batch = report.batches, "keeping original axioms: {e}");
                report.failed_batches += 1;
                batch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Scripted {
        responses: RefCell<Vec<Result<String, LlmError>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<String, LlmError>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl ChatModel for Scripted {
        fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.responses.borrow_mut().remove(0)
        }
    }

    fn axiom(id: &str, function: Option<&str>) -> Axiom {
        let source = SourceLocation::new("library/stdlib.k", "LIBC-STDLIB", LineRange::single(3));
        let mut axiom = Axiom::new(id, format!("content {id}"), AxiomType::Precondition, source);
        axiom.function = function.map(String::from);
        axiom.layer = "c11_stdlib".into();
        axiom
    }

    #[test]
    fn test_config_defaults_and_toml() {
        assert_eq!(EnrichConfig::default().batch_size, 15);
        let config = EnrichConfig::from_toml_str("batch_size = 4\ncache_dir = '.cache'").unwrap();
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.cache_dir, Some(PathBuf::from(".cache")));
        assert_eq!(config.confidence, 0.85);
    }

    #[test]
    fn test_group_by_function_keeps_order() {
        let groups = group_by_function(vec![
            axiom("a", Some("free")),
            axiom("b", None),
            axiom("c", Some("free")),
        ]);
        let keys: Vec<_> = groups.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        assert_eq!(keys, vec![("free", 2), (GLOBAL_GROUP, 1)]);
    }

    #[test]
    fn test_enrich_fills_and_infers() {
        let response = "```toml\n[[axioms]]\nid = '''a'''\non_violation = '''double free'''\n\n\
                        [[axioms]]\nid = '''free.inferred.postcond'''\ncontent = '''Memory is released.'''\n\
                        function = '''free'''\n```";
        let enricher = Enricher::new(Scripted::new(vec![Ok(response.to_string())]));
        let (axioms, report) = enricher.enrich(vec![axiom("a", Some("free"))]);

        assert_eq!(axioms.len(), 2);
        assert_eq!(axioms[0].on_violation.as_deref(), Some("double free"));
        let inferred = &axioms[1];
        assert_eq!(inferred.axiom_type, AxiomType::Postcondition);
        assert_eq!(inferred.module(), "llm_inferred");
        assert_eq!(inferred.layer, "c11_stdlib");
        assert_eq!(inferred.confidence, 0.85);
        assert_eq!(
            report,
            EnrichmentReport {
                batches: 1,
                failed_batches: 0,
                enriched: 1,
                inferred: 1
            }
        );
    }

    #[test]
    fn test_existing_on_violation_is_kept() {
        let mut original = axiom("a", Some("free"));
        original.on_violation = Some("UB".into());
        let response = "[[axioms]]\nid = 'a'\non_violation = 'something else'";
        let enricher = Enricher::new(Scripted::new(vec![Ok(response.to_string())]));
        let (axioms, report) = enricher.enrich(vec![original]);
        assert_eq!(axioms[0].on_violation.as_deref(), Some("UB"));
        assert_eq!(report.enriched, 0);
    }

    #[test]
    fn test_failures_keep_originals() {
        let model = Scripted::new(vec![
            Err(LlmError::Model("timeout".into())),
            Ok("not toml at all [[[".to_string()),
            Ok("[[axioms]]\nid = 'new'\naxiom_type = 'GUESS'".to_string()),
        ]);
        let enricher = Enricher::new(model).with_batch_size(1);
        let input = vec![axiom("a", Some("f")), axiom("b", Some("g")), axiom("c", Some("h"))];
        let (axioms, report) = enricher.enrich(input.clone());
        assert_eq!(axioms, input);
        assert_eq!(report.batches, 3);
        assert_eq!(report.failed_batches, 3);
    }

    #[test]
    fn test_batches_hold_whole_groups() {
        let model = Scripted::new(vec![Ok("[[axioms]]".into()), Ok("[[axioms]]".into())]);
        let enricher = Enricher::new(model).with_batch_size(2);
        let (axioms, report) = enricher.enrich(vec![
            axiom("a", Some("f")),
            axiom("b", Some("g")),
            axiom("c", Some("f")),
            axiom("d", None),
        ]);
        assert_eq!(axioms.len(), 4);
        assert_eq!(report.batches, 2);
        let prompts = enricher.model.prompts.borrow();
        assert!(prompts[0].contains("'''a'''") && prompts[0].contains("'''c'''"));
        assert!(prompts[1].contains("'''d'''"));
    }
}
