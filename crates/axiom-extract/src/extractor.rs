//! Pass 1: rule files to axioms
//!
//! Runs tokenizer, parser and builder over every rule file under a root.
//! Each file is isolated: a file that cannot be read is logged and skipped.
//! The parsed rules and an `axiom id -> rhs` table are kept for the
//! dependency and pairing passes.

use crate::builder::AxiomBuilder;
use crate::config::ExtractConfig;
use crate::error::{read_utf8, ExtractError, Result};
use axiom_model::{Axiom, ParsedRule};
use axiom_parser::RuleParser;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use walkdir::WalkDir;

/// Output of extracting one file
#[derive(Debug, Clone, Default)]
pub struct FileExtraction {
    pub rules: Vec<ParsedRule>,
    pub axioms: Vec<Axiom>,
    /// Right-hand side of the rule each axiom came from
    pub rhs_by_id: BTreeMap<String, String>,
}

/// Counts for judging how complete a run was
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub files_seen: usize,
    pub files_failed: usize,
    pub rules_parsed: usize,
    pub axioms_built: usize,
    pub duplicate_ids: usize,
}

/// Output of extracting a directory tree
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub axioms: Vec<Axiom>,
    pub rules: Vec<ParsedRule>,
    pub rhs_by_id: BTreeMap<String, String>,
    pub report: ExtractionReport,
}

impl Extraction {
    fn absorb(&mut self, file: FileExtraction, seen: &mut HashSet<String>) {
        self.report.rules_parsed += file.rules.len();
        self.rules.extend(file.rules);
        for axiom in file.axioms {
            if !seen.insert(axiom.id.clone()) {
                self.report.duplicate_ids += 1;
                continue;
            }
            if let Some(rhs) = file.rhs_by_id.get(&axiom.id) {
                self.rhs_by_id.insert(axiom.id.clone(), rhs.clone());
            }
            self.axioms.push(axiom);
        }
        self.report.axioms_built = self.axioms.len();
    }
}

pub struct Extractor {
    parser: RuleParser,
    builder: AxiomBuilder,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self {
            parser: RuleParser::new(),
            builder: AxiomBuilder::new(config),
        }
    }

    pub fn with_parts(parser: RuleParser, builder: AxiomBuilder) -> Self {
        Self { parser, builder }
    }

    pub fn config(&self) -> &ExtractConfig {
        self.builder.config()
    }

    /// Extract axioms from rule-file text
    pub fn extract_source(&self, source: &str, source_file: &str) -> FileExtraction {
        let rules = self.parser.parse_source(source, source_file);
        let mut out = FileExtraction::default();

        for rule in &rules {
            let Some(axiom) = self.builder.build(rule) else {
                continue;
            };
            if out.rhs_by_id.contains_key(&axiom.id) {
                continue;
            }
            out.rhs_by_id.insert(axiom.id.clone(), rule.rhs.clone());
            out.axioms.push(axiom);
        }

        out.rules = rules;
        out
    }

    /// Extract one file, naming it relative to `root`
    pub fn extract_file(&self, path: &Path, root: &Path) -> Result<FileExtraction> {
        let source = read_utf8(path)?;
        let name = path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/");
        Ok(self.extract_source(&source, &name))
    }

    /// Extract every rule file under `root`
    pub fn extract_dir(&self, root: &Path) -> Result<Extraction> {
        if !root.exists() {
            return Err(ExtractError::MissingRoot(root.to_path_buf()));
        }

        let mut extraction = Extraction::default();
        let mut seen = HashSet::new();
        let extension = self.config().file_extension.as_str();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    extraction.report.files_failed += 1;
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|s| s.to_str()) != Some(extension)
            {
                continue;
            }

            extraction.report.files_seen += 1;
            match self.extract_file(path, root) {
                Ok(file) => extraction.absorb(file, &mut seen),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to parse rule file");
                    extraction.report.files_failed += 1;
                }
            }
        }

        tracing::info!(
            files = extraction.report.files_seen,
            failed = extraction.report.files_failed,
            rules = extraction.report.rules_parsed,
            axioms = extraction.report.axioms_built,
            "extraction finished"
        );

        Ok(extraction)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractConfig::default())
    }
}
