//! Cell-access pairing detection
//!
//! A configuration cell is written as `<name> ... </name>`. How a rule
//! touches a cell tells us which side of a resource lifecycle its function
//! sits on: writing into an empty map opens, emptying a map entry closes.

use axiom_model::{placeholder_id, Pairing, PairingSource, ParsedRule};
use axiom_parser::regex;
use std::collections::{BTreeSet, HashSet};

/// Cells that hold the K machine's own control state
pub const CONTROL_CELLS: &[&str] = &["k", "K", "T", "thread", "threads"];

/// How a single rule touches a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellAccess {
    /// `.Map => value`
    Write,
    /// `key |-> _ => .Map`
    Remove,
    /// `(old => new) ... |->`
    Modify,
    Read,
}

impl CellAccess {
    /// Checked in this order; the first match claims the cell for the rule
    pub const PRIORITY: [CellAccess; 4] = [
        CellAccess::Write,
        CellAccess::Remove,
        CellAccess::Modify,
        CellAccess::Read,
    ];

    pub fn matches(&self, content: &str) -> bool {
        match self {
            CellAccess::Write => regex!(r"(?s)\.Map\s*=>.").is_match(content),
            CellAccess::Remove => regex!(r"(?s)[^|]\|->\s*_?\s*=>\s*\.Map").is_match(content),
            CellAccess::Modify => regex!(r"(?s)\([^)]+=>[^)]+\).*\|->").is_match(content),
            CellAccess::Read => true,
        }
    }
}

/// One well-formed `<name>content</name>` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTouch<'a> {
    pub name: &'a str,
    pub content: &'a str,
}

/// Find cells whose content holds no nested tag and whose close tag matches
pub fn cell_touches(text: &str) -> Vec<CellTouch<'_>> {
    let mut touches = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('<') {
        let open = pos + offset;
        match touch_at(text, open) {
            Some((touch, end)) => {
                touches.push(touch);
                pos = end;
            }
            None => pos = open + 1,
        }
    }
    touches
}

fn touch_at(text: &str, open: usize) -> Option<(CellTouch<'_>, usize)> {
    let after = &text[open + 1..];
    let name_len = after
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(after.len());
    if name_len == 0 || !after[name_len..].starts_with('>') {
        return None;
    }
    let name = &after[..name_len];
    let content_start = open + 1 + name_len + 1;
    let content_len = text[content_start..].find('<')?;
    let content = &text[content_start..content_start + content_len];
    let close = format!("</{name}>");
    let close_at = content_start + content_len;
    if !text[close_at..].starts_with(&close) {
        return None;
    }
    Some((CellTouch { name, content }, close_at + close.len()))
}

/// Classify every cell a rule text touches, one access per cell
pub fn classify_cells(text: &str) -> Vec<(String, CellAccess)> {
    let touches = cell_touches(text);
    let mut seen = HashSet::new();
    let mut accesses = Vec::new();
    for access in CellAccess::PRIORITY {
        for touch in &touches {
            if !seen.contains(touch.name) && access.matches(touch.content) {
                seen.insert(touch.name);
                accesses.push((touch.name.to_string(), access));
            }
        }
    }
    accesses
}

/// Functions seen writing, removing and modifying one cell
#[derive(Debug, Default, Clone)]
struct CellUsers {
    writers: Vec<String>,
    removers: Vec<String>,
    modifiers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CellDetector {
    excluded: BTreeSet<String>,
}

impl Default for CellDetector {
    fn default() -> Self {
        Self::new(CONTROL_CELLS.iter().copied())
    }
}

impl CellDetector {
    pub fn new<'a>(excluded: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            excluded: excluded.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn is_excluded(&self, cell: &str) -> bool {
        self.excluded.contains(cell)
    }

    /// Pair functions through the cells their rules share
    ///
    /// Ids are `axiom_for_{function}` placeholders.
    pub fn detect(&self, rules: &[ParsedRule]) -> Vec<Pairing> {
        // Vec keeps cells in first-writer order
        let mut cells: Vec<(String, CellUsers)> = Vec::new();

        for rule in rules {
            let Some(function) = rule.function.as_deref() else {
                continue;
            };
            let text = format!("{} {}", rule.lhs, rule.rhs);
            for (cell, access) in classify_cells(&text) {
                if self.is_excluded(&cell) || access == CellAccess::Read {
                    continue;
                }
                let users = match cells.iter().position(|(name, _)| *name == cell) {
                    Some(i) => &mut cells[i].1,
                    None => {
                        cells.push((cell, CellUsers::default()));
                        let last = cells.len() - 1;
                        &mut cells[last].1
                    }
                };
                let list = match access {
                    CellAccess::Write => &mut users.writers,
                    CellAccess::Remove => &mut users.removers,
                    CellAccess::Modify => &mut users.modifiers,
                    CellAccess::Read => continue,
                };
                list.push(function.to_string());
            }
        }

        let mut emitter = Emitter::default();
        for (cell, users) in &cells {
            if users.writers.is_empty() {
                continue;
            }
            emitter.pair_all(cell, &users.writers, &users.removers, "writes", "removes", true, 1.0);
            emitter.pair_all(cell, &users.writers, &users.modifiers, "writes", "modifies", false, 0.8);
            emitter.pair_all(cell, &users.modifiers, &users.removers, "modifies", "removes", false, 0.8);
        }
        emitter.pairings
    }
}

#[derive(Default)]
struct Emitter {
    seen: HashSet<(String, String)>,
    pairings: Vec<Pairing>,
}

impl Emitter {
    #[allow(clippy::too_many_arguments)]
    fn pair_all(
        &mut self,
        cell: &str,
        openers: &[String],
        closers: &[String],
        opens: &str,
        closes: &str,
        required: bool,
        confidence: f64,
    ) {
        for opener in openers {
            for closer in closers {
                if opener == closer {
                    continue;
                }
                if !self.seen.insert((opener.clone(), closer.clone())) {
                    continue;
                }
                self.pairings.push(Pairing {
                    opener_id: placeholder_id(opener),
                    closer_id: placeholder_id(closer),
                    required,
                    source: PairingSource::KSemantics,
                    confidence,
                    cell: Some(cell.to_string()),
                    evidence: format!("Shared cell <{cell}>: {opener} {opens}, {closer} {closes}"),
                });
            }
        }
    }
}
