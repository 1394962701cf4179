//! Cycle detection over `depends_on` edges
//!
//! Recursive rule sets make dependency cycles legitimate, so cycles are
//! reported as soft diagnostics rather than rejected.

use crate::DependencyError;
use axiom_model::Axiom;
use std::collections::HashMap;

/// Visit state for DFS cycle detection
#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    NotVisited,
    InProgress,
    Completed,
}

pub struct CycleDetector<'a> {
    axioms: &'a [Axiom],
    by_id: HashMap<&'a str, usize>,
}

impl<'a> CycleDetector<'a> {
    pub fn new(axioms: &'a [Axiom]) -> Self {
        let by_id = axioms
            .iter()
            .enumerate()
            .map(|(idx, a)| (a.id.as_str(), idx))
            .collect();
        Self { axioms, by_id }
    }

    /// One diagnostic per DFS tree that closes a loop
    pub fn detect_cycles(&self) -> Vec<DependencyError> {
        let mut errors = Vec::new();
        let mut state = vec![VisitState::NotVisited; self.axioms.len()];
        let mut path = Vec::new();

        for idx in 0..self.axioms.len() {
            if state[idx] == VisitState::NotVisited {
                path.clear();
                if let Some(cycle) = self.visit(idx, &mut state, &mut path) {
                    errors.push(cycle);
                }
            }
        }

        errors
    }

    fn visit(
        &self,
        node: usize,
        state: &mut [VisitState],
        path: &mut Vec<usize>,
    ) -> Option<DependencyError> {
        state[node] = VisitState::InProgress;
        path.push(node);

        for dep in &self.axioms[node].depends_on {
            let Some(&next) = self.by_id.get(dep.as_str()) else {
                continue;
            };
            if next == node {
                continue;
            }

            match state[next] {
                VisitState::InProgress => {
                    let start = path.iter().position(|&i| i == next)?;
                    let mut names: Vec<&str> = path[start..]
                        .iter()
                        .map(|&i| self.axioms[i].id.as_str())
                        .collect();
                    names.push(self.axioms[next].id.as_str());
                    return Some(DependencyError::Cycle {
                        cycle: names.join(" -> "),
                    });
                }
                VisitState::NotVisited => {
                    if let Some(err) = self.visit(next, state, path) {
                        return Some(err);
                    }
                }
                VisitState::Completed => {}
            }
        }

        path.pop();
        state[node] = VisitState::Completed;
        None
    }
}

/// Report dependency cycles, logging each as a warning
pub fn find_cycles(axioms: &[Axiom]) -> Vec<DependencyError> {
    let cycles = CycleDetector::new(axioms).detect_cycles();
    for cycle in &cycles {
        tracing::warn!(code = cycle.code(), "{cycle}");
    }
    cycles
}
