//! axiom-deps: Dependency resolution between axioms
//!
//! Two passes:
//! - Pass 1 (in `axiom-extract`) produces axioms and an `id -> rhs` table
//! - Pass 2 ([`DependencyResolver`]) indexes axioms by function, optionally
//!   on top of a lower layer's index, and links each axiom to the axioms of
//!   the functions its rule calls
//!
//! Calls that resolve to nothing are expected (primitives, external code)
//! and only counted.

mod calls;
mod cycle;
mod error;
mod index;
mod resolver;

pub use calls::CallScanner;
pub use cycle::{find_cycles, CycleDetector};
pub use error::DependencyError;
pub use index::FunctionIndex;
pub use resolver::{DependencyResolver, ResolutionReport};

use axiom_model::Axiom;
use std::collections::BTreeMap;

/// Index `axioms` (over an optional base layer) and fill their `depends_on`
pub fn resolve_dependencies(
    axioms: &mut [Axiom],
    rhs_by_id: &BTreeMap<String, String>,
    base: Option<&FunctionIndex>,
) -> (FunctionIndex, ResolutionReport) {
    let mut index = FunctionIndex::from_axioms(axioms.iter());
    if let Some(base) = base {
        index.merge_base(base);
    }
    let report = DependencyResolver::default().resolve(axioms, rhs_by_id, &index);
    (index, report)
}
