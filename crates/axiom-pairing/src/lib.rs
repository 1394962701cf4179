//! axiom-pairing: Opener/closer relationships between axioms
//!
//! Detectors:
//! - [`CellDetector`] pairs functions whose rules write and empty the same
//!   configuration cell
//! - [`NamingTable`] pairs names like `x_lock` / `x_unlock`
//! - [`SemanticTable`] holds curated library lifecycle relations
//! - [`PairingManifest`] reads hand-written pairings and idioms from TOML
//!
//! Detectors emit `axiom_for_{function}` placeholder ids;
//! [`resolve_placeholders`] swaps them for real ids from a
//! [`FunctionIndex`](axiom_deps::FunctionIndex).

mod cell;
mod error;
mod manifest;
mod naming;
mod resolver;
mod semantic;

pub use cell::{cell_touches, classify_cells, CellAccess, CellDetector, CellTouch, CONTROL_CELLS};
pub use error::PairingError;
pub use manifest::{ManifestIdiom, ManifestPairing, PairingManifest, MANIFEST_CONFIDENCE};
pub use naming::{NamingPattern, NamingTable, NAMING_CONFIDENCE};
pub use resolver::{function_names, resolve_placeholders, PairingResolver};
pub use semantic::{SemanticEntry, SemanticTable, SEMANTIC_CONFIDENCE};
