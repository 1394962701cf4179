//! Axiom model - Core types shared by the extraction pipeline
//!
//! This crate defines parsed rule records, axiom records, pairings,
//! idioms, and the JSON collections exchanged between pipeline stages.

mod location;
mod rule;
mod axiom;
mod pairing;

pub use location::*;
pub use rule::*;
pub use axiom::*;
pub use pairing::*;
