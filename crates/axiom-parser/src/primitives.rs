//! Internal primitive names

use std::collections::BTreeSet;

/// Semantic-internal constructors and helpers that are never library functions:
/// type wrappers, location helpers, container and map primitives, and
/// control-flow internals.
pub const K_PRIMITIVES: &[&str] = &[
    // Type wrappers
    "tv", "utype", "type", "ut", "t",
    // Location helpers
    "lnew", "loc", "base", "bnew", "obj",
    // Containers
    "list", "Map", "Set", "List", "ListItem", "SetItem",
    // Value categories
    "reval", "lval", "voidVal", "piece", "uninit",
    // Array helpers
    "makeArray", "fillArray",
    // Control flow internals
    "Computation", "Call",
    // Provenance
    "addProv", "fromArray",
    // Sizes and bounds
    "size", "max", "min",
    // Type helpers
    "stripStorageSpecifiers", "dynamicType", "pointerType", "arrayType",
    // String helpers
    "lengthString",
    // Pointer checks
    "isNull", "isNativeLoc", "NullPointer",
];

/// A set of names excluded from function resolution and call scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveSet {
    names: BTreeSet<String>,
}

impl PrimitiveSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Add names on top of the existing set
    pub fn with_extra<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for PrimitiveSet {
    fn default() -> Self {
        Self::new(K_PRIMITIVES.iter().copied())
    }
}
