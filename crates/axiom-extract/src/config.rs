//! Extraction configuration

use crate::error::Result;
use axiom_model::DEFAULT_LAYER;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Headers for the libc modules of the C semantics
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("LIBC-STDLIB", "stdlib.h"),
    ("LIBC-STRING", "string.h"),
    ("LIBC-STDIO", "stdio.h"),
    ("LIBC-MATH", "math.h"),
    ("LIBC-THREADS", "threads.h"),
    ("LIBC-SETJMP", "setjmp.h"),
    ("LIBC-STDARG", "stdarg.h"),
    ("LIBC-SIGNAL", "signal.h"),
    ("LIBC-CTYPE", "ctype.h"),
    ("LIBC-WCHAR", "wchar.h"),
    ("LIBC-TIME", "time.h"),
    ("LIBC-ERRNO", "errno.h"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Prefix of generated axiom ids
    pub id_prefix: String,
    /// Layer stamped on every axiom
    pub layer: String,
    /// Rule-file extension, without the dot
    pub file_extension: String,
    /// Modules starting with one of these are library modules
    pub library_module_prefixes: Vec<String>,
    /// Modules containing one of these are library modules
    pub library_module_markers: Vec<String>,
    /// Module -> header overrides
    pub headers: BTreeMap<String, String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            id_prefix: "c11".to_string(),
            layer: DEFAULT_LAYER.to_string(),
            file_extension: "k".to_string(),
            library_module_prefixes: vec!["LIBC".to_string(), "LIBCPP".to_string()],
            library_module_markers: vec!["STDLIB".to_string()],
            headers: BTreeMap::new(),
        }
    }
}

impl ExtractConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = crate::error::read_utf8(path)?;
        Self::from_toml_str(&text)
    }

    pub fn is_library_module(&self, module: &str) -> bool {
        self.library_module_prefixes.iter().any(|p| module.starts_with(p.as_str()))
            || self.library_module_markers.iter().any(|m| module.contains(m.as_str()))
    }

    pub fn header_for(&self, module: &str) -> Option<String> {
        if let Some(header) = self.headers.get(module) {
            return Some(header.clone());
        }
        DEFAULT_HEADERS
            .iter()
            .find(|(m, _)| *m == module)
            .map(|(_, h)| h.to_string())
    }
}
