//! File cache for model responses
//!
//! Each prompt maps to one JSON file under the cache directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{ChatModel, LlmError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedResponse {
    prompt_hash: String,
    response: String,
    cached_at: DateTime<Utc>,
}

/// Cache of model responses keyed by prompt
pub struct ResponseCache {
    cache_dir: PathBuf,
}

impl ResponseCache {
    /// Create a cache at the default location (.axiom/llm_cache/)
    pub fn new() -> Self {
        Self {
            cache_dir: PathBuf::from(".axiom/llm_cache"),
        }
    }

    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// The cached response for `prompt`, if one was stored
    pub fn get(&self, prompt: &str) -> Result<Option<String>, LlmError> {
        let key = Self::cache_key(prompt);
        let path = self.cache_path(&key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|source| LlmError::Cache {
            path: path.clone(),
            source,
        })?;
        let cached: CachedResponse = serde_json::from_str(&content)?;
        if cached.prompt_hash != key {
            return Ok(None);
        }
        Ok(Some(cached.response))
    }

    pub fn put(&self, prompt: &str, response: &str) -> Result<(), LlmError> {
        let key = Self::cache_key(prompt);
        let path = self.cache_path(&key);
        fs::create_dir_all(&self.cache_dir).map_err(|source| LlmError::Cache {
            path: self.cache_dir.clone(),
            source,
        })?;
        let entry = CachedResponse {
            prompt_hash: key,
            response: response.to_string(),
            cached_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&entry)?;
        fs::write(&path, json).map_err(|source| LlmError::Cache { path, source })
    }

    /// Remove every cached response
    pub fn clear(&self) -> std::io::Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// First 16 hex chars of the prompt's SHA-256
    pub fn cache_key(prompt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        format!("{:x}", hasher.finalize())[..16].to_string()
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{key}.json"))
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// A model whose answers are served from a [`ResponseCache`] when possible
pub struct CachedModel<M> {
    inner: M,
    cache: ResponseCache,
}

impl<M: ChatModel> CachedModel<M> {
    pub fn new(inner: M, cache: ResponseCache) -> Self {
        Self { inner, cache }
    }
}

impl<M: ChatModel> ChatModel for CachedModel<M> {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        match self.cache.get(prompt) {
            Ok(Some(response)) => {
                tracing::debug!(key = %ResponseCache::cache_key(prompt), "llm cache hit");
                return Ok(response);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("ignoring unreadable cache entry: {e}"),
        }
        let response = self.inner.complete(prompt)?;
        if let Err(e) = self.cache.put(prompt, &response) {
            tracing::warn!("failed to cache response: {e}");
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counting {
        calls: Cell<usize>,
    }

    impl ChatModel for Counting {
        fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.set(self.calls.get() + 1);
            Ok(format!("echo: {prompt}"))
        }
    }

    #[test]
    fn test_cache_key_is_stable() {
        let key = ResponseCache::cache_key("hello");
        assert_eq!(key.len(), 16);
        assert_eq!(key, ResponseCache::cache_key("hello"));
        assert_ne!(key, ResponseCache::cache_key("hello!"));
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::with_dir(dir.path().join("cache"));
        assert_eq!(cache.get("prompt").unwrap(), None);

        cache.put("prompt", "[[axioms]]").unwrap();
        assert_eq!(cache.get("prompt").unwrap().as_deref(), Some("[[axioms]]"));

        cache.clear().unwrap();
        assert_eq!(cache.get("prompt").unwrap(), None);
    }

    #[test]
    fn test_cached_model_calls_once() {
        let dir = tempfile::tempdir().unwrap();
        let model = CachedModel::new(
            Counting { calls: Cell::new(0) },
            ResponseCache::with_dir(dir.path()),
        );
        assert_eq!(model.complete("p").unwrap(), "echo: p");
        assert_eq!(model.complete("p").unwrap(), "echo: p");
        assert_eq!(model.inner.calls.get(), 1);
    }
}
