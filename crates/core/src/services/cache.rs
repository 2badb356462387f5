use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Disassembly text keyed by binary path, owned by the evaluator.
///
/// Only successful tool runs are cached, so a transient failure is retried on
/// the next analysis of the same path.
#[derive(Debug, Default)]
pub struct DisassemblyCache {
    entries: HashMap<PathBuf, Arc<str>>,
}

impl DisassemblyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, binary: &Path) -> Option<Arc<str>> {
        self.entries.get(binary).cloned()
    }

    /// Return the cached text, or fetch, store and return it.
    pub fn get_or_try_insert<E>(
        &mut self,
        binary: &Path,
        fetch: impl FnOnce() -> Result<String, E>,
    ) -> Result<Arc<str>, E> {
        if let Some(text) = self.get(binary) {
            return Ok(text);
        }
        let text: Arc<str> = fetch()?.into();
        self.entries.insert(binary.to_path_buf(), Arc::clone(&text));
        Ok(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
