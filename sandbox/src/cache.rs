//! Compiled-module cache keyed by the blake3 hash of the bytecode.
//!
//! Compilation dominates the cost of a short contract call, and the same
//! contract is typically invoked many times. Once `capacity` is reached the
//! least recently used module is evicted.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use lru::LruCache;
use wasmtime::{Engine, Module};

use crate::error::SandboxError;
use crate::validation::validate_module;

type CodeHash = [u8; 32];

/// Bounded cache of validated modules.
pub struct ModuleCache {
    capacity: usize,
    /// `None` when caching is disabled.
    modules: Option<Mutex<LruCache<CodeHash, Module>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ModuleCache {
    /// A cache holding up to `capacity` modules; 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            modules: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the compiled module for `code`, compiling and validating it
    /// on a miss.
    pub fn get_or_compile(&self, engine: &Engine, code: &[u8]) -> Result<Module, SandboxError> {
        let key: CodeHash = *blake3::hash(code).as_bytes();

        if let Some(modules) = &self.modules {
            if let Some(module) = lock(modules).get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(module.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let module =
            Module::new(engine, code).map_err(|e| SandboxError::CompileError(format!("{:#}", e)))?;
        validate_module(&module)?;

        if let Some(modules) = &self.modules {
            if let Some((evicted, _)) = lock(modules).push(key, module.clone()) {
                if evicted != key {
                    log::trace!("module cache evicted {}", blake3::Hash::from(evicted).to_hex());
                }
            }
        }
        Ok(module)
    }

    pub fn len(&self) -> usize {
        self.modules.as_ref().map_or(0, |m| lock(m).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        if let Some(modules) = &self.modules {
            lock(modules).clear();
        }
    }
}

fn lock(modules: &Mutex<LruCache<CodeHash, Module>>) -> std::sync::MutexGuard<'_, LruCache<CodeHash, Module>> {
    modules.lock().unwrap_or_else(|e| e.into_inner())
}

impl std::fmt::Debug for ModuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}
