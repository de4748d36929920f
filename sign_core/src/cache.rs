//! # Solve Cache
//!
//! Bounded memo of solver envelopes. Because every solver is a pure function
//! of its input and the constants set, the key is
//!
//! ```text
//! SHA-256(solver name ‖ canonical input JSON ‖ ConstantsSet::fingerprint())
//! ```
//!
//! and a pack reload can never serve a stale entry: the fingerprint changes,
//! so the key does too. Once full, the oldest insertion is evicted.
//!
//! ## Example
//!
//! ```rust
//! use sign_core::cache::SolveCache;
//! use sign_core::calculations::{solve_foundation, FoundationInput};
//! use sign_core::constants::ConstantsSet;
//! use sign_core::envelope::Solver;
//!
//! let constants = ConstantsSet::builtin().unwrap();
//! let cache = SolveCache::new(64);
//! let input = FoundationInput::new(30.0, 1500.0, 3.0);
//!
//! let first = cache.get_or_solve(Solver::FoundationDepth, &input, &constants, |i, c| solve_foundation(i, c));
//! let second = cache.get_or_solve(Solver::FoundationDepth, &input, &constants, |i, c| solve_foundation(i, c));
//! assert_eq!(first, second);
//! assert_eq!(cache.stats().hits, 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

use crate::constants::ConstantsSet;
use crate::envelope::{canonical_json, sha256_hex, Envelope, Solver};

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug)]
struct Inner<T> {
    entries: HashMap<String, Envelope<T>>,
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

/// Thread-safe, bounded envelope cache for one result type.
#[derive(Debug)]
pub struct SolveCache<T> {
    capacity: usize,
    inner: Mutex<Inner<T>>,
}

/// Cache key for a solver call, or `None` if the input can't be serialized.
pub fn cache_key<I: Serialize>(solver: Solver, input: &I, constants: &ConstantsSet) -> Option<String> {
    let json = canonical_json(input).ok()?;
    let mut material = String::with_capacity(json.len() + 96);
    material.push_str(solver.name());
    material.push('\n');
    material.push_str(&json);
    material.push('\n');
    material.push_str(&constants.fingerprint());
    Some(sha256_hex(material.as_bytes()))
}

impl<T: Clone> SolveCache<T> {
    /// A cache holding at most `capacity` envelopes (minimum 1)
    pub fn new(capacity: usize) -> Self {
        SolveCache {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<Envelope<T>> {
        let mut inner = self.lock();
        let found = inner.entries.get(key).cloned();
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    pub fn insert(&self, key: String, envelope: Envelope<T>) {
        let mut inner = self.lock();
        if inner.entries.insert(key.clone(), envelope).is_some() {
            return;
        }
        inner.order.push_back(key);
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                debug!(key = %oldest, "solve cache evicted entry");
            }
        }
    }

    /// Return the cached envelope for this call, or run `solve` and cache it.
    ///
    /// The solver runs outside the lock; two threads racing on the same key
    /// both solve and the later insert wins, which is harmless since the
    /// answers are identical.
    pub fn get_or_solve<I, F>(&self, solver: Solver, input: &I, constants: &ConstantsSet, solve: F) -> Envelope<T>
    where
        I: Serialize,
        F: FnOnce(&I, &ConstantsSet) -> Envelope<T>,
    {
        let Some(key) = cache_key(solver, input, constants) else {
            return solve(input, constants);
        };
        if let Some(hit) = self.get(&key) {
            debug!(solver = solver.name(), "solve cache hit");
            return hit;
        }
        let envelope = solve(input, constants);
        self.insert(key, envelope.clone());
        envelope
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
        }
    }

    /// Drop every entry; the hit and miss counters are kept
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{solve_foundation, FoundationInput, FoundationResult};
    use std::sync::Arc;

    fn solve(cache: &SolveCache<FoundationResult>, input: &FoundationInput, constants: &ConstantsSet) -> Envelope<FoundationResult> {
        cache.get_or_solve(Solver::FoundationDepth, input, constants, |i, c| solve_foundation(i, c))
    }

    #[test]
    fn test_hit_returns_same_envelope() {
        let constants = ConstantsSet::builtin().unwrap();
        let cache = SolveCache::new(8);
        let input = FoundationInput::new(30.0, 1500.0, 3.0);

        let first = solve(&cache, &input, &constants);
        let second = solve(&cache, &input, &constants);
        assert_eq!(first, second);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, entries: 1 });
    }

    #[test]
    fn test_key_depends_on_solver_input_and_constants() {
        let constants = ConstantsSet::builtin().unwrap();
        let input = FoundationInput::new(30.0, 1500.0, 3.0);
        let base = cache_key(Solver::FoundationDepth, &input, &constants).unwrap();

        assert_ne!(base, cache_key(Solver::FoundationSchedule, &input, &constants).unwrap());
        let other = FoundationInput::new(31.0, 1500.0, 3.0);
        assert_ne!(base, cache_key(Solver::FoundationDepth, &other, &constants).unwrap());

        let mut altered = (*constants).clone();
        altered.footing.meta.sha256 = "0".repeat(64);
        assert_ne!(base, cache_key(Solver::FoundationDepth, &input, &altered).unwrap());
    }

    #[test]
    fn test_oldest_entry_evicted() {
        let constants = ConstantsSet::builtin().unwrap();
        let cache = SolveCache::new(2);
        let inputs: Vec<_> = [2.0, 3.0, 4.0].iter().map(|&d| FoundationInput::new(30.0, 1500.0, d)).collect();
        for input in &inputs {
            solve(&cache, input, &constants);
        }
        assert_eq!(cache.stats().entries, 2);

        let oldest = cache_key(Solver::FoundationDepth, &inputs[0], &constants).unwrap();
        let newest = cache_key(Solver::FoundationDepth, &inputs[2], &constants).unwrap();
        assert!(cache.get(&oldest).is_none());
        assert!(cache.get(&newest).is_some());
    }

    #[test]
    fn test_clear_forces_resolve() {
        let constants = ConstantsSet::builtin().unwrap();
        let cache = SolveCache::new(4);
        let input = FoundationInput::new(30.0, 1500.0, 3.0);
        solve(&cache, &input, &constants);
        cache.clear();
        assert_eq!(cache.stats().entries, 0);

        solve(&cache, &input, &constants);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2, entries: 1 });
    }

    #[test]
    fn test_shared_across_threads() {
        let constants = ConstantsSet::builtin().unwrap();
        let cache = Arc::new(SolveCache::new(16));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let constants = Arc::clone(&constants);
                std::thread::spawn(move || {
                    let input = FoundationInput::new(30.0, 1500.0, 3.0);
                    solve(&cache, &input, &constants).trace.content_sha256
                })
            })
            .collect();
        let hashes: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.stats().entries, 1);
    }
}
