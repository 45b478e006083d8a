//! The pair of named artifact caches shared by a scanning pipeline.
//!
//! A [`CacheRegistry`] owns one cache for compiled patterns and one for compiled expressions,
//! both keyed by their source text. The caches are created on first access so that capacities
//! requested beforehand with [`CacheRegistry::set_capacities`] are used instead of the defaults.

use crate::LruCache;
use parking_lot::Mutex;
use std::sync::OnceLock;
use tracing::debug;

/// Capacity of the pattern cache when nothing else is configured.
pub const DEFAULT_REGEX_CAPACITY: usize = 4096;

/// Capacity of the expression cache when nothing else is configured.
pub const DEFAULT_DSL_CAPACITY: usize = 4096;

/// Initial capacities for a [`CacheRegistry`]. Zero selects the built-in default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    pub regex_capacity: usize,
    pub dsl_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            regex_capacity: DEFAULT_REGEX_CAPACITY,
            dsl_capacity: DEFAULT_DSL_CAPACITY,
        }
    }
}

#[derive(Debug, Default)]
struct PendingCapacities {
    regex: Option<usize>,
    dsl: Option<usize>,
}

#[derive(Debug)]
struct Stores<P, E> {
    regex: LruCache<String, P>,
    dsl: LruCache<String, E>,
}

/// Lazily initialized holder of the pattern cache and the expression cache.
///
/// Share it between threads by wrapping it in [`std::sync::Arc`]; every method takes `&self`.
///
/// ```rust
/// use artifact_cache::{CacheError, CacheRegistry};
///
/// let registry: CacheRegistry<String, String> = CacheRegistry::new();
/// registry.set_capacities(2, 0);
///
/// let patterns = registry.regex();
/// for pattern in ["a", "b", "c"] {
///     patterns.set(pattern.to_string(), format!("compiled {pattern}")).unwrap();
/// }
///
/// assert_eq!(patterns.get_if_present("a"), Err(CacheError::Miss));
/// assert_eq!(patterns.len(), 2);
/// ```
#[derive(Debug)]
pub struct CacheRegistry<P, E> {
    config: RegistryConfig,
    // Held while the stores are built so a concurrent `set_capacities` is never lost.
    pending: Mutex<PendingCapacities>,
    stores: OnceLock<Stores<P, E>>,
}

impl<P, E> Default for CacheRegistry<P, E>
where
    P: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, E> CacheRegistry<P, E>
where
    P: Clone,
    E: Clone,
{
    /// Creates a registry using the built-in default capacities.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates a registry whose caches start with the capacities in `config`, unless
    /// [`set_capacities`](CacheRegistry::set_capacities) overrides them before first use.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            pending: Mutex::new(PendingCapacities::default()),
            stores: OnceLock::new(),
        }
    }

    /// Returns the compiled-pattern cache, creating both caches on first use.
    pub fn regex_store(&self) -> &LruCache<String, P> {
        &self.stores().regex
    }

    /// Returns the compiled-expression cache, creating both caches on first use.
    pub fn dsl_store(&self) -> &LruCache<String, E> {
        &self.stores().dsl
    }

    pub fn regex(&self) -> &LruCache<String, P> {
        self.regex_store()
    }

    pub fn dsl(&self) -> &LruCache<String, E> {
        self.dsl_store()
    }

    /// Whether the caches have been created.
    pub fn is_initialized(&self) -> bool {
        self.stores.get().is_some()
    }

    /// Requests new capacities for the pattern and expression caches.
    ///
    /// A zero or negative value leaves the corresponding cache untouched. Before first use, the
    /// positive values are remembered and applied when the caches are created. Afterwards they
    /// resize the live caches in place, evicting least recently used entries when shrinking.
    pub fn set_capacities(&self, regex_capacity: i64, dsl_capacity: i64) {
        let regex = positive(regex_capacity);
        let dsl = positive(dsl_capacity);

        if let Some(stores) = self.stores.get() {
            Self::resize(stores, regex, dsl);
            return;
        }

        let mut pending = self.pending.lock();

        // The stores may have been created while we waited for the lock.
        if let Some(stores) = self.stores.get() {
            drop(pending);
            Self::resize(stores, regex, dsl);
            return;
        }

        if regex.is_some() {
            pending.regex = regex;
        }
        if dsl.is_some() {
            pending.dsl = dsl;
        }
        debug!(
            regex = ?pending.regex,
            dsl = ?pending.dsl,
            "recorded artifact cache capacities for initialization"
        );
    }

    fn stores(&self) -> &Stores<P, E> {
        if let Some(stores) = self.stores.get() {
            return stores;
        }

        let pending = self.pending.lock();
        self.stores.get_or_init(|| {
            let regex_capacity = pending
                .regex
                .unwrap_or_else(|| or_default(self.config.regex_capacity, DEFAULT_REGEX_CAPACITY));
            let dsl_capacity = pending
                .dsl
                .unwrap_or_else(|| or_default(self.config.dsl_capacity, DEFAULT_DSL_CAPACITY));

            debug!(regex_capacity, dsl_capacity, "initialized artifact caches");

            Stores {
                regex: LruCache::with_capacity(regex_capacity),
                dsl: LruCache::with_capacity(dsl_capacity),
            }
        })
    }

    fn resize(stores: &Stores<P, E>, regex: Option<usize>, dsl: Option<usize>) {
        if let Some(capacity) = regex {
            stores.regex.set_capacity(capacity);
            debug!(capacity, "resized pattern cache");
        }
        if let Some(capacity) = dsl {
            stores.dsl.set_capacity(capacity);
            debug!(capacity, "resized expression cache");
        }
    }
}

fn positive(capacity: i64) -> Option<usize> {
    usize::try_from(capacity).ok().filter(|capacity| *capacity > 0)
}

fn or_default(capacity: usize, default: usize) -> usize {
    if capacity == 0 { default } else { capacity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheError;
    use regex::Regex;
    use rhai::{AST, Engine};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    type ArtifactRegistry = CacheRegistry<Regex, Arc<AST>>;

    #[test]
    fn it_caches_compiled_patterns() {
        // given
        let registry = ArtifactRegistry::new();
        let pattern = "abc(\n)?123";
        let re = Regex::new(pattern).unwrap();

        // when
        registry.regex().set(pattern.to_string(), re.clone()).unwrap();

        // then
        let cached = registry.regex().get_if_present(pattern).unwrap();
        assert_eq!(cached.as_str(), re.as_str());
        assert!(cached.is_match("abc\n123"));
    }

    #[test]
    fn it_caches_compiled_expressions() {
        // given
        let registry = ArtifactRegistry::new();
        let engine = Engine::new();
        let expr = "1 + 2 == 3";
        let ast = Arc::new(engine.compile_expression(expr).unwrap());

        // when
        registry.dsl().set(expr.to_string(), Arc::clone(&ast)).unwrap();

        // then
        let cached = registry.dsl().get_if_present(expr).unwrap();
        assert!(Arc::ptr_eq(&cached, &ast));
        assert!(engine.eval_ast::<bool>(&cached).unwrap());
    }

    #[test]
    fn it_initializes_lazily_with_defaults() {
        // given
        let registry = ArtifactRegistry::new();
        assert!(!registry.is_initialized());

        // when
        let patterns = registry.regex();

        // then
        assert!(registry.is_initialized());
        assert_eq!(patterns.capacity(), DEFAULT_REGEX_CAPACITY);
        assert_eq!(registry.dsl().capacity(), DEFAULT_DSL_CAPACITY);
        assert!(std::ptr::eq(patterns, registry.regex_store()));
    }

    #[test]
    fn it_uses_configured_capacities() {
        // given
        let registry = ArtifactRegistry::with_config(RegistryConfig {
            regex_capacity: 16,
            dsl_capacity: 0,
        });

        // when
        let regex_capacity = registry.regex().capacity();
        let dsl_capacity = registry.dsl().capacity();

        // then
        assert_eq!(regex_capacity, 16);
        assert_eq!(dsl_capacity, DEFAULT_DSL_CAPACITY);
    }

    #[test]
    fn it_evicts_by_capacity() {
        // given
        let registry = ArtifactRegistry::new();
        registry.set_capacities(3, 3);
        let patterns = registry.regex();

        // when
        for key in ["a", "b", "c", "d", "e"] {
            patterns.set(key.to_string(), Regex::new(key).unwrap()).unwrap();
        }

        // then
        assert_eq!(patterns.get_if_present("a").unwrap_err(), CacheError::Miss);
        assert_eq!(patterns.get_if_present("b").unwrap_err(), CacheError::Miss);
        assert!(patterns.get_if_present("c").is_ok());
        assert_eq!(patterns.len(), 3);
    }

    #[test]
    fn it_does_not_touch_caches_on_zero_capacities() {
        // given
        let registry = ArtifactRegistry::new();
        registry.set_capacities(4, 4);
        registry.regex().set("k".to_string(), Regex::new("k").unwrap()).unwrap();
        assert!(registry.regex().get_if_present("k").is_ok());

        // when
        registry.set_capacities(0, 0);
        registry.set_capacities(-1, -7);

        // then
        assert!(registry.regex().get_if_present("k").is_ok());
        assert_eq!(registry.regex().capacity(), 4);
        assert_eq!(registry.dsl().capacity(), 4);
    }

    #[test]
    fn it_honors_capacities_set_before_first_use() {
        // given
        let registry = ArtifactRegistry::new();
        registry.set_capacities(2, 0);
        assert!(!registry.is_initialized());

        // when
        let patterns = registry.regex();
        for key in ["a", "b", "c"] {
            patterns.set(key.to_string(), Regex::new(key).unwrap()).unwrap();
        }

        // then
        assert_eq!(patterns.get_if_present("a").unwrap_err(), CacheError::Miss);
        assert_eq!(patterns.len(), 2);
        assert_eq!(registry.dsl().capacity(), DEFAULT_DSL_CAPACITY);
    }

    #[test]
    fn it_keeps_earlier_pending_capacities_on_zero() {
        // given
        let registry = ArtifactRegistry::new();
        registry.set_capacities(5, 6);

        // when
        registry.set_capacities(0, 7);

        // then
        assert_eq!(registry.regex().capacity(), 5);
        assert_eq!(registry.dsl().capacity(), 7);
    }

    #[test]
    fn it_resizes_stores_independently() {
        // given
        let registry = ArtifactRegistry::new();
        registry.set_capacities(8, 8);
        for i in 0..8 {
            let key = format!("p{i}");
            registry.regex().set(key.clone(), Regex::new(&key).unwrap()).unwrap();
        }

        // when
        registry.set_capacities(2, 0);

        // then
        assert_eq!(registry.regex().capacity(), 2);
        assert_eq!(registry.regex().len(), 2);
        assert!(registry.regex().contains("p7"));
        assert_eq!(registry.dsl().capacity(), 8);
    }

    #[test]
    fn it_initializes_once_under_contention() {
        // given
        let registry = Arc::new(ArtifactRegistry::new());
        registry.set_capacities(2, 0);
        let mut handles = vec![];

        // when
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                let patterns = registry.regex();
                (patterns as *const LruCache<String, Regex> as usize, patterns.capacity())
            }));
        }

        let observed: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // then
        let first = observed[0].0;
        for (address, capacity) in observed {
            assert_eq!(address, first);
            assert_eq!(capacity, 2);
        }
    }

    #[test]
    fn it_survives_concurrent_access_and_reconfiguration() {
        // given
        let registry = Arc::new(ArtifactRegistry::new());
        registry.set_capacities(64, 64);
        let engine = Engine::new();
        let ast = Arc::new(engine.compile_expression("1+2==3").unwrap());
        registry.dsl().set("1+2==3".to_string(), ast).unwrap();
        let deadline = Instant::now() + Duration::from_millis(300);

        // when
        let worker = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let re = Regex::new("a").unwrap();
                for i in 0..5000 {
                    let key = format!("k{}", (b'a' + (i % 26) as u8) as char);
                    registry.regex().set(key.clone(), re.clone()).unwrap();
                    let _ = registry.regex().get_if_present(&key);
                    let _ = registry.dsl().get_if_present("1+2==3");
                }
            })
        };

        let reader = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                while Instant::now() < deadline {
                    let _ = registry.regex().get_if_present("ka");
                    let _ = registry.dsl().get_if_present("1+2==3");
                }
            })
        };

        for i in 0..200 {
            registry.set_capacities(64 + (i % 5), 64 + ((i + 1) % 5));
        }

        worker.join().unwrap();
        reader.join().unwrap();

        // then
        let patterns = registry.regex();
        assert!(patterns.len() <= patterns.capacity());
        assert!((64..69).contains(&patterns.capacity()));
        assert!(registry.dsl().get_if_present("1+2==3").is_ok());
    }
}
