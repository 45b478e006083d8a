//! A thread-safe, resizable cache for compiled artifacts.
//!
//! Compiling a pattern or an expression is expensive compared to looking it up. This crate
//! provides a least-recently-used cache keyed by source text, plus a registry that owns one such
//! cache for compiled patterns and one for compiled expressions.
//!
//! # Features
//!
//! - Thread-safe by default - no need for explicit synchronization
//! - Capacity can be changed at any time; shrinking evicts synchronously
//! - Capacities requested before first use take precedence over the defaults
//! - No unsafe code
//!
//! # Examples
//!
//! Basic usage with string keys and values:
//!
//! ```rust
//! use artifact_cache::{CacheError, LruCache};
//!
//! // Create a new cache holding at most 2 items
//! let cache = LruCache::with_capacity(2);
//!
//! cache.set("a", "compiled a").unwrap();
//! cache.set("b", "compiled b").unwrap();
//! cache.set("c", "compiled c").unwrap();
//!
//! assert_eq!(cache.get_if_present("a"), Err(CacheError::Miss));
//! assert_eq!(cache.get_if_present("c"), Ok("compiled c"));
//! ```
//!
//! Sharing the artifact caches between threads:
//!
//! ```rust
//! use artifact_cache::CacheRegistry;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let registry: Arc<CacheRegistry<Arc<String>, Arc<String>>> = Arc::new(CacheRegistry::new());
//! registry.set_capacities(128, 0);
//!
//! let registry_in_arc = Arc::clone(&registry);
//! let handle = thread::spawn(move || {
//!     let compiled = Arc::new(String::from("compiled [a-z]+"));
//!     registry_in_arc.regex().set(String::from("[a-z]+"), compiled).unwrap();
//! });
//!
//! handle.join().unwrap();
//!
//! assert!(registry.regex().get_if_present("[a-z]+").is_ok());
//! assert_eq!(registry.regex().capacity(), 128);
//! ```

#![forbid(unsafe_code)]
pub mod cache;
pub mod error;
pub mod registry;

pub use cache::LruCache;
pub use cache::stats::Stats;
pub use error::{CacheError, Result};
pub use registry::{CacheRegistry, RegistryConfig};
