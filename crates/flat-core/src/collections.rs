//! Hash map aliases used by the shadow tree and the state builder.
//!
//! Defaults to `hashbrown` keyed with `ahash`; the `std-hash` feature swaps in
//! the standard library maps. Construct with `Default::default()` so both
//! variants work.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub type HashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
    pub type HashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;
}
