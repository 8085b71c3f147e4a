//! Carton - The artist's toolbox for Sigil.
//!
//! This crate provides the foundational utilities shared by every Sigil crate:
//! class name hashing, byte spans, and the edit buffer that collects
//! range-addressed rewrites against an immutable component source.
//!
//! # Example
//!
//! ```
//! use sigil_carton::{EditBuffer, Span};
//!
//! let source = r#"<span class={$css("a")}>x</span>"#;
//! let mut buffer = EditBuffer::new(source);
//! buffer.overwrite(Span::new(13, 22), "\"a-1x\"").unwrap();
//! assert_eq!(buffer.render(), r#"<span class={"a-1x"}>x</span>"#);
//! ```

pub mod edit;
pub mod hash;
pub mod span;

pub use edit::{EditBuffer, EditError, SourceMap, SourceMapping};
pub use hash::{HashFn, Hasher};
pub use span::Span;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};
