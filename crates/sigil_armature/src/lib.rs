//! Armature - The structural parser framework for Sigil components.
//!
//! Splits a component into its top-level regions and builds the
//! [`sigil_relief`] tree:
//!
//! - `<script>` / `<script module>` bodies are parsed as oxc programs
//! - markup is parsed into elements, text and tags; every `{...}`
//!   expression is parsed with oxc and keeps its absolute offset
//! - the `<style>` body is parsed into rules and selector trees
//!
//! All nodes carry byte spans into the original source.
//!
//! ```
//! use oxc_allocator::Allocator;
//! use sigil_armature::parse;
//!
//! let allocator = Allocator::default();
//! let root = parse(&allocator, "<p class=\"a\">hi</p><style>.a { color: red }</style>").unwrap();
//! assert_eq!(root.fragment.nodes.len(), 1);
//! assert!(root.css.is_some());
//! ```

mod css;
mod error;
mod js;
mod markup;

pub use css::{parse_selector_list, parse_stylesheet};
pub use error::ParseError;
pub use markup::parse;
