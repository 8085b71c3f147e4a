//! Atelier - The `$css` rune workshop for Sigil components.
//!
//! Rewrites components that reference classes through `$css("...")`:
//!
//! - `scan` - collect rune and native class references
//! - `transform_css` - classify, validate and escape stylesheet selectors
//! - `transform_runes` - replace rune calls with hashed class literals
//! - `preprocess` - the whole pipeline for one component
//!
//! # Example
//!
//! ```
//! use sigil_atelier::{preprocess, PreprocessOptions};
//! use sigil_carton::Hasher;
//!
//! let source = r#"<p class={$css("title")}>hi</p><style>.title { color: red }</style>"#;
//! let options = PreprocessOptions {
//!     hash: Hasher::custom(|_| "hash".to_string()),
//!     ..Default::default()
//! };
//! let output = preprocess(source, "App.svelte", &options).unwrap();
//! assert_eq!(
//!     output.code,
//!     r#"<p class={"title-hash"}>hi</p><style>:global(.title-hash) { color: red }</style>"#
//! );
//! ```

pub mod diagnostic;
pub mod error;
pub mod options;
pub mod permutation;
pub mod placement;
pub mod preprocess;
pub mod rune;
pub mod scan;
pub mod transform_css;
pub mod transform_runes;
pub mod warnings;


pub use diagnostic::{pretty_message, print_below, print_location, Location};
pub use error::{PreprocessError, RuneError, RuneErrorKind, TransformError};
pub use options::{MixedUseWarnings, PreprocessOptions, RUNE_CLASSES};
pub use permutation::MAX_PERMUTATION_SELECTORS;
pub use placement::{validate_placement, Occurrence, Placement};
pub use preprocess::{preprocess, PreprocessOutput};
pub use rune::RUNE_NAME;
pub use scan::{find_referenced_classes, ClassNameSet, ScanResult};
pub use transform_css::{transform_css, ClassNameMap, StyleOutput, StyleRewrite};
pub use transform_runes::transform_runes;
pub use warnings::mixed_use_warnings;
