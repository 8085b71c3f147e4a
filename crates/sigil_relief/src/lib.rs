//! Relief - The sculptured AST surface for Sigil components.
//!
//! A component is made of three logic regions (markup, instance script,
//! module script) and an optional stylesheet. Script and markup expressions
//! are kept as [oxc](https://oxc.rs) ASTs together with the absolute offset
//! of their source text, so every node can be mapped back to a byte range of
//! the original component. Stylesheets use the selector tree in [`css`].
//!
//! Traversal goes through the visitor traits in [`visit`], which carry an
//! immutable ancestor state downward.

pub mod ast;
pub mod css;
pub mod visit;

pub use ast::*;
pub use css::*;
pub use visit::{CssVisitor, TemplateVisitor};
