//! Stylesheet node types.
//!
//! Only the structure needed to locate and rewrite selectors is modelled.
//! Declarations and at-rule preludes are kept as raw ranges.

use sigil_carton::{CompactString, Span};

/// Component `<style>` block
#[derive(Debug, Clone)]
pub struct StyleSheet {
    pub children: Vec<CssNode>,
    /// Range of the style content (between the tags)
    pub content: Span,
    /// Range of the whole element
    pub span: Span,
}

/// Block-level stylesheet nodes
#[derive(Debug, Clone)]
pub enum CssNode {
    Rule(Rule),
    Atrule(Atrule),
    Declaration(Declaration),
}

impl CssNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Rule(n) => n.span,
            Self::Atrule(n) => n.span,
            Self::Declaration(n) => n.span,
        }
    }
}

/// `prelude { block }`
#[derive(Debug, Clone)]
pub struct Rule {
    pub prelude: SelectorList,
    pub block: Block,
    pub span: Span,
}

/// `@name prelude;` or `@name prelude { block }`
#[derive(Debug, Clone)]
pub struct Atrule {
    pub name: CompactString,
    pub prelude: Span,
    /// Keyframe bodies are kept opaque and have an empty block.
    pub block: Option<Block>,
    pub span: Span,
}

/// `{ ... }`
#[derive(Debug, Clone)]
pub struct Block {
    pub children: Vec<CssNode>,
    pub span: Span,
}

/// `property: value`
#[derive(Debug, Clone)]
pub struct Declaration {
    pub property: CompactString,
    pub value: Span,
    pub span: Span,
}

// ============================================================================
// Selectors
// ============================================================================

/// Comma separated list of complex selectors
#[derive(Debug, Clone)]
pub struct SelectorList {
    pub children: Vec<ComplexSelector>,
    pub span: Span,
}

/// Compound selectors joined by combinators, e.g. `.a > .b.c`
#[derive(Debug, Clone)]
pub struct ComplexSelector {
    pub children: Vec<RelativeSelector>,
    pub span: Span,
}

/// A compound selector and the combinator leading to it.
///
/// The simple selectors of one relative selector are written without a
/// combinator between them (`.b.c`).
#[derive(Debug, Clone)]
pub struct RelativeSelector {
    pub combinator: Option<Combinator>,
    pub selectors: Vec<SimpleSelector>,
    pub span: Span,
}

/// Combinator between compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combinator {
    pub kind: CombinatorKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombinatorKind {
    /// whitespace
    Descendant,
    /// `>`
    Child,
    /// `+`
    NextSibling,
    /// `~`
    SubsequentSibling,
    /// `||`
    Column,
}

impl CombinatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Descendant => " ",
            Self::Child => ">",
            Self::NextSibling => "+",
            Self::SubsequentSibling => "~",
            Self::Column => "||",
        }
    }
}

/// Simple selector kinds
#[derive(Debug, Clone)]
pub enum SimpleSelector {
    /// `div`, `*`
    Type(NamedSelector),
    /// `#id`
    Id(NamedSelector),
    /// `.class`
    Class(NamedSelector),
    /// `[attr=value]`
    Attribute(NamedSelector),
    /// `:hover`, `:is(...)`
    PseudoClass(PseudoClassSelector),
    /// `::before`
    PseudoElement(NamedSelector),
    /// `&`
    Nesting(Span),
}

impl SimpleSelector {
    pub fn span(&self) -> Span {
        match self {
            Self::Type(s) | Self::Id(s) | Self::Class(s) | Self::Attribute(s) => s.span,
            Self::PseudoElement(s) => s.span,
            Self::PseudoClass(s) => s.span,
            Self::Nesting(span) => *span,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Type(s) | Self::Id(s) | Self::Class(s) | Self::Attribute(s) => Some(&s.name),
            Self::PseudoElement(s) => Some(&s.name),
            Self::PseudoClass(s) => Some(&s.name),
            Self::Nesting(_) => None,
        }
    }
}

/// Selector identified by a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSelector {
    pub name: CompactString,
    pub span: Span,
}

/// `:name` or `:name(args)`
#[derive(Debug, Clone)]
pub struct PseudoClassSelector {
    pub name: CompactString,
    /// Parsed arguments for selector taking pseudo classes
    pub args: Option<SelectorList>,
    pub span: Span,
}

impl PseudoClassSelector {
    /// `:global(...)`
    pub fn is_global(&self) -> bool {
        self.name == "global"
    }
}
