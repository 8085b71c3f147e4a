//! Component and markup node types.

use oxc_ast::ast::{Expression, Program};
use sigil_carton::{CompactString, Span};

use crate::css::StyleSheet;

/// Node type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Root = 0,
    Element = 1,
    Text = 2,
    Comment = 3,
    ExpressionTag = 4,
    BlockTag = 5,
    Attribute = 6,
    SpreadAttribute = 7,
    Directive = 8,
    Script = 9,
}

// ============================================================================
// Root
// ============================================================================

/// Parsed component
#[derive(Debug)]
pub struct Root<'a> {
    /// Full component source
    pub source: &'a str,
    /// Markup outside of `<script>` and `<style>`
    pub fragment: Fragment<'a>,
    /// Per-instance `<script>`
    pub instance: Option<Script<'a>>,
    /// Module level `<script module>`
    pub module: Option<Script<'a>>,
    /// Component `<style>`
    pub css: Option<StyleSheet>,
}

impl<'a> Root<'a> {
    pub fn node_type(&self) -> NodeType {
        NodeType::Root
    }

    /// Script regions in source order of declaration: instance, then module.
    pub fn scripts(&self) -> impl Iterator<Item = &Script<'a>> {
        self.instance.iter().chain(self.module.iter())
    }
}

/// Script context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScriptContext {
    #[default]
    Instance,
    Module,
}

/// Script language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScriptLang {
    #[default]
    JavaScript,
    TypeScript,
}

/// `<script>` block
#[derive(Debug)]
pub struct Script<'a> {
    pub context: ScriptContext,
    pub lang: ScriptLang,
    pub program: Program<'a>,
    /// Range of the script content (between the tags)
    pub content: Span,
    /// Range of the whole element
    pub span: Span,
}

impl<'a> Script<'a> {
    pub fn node_type(&self) -> NodeType {
        NodeType::Script
    }

    /// Map a span of the parsed program to the component source.
    pub fn absolute(&self, span: oxc_span::Span) -> Span {
        Span::new(span.start, span.end).offset_by(self.content.start)
    }
}

// ============================================================================
// Template Nodes
// ============================================================================

/// Ordered list of template nodes
#[derive(Debug, Default)]
pub struct Fragment<'a> {
    pub nodes: Vec<TemplateNode<'a>>,
}

/// All template node types
#[derive(Debug)]
pub enum TemplateNode<'a> {
    Element(Element<'a>),
    Text(Text),
    Comment(Comment),
    ExpressionTag(ExpressionTag<'a>),
    BlockTag(BlockTag<'a>),
}

impl<'a> TemplateNode<'a> {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Element(_) => NodeType::Element,
            Self::Text(_) => NodeType::Text,
            Self::Comment(_) => NodeType::Comment,
            Self::ExpressionTag(_) => NodeType::ExpressionTag,
            Self::BlockTag(_) => NodeType::BlockTag,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Element(n) => n.span,
            Self::Text(n) => n.span,
            Self::Comment(n) => n.span,
            Self::ExpressionTag(n) => n.span,
            Self::BlockTag(n) => n.span,
        }
    }
}

/// Element or component node
#[derive(Debug)]
pub struct Element<'a> {
    pub name: CompactString,
    pub attributes: Vec<AttributeNode<'a>>,
    pub fragment: Fragment<'a>,
    pub is_self_closing: bool,
    pub span: Span,
}

impl<'a> Element<'a> {
    /// Components start with an uppercase letter or contain a dot.
    pub fn is_component(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_uppercase()) || self.name.contains('.')
    }

    /// Find a plain attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes.iter().find_map(|attr| match attr {
            AttributeNode::Attribute(a) if a.name == name => Some(a),
            _ => None,
        })
    }
}

/// Text node
#[derive(Debug, Clone)]
pub struct Text {
    pub data: CompactString,
    pub span: Span,
}

/// Comment node (`<!-- -->`)
#[derive(Debug, Clone)]
pub struct Comment {
    pub data: CompactString,
    pub span: Span,
}

/// JavaScript expression together with the offset of its source text
#[derive(Debug)]
pub struct JsExpression<'a> {
    pub node: Expression<'a>,
    /// Absolute offset the expression source starts at
    pub offset: u32,
}

impl<'a> JsExpression<'a> {
    /// Map a span of the parsed expression to the component source.
    pub fn absolute(&self, span: oxc_span::Span) -> Span {
        Span::new(span.start, span.end).offset_by(self.offset)
    }
}

/// `{expression}` in text or attribute position
#[derive(Debug)]
pub struct ExpressionTag<'a> {
    pub expression: JsExpression<'a>,
    /// Range including the braces
    pub span: Span,
}

/// Block tag flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockTagKind {
    /// `{#if ...}`, `{#each ...}`
    Open,
    /// `{:else ...}`, `{:then ...}`
    Continue,
    /// `{/if}`
    Close,
    /// `{@html ...}`, `{@const ...}`
    Special,
}

/// Logic block or special tag
///
/// Blocks are kept flat: an `{#if}` and its `{/if}` are sibling nodes.
#[derive(Debug)]
pub struct BlockTag<'a> {
    pub kind: BlockTagKind,
    /// Keyword after the sigil (`if`, `each`, `else`, `html`, ...)
    pub keyword: CompactString,
    /// Expression carried by the tag, if any
    pub expression: Option<JsExpression<'a>>,
    pub span: Span,
}

// ============================================================================
// Attributes
// ============================================================================

/// Attribute-position nodes
#[derive(Debug)]
pub enum AttributeNode<'a> {
    Attribute(Attribute<'a>),
    Spread(SpreadAttribute<'a>),
    Directive(Directive<'a>),
}

impl<'a> AttributeNode<'a> {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Attribute(_) => NodeType::Attribute,
            Self::Spread(_) => NodeType::SpreadAttribute,
            Self::Directive(_) => NodeType::Directive,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Attribute(n) => n.span,
            Self::Spread(n) => n.span,
            Self::Directive(n) => n.span,
        }
    }
}

/// `name`, `name="..."`, `name={...}` or `{name}`
#[derive(Debug)]
pub struct Attribute<'a> {
    pub name: CompactString,
    pub value: AttributeValue<'a>,
    pub span: Span,
}

/// Attribute value forms
#[derive(Debug)]
pub enum AttributeValue<'a> {
    /// Boolean attribute without value
    True,
    /// `name={expression}` or shorthand `{name}`
    Expression(ExpressionTag<'a>),
    /// Quoted or unquoted value, possibly interleaving text and expressions
    Chunks(Vec<ValueChunk<'a>>),
}

impl<'a> AttributeValue<'a> {
    /// The value when it is a single static text chunk.
    pub fn as_static_text(&self) -> Option<&Text> {
        match self {
            Self::Chunks(chunks) => match chunks.as_slice() {
                [ValueChunk::Text(text)] => Some(text),
                _ => None,
            },
            _ => None,
        }
    }
}

/// One piece of a chunked attribute value
#[derive(Debug)]
pub enum ValueChunk<'a> {
    Text(Text),
    Expression(ExpressionTag<'a>),
}

/// `{...expression}`
#[derive(Debug)]
pub struct SpreadAttribute<'a> {
    pub expression: JsExpression<'a>,
    pub span: Span,
}

/// Directive prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Class,
    Style,
    On,
    Bind,
    Use,
    Transition,
    In,
    Out,
    Animate,
    Let,
}

impl DirectiveKind {
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Some(match prefix {
            "class" => Self::Class,
            "style" => Self::Style,
            "on" => Self::On,
            "bind" => Self::Bind,
            "use" => Self::Use,
            "transition" => Self::Transition,
            "in" => Self::In,
            "out" => Self::Out,
            "animate" => Self::Animate,
            "let" => Self::Let,
            _ => return None,
        })
    }
}

/// `class:name={...}`, `on:click|once={...}`, ...
#[derive(Debug)]
pub struct Directive<'a> {
    pub kind: DirectiveKind,
    /// Name after the colon
    pub name: CompactString,
    pub modifiers: Vec<CompactString>,
    /// Value expression; a bare directive has none
    pub expression: Option<ExpressionTag<'a>>,
    pub span: Span,
}
