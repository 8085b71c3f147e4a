//! Component markup parser.
//!
//! A single forward pass over the source. Top-level `<script>` and `<style>`
//! elements are split off into their own regions; everything else becomes
//! the markup fragment. Blocks (`{#if}` ... `{/if}`) are kept flat.

use memchr::{memchr, memchr2, memmem};
use oxc_allocator::Allocator;
use phf::phf_set;
use sigil_carton::{CompactString, Span};
use sigil_relief::*;
use tracing::debug;

use crate::css::parse_stylesheet;
use crate::js::{find_closing_brace, find_top_level, parse_expression, parse_program};
use crate::ParseError;

static VOID_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
};

/// Elements whose content is not markup.
static RAW_TEXT_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "script", "style",
};

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

#[inline]
fn is_tag_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.') || b >= 0x80
}

#[inline]
fn is_attribute_name_end(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b'=' | b'>' | b'"' | b'\'' | b'{')
}

/// Parse a component into its syntax tree.
///
/// Expressions and scripts are allocated in `allocator`.
pub fn parse<'a>(allocator: &'a Allocator, source: &'a str) -> Result<Root<'a>, ParseError> {
    let lang = detect_script_lang(source);
    let mut parser = Parser {
        allocator,
        source,
        bytes: source.as_bytes(),
        pos: 0,
        lang,
        instance: None,
        module: None,
        css: None,
    };
    let nodes = parser.parse_nodes(None)?;
    debug!(
        nodes = nodes.len(),
        instance = parser.instance.is_some(),
        module = parser.module.is_some(),
        css = parser.css.is_some(),
        "parsed component"
    );
    Ok(Root {
        source,
        fragment: Fragment { nodes },
        instance: parser.instance,
        module: parser.module,
        css: parser.css,
    })
}

/// Markup expressions follow the language of the component's scripts.
fn detect_script_lang(source: &str) -> ScriptLang {
    let bytes = source.as_bytes();
    let mut from = 0;
    while let Some(found) = memmem::find(&bytes[from..], b"<script") {
        let start = from + found;
        let Some(close) = memchr(b'>', &bytes[start..]) else {
            break;
        };
        let tag = &source[start..start + close];
        if tag.contains("lang=\"ts\"")
            || tag.contains("lang='ts'")
            || tag.contains("lang=\"typescript\"")
            || tag.contains("lang='typescript'")
        {
            return ScriptLang::TypeScript;
        }
        from = start + close;
    }
    ScriptLang::JavaScript
}

struct Parser<'a> {
    allocator: &'a Allocator,
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    lang: ScriptLang,
    instance: Option<Script<'a>>,
    module: Option<Script<'a>>,
    css: Option<StyleSheet>,
}

/// Opening tag as read by [`Parser::parse_tag`].
struct Tag<'a> {
    name: CompactString,
    attributes: Vec<AttributeNode<'a>>,
    self_closing: bool,
    start: usize,
}

impl<'a> Parser<'a> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn starts_with(&self, s: &str) -> bool {
        self.bytes[self.pos..].starts_with(s.as_bytes())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
    }

    fn expression(&self, start: usize, end: usize) -> Result<JsExpression<'a>, ParseError> {
        parse_expression(self.allocator, self.source, start, end, self.lang)
    }

    /// Parse nodes until the closing tag of `parent` or the end of input.
    fn parse_nodes(&mut self, parent: Option<&str>) -> Result<Vec<TemplateNode<'a>>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            let Some(byte) = self.peek() else {
                if let Some(parent) = parent {
                    return Err(ParseError::new(
                        format!("<{}> was left open", parent),
                        self.pos,
                    ));
                }
                return Ok(nodes);
            };
            match byte {
                b'<' if self.starts_with("<!--") => {
                    nodes.push(TemplateNode::Comment(self.parse_comment()?));
                }
                b'<' if self.starts_with("</") => {
                    let start = self.pos;
                    let name = self.parse_closing_tag()?;
                    return match parent {
                        Some(parent) if parent == name.as_str() => Ok(nodes),
                        _ => Err(ParseError::new(
                            format!("</{}> attempted to close an element that was not open", name),
                            start,
                        )),
                    };
                }
                b'<' => {
                    if let Some(node) = self.parse_element(parent.is_none())? {
                        nodes.push(node);
                    }
                }
                b'{' => nodes.push(self.parse_tag_node()?),
                _ => nodes.push(TemplateNode::Text(self.parse_text())),
            }
        }
    }

    fn parse_text(&mut self) -> Text {
        let start = self.pos;
        let end = memchr2(b'<', b'{', &self.bytes[start..]).map_or(self.bytes.len(), |n| start + n);
        self.pos = end;
        Text {
            data: CompactString::new(&self.source[start..end]),
            span: Span::new(start as u32, end as u32),
        }
    }

    fn parse_comment(&mut self) -> Result<Comment, ParseError> {
        let start = self.pos;
        let body = start + 4;
        let close = memmem::find(&self.bytes[body..], b"-->")
            .ok_or_else(|| ParseError::new("Unterminated comment", start))?;
        self.pos = body + close + 3;
        Ok(Comment {
            data: CompactString::new(&self.source[body..body + close]),
            span: Span::new(start as u32, self.pos as u32),
        })
    }

    /// `</name>`; returns the name.
    fn parse_closing_tag(&mut self) -> Result<CompactString, ParseError> {
        let start = self.pos;
        self.pos += 2;
        let name_start = self.pos;
        while self.peek().is_some_and(is_tag_name_char) {
            self.pos += 1;
        }
        let name = CompactString::new(&self.source[name_start..self.pos]);
        self.skip_whitespace();
        if self.peek() != Some(b'>') {
            return Err(ParseError::new("Expected >", start));
        }
        self.pos += 1;
        Ok(name)
    }

    /// Element, or `None` for top-level `<script>`/`<style>` which are
    /// moved into their own regions.
    fn parse_element(&mut self, top_level: bool) -> Result<Option<TemplateNode<'a>>, ParseError> {
        if self.starts_with("<!") {
            // doctype and similar declarations are kept as comments
            let start = self.pos;
            let close = memchr(b'>', &self.bytes[start..])
                .ok_or_else(|| ParseError::new("Expected >", start))?;
            self.pos = start + close + 1;
            return Ok(Some(TemplateNode::Comment(Comment {
                data: CompactString::new(&self.source[start + 2..start + close]),
                span: Span::new(start as u32, self.pos as u32),
            })));
        }

        let tag = self.parse_tag()?;
        if top_level && !tag.self_closing && (tag.name == "script" || tag.name == "style") {
            self.parse_special_block(tag)?;
            return Ok(None);
        }

        let fragment = if tag.self_closing || VOID_ELEMENTS.contains(tag.name.as_str()) {
            Fragment::default()
        } else if tag.name == "textarea" {
            Fragment {
                nodes: self.parse_textarea_body()?,
            }
        } else if RAW_TEXT_ELEMENTS.contains(tag.name.as_str()) {
            let (content, _) = self.raw_content(&tag.name)?;
            let text = Text {
                data: CompactString::new(content.source_text(self.source)),
                span: content,
            };
            Fragment {
                nodes: if text.span.is_empty() {
                    Vec::new()
                } else {
                    vec![TemplateNode::Text(text)]
                },
            }
        } else {
            Fragment {
                nodes: self.parse_nodes(Some(tag.name.as_str()))?,
            }
        };

        Ok(Some(TemplateNode::Element(Element {
            name: tag.name,
            attributes: tag.attributes,
            fragment,
            is_self_closing: tag.self_closing,
            span: Span::new(tag.start as u32, self.pos as u32),
        })))
    }

    /// Opening tag up to and including `>` or `/>`.
    fn parse_tag(&mut self) -> Result<Tag<'a>, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let name_start = self.pos;
        if !self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
            return Err(ParseError::new(
                "Expected a valid element or component name",
                self.pos,
            ));
        }
        while self.peek().is_some_and(is_tag_name_char) {
            self.pos += 1;
        }
        let name = CompactString::new(&self.source[name_start..self.pos]);

        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(ParseError::new(
                        format!("Unexpected end of input in <{}>", name),
                        self.pos,
                    ))
                }
                Some(b'>') => {
                    self.pos += 1;
                    return Ok(Tag {
                        name,
                        attributes,
                        self_closing: false,
                        start,
                    });
                }
                Some(b'/') if self.starts_with("/>") => {
                    self.pos += 2;
                    return Ok(Tag {
                        name,
                        attributes,
                        self_closing: true,
                        start,
                    });
                }
                Some(b'{') => attributes.push(self.parse_brace_attribute()?),
                Some(_) => attributes.push(self.parse_attribute()?),
            }
        }
    }

    /// `{...spread}` or `{name}` shorthand.
    fn parse_brace_attribute(&mut self) -> Result<AttributeNode<'a>, ParseError> {
        let start = self.pos;
        let close = find_closing_brace(self.bytes, start)
            .ok_or_else(|| ParseError::new("Expected }", start))?;
        self.pos = close + 1;
        let span = Span::new(start as u32, self.pos as u32);

        let inner = &self.source[start + 1..close];
        let leading = inner.len() - inner.trim_start().len();
        if inner.trim_start().starts_with("...") {
            let expression = self.expression(start + 1 + leading + 3, close)?;
            return Ok(AttributeNode::Spread(SpreadAttribute { expression, span }));
        }

        let name = inner.trim();
        if name.is_empty()
            || !name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
        {
            return Err(ParseError::new(
                "Expected an identifier in attribute shorthand",
                start,
            ));
        }
        let expression = self.expression(start + 1, close)?;
        Ok(AttributeNode::Attribute(Attribute {
            name: CompactString::new(name),
            value: AttributeValue::Expression(ExpressionTag { expression, span }),
            span,
        }))
    }

    fn parse_attribute(&mut self) -> Result<AttributeNode<'a>, ParseError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_attribute_name_end(b) || self.starts_with("/>") {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ParseError::new("Expected attribute name", start));
        }
        let name = &self.source[start..self.pos];

        let after_name = self.pos;
        self.skip_whitespace();
        let value = if self.peek() == Some(b'=') {
            self.pos += 1;
            self.skip_whitespace();
            self.parse_attribute_value()?
        } else {
            self.pos = after_name;
            AttributeValue::True
        };
        let span = Span::new(start as u32, self.pos as u32);

        if let Some((prefix, rest)) = name.split_once(':') {
            if let Some(kind) = DirectiveKind::from_prefix(prefix) {
                return self.directive(kind, rest, value, span);
            }
        }
        Ok(AttributeNode::Attribute(Attribute {
            name: CompactString::new(name),
            value,
            span,
        }))
    }

    fn directive(
        &self,
        kind: DirectiveKind,
        rest: &str,
        value: AttributeValue<'a>,
        span: Span,
    ) -> Result<AttributeNode<'a>, ParseError> {
        let mut parts = rest.split('|');
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(ParseError::new("Directive needs a name", span.start as usize));
        }
        let modifiers = parts.map(CompactString::new).collect();
        let expression = match value {
            AttributeValue::True => None,
            AttributeValue::Expression(tag) => Some(tag),
            AttributeValue::Chunks(chunks) => {
                let mut chunks = chunks.into_iter();
                match (chunks.next(), chunks.next()) {
                    (Some(ValueChunk::Expression(tag)), None) => Some(tag),
                    _ => {
                        return Err(ParseError::new(
                            "Directive value must be a JavaScript expression enclosed in curly braces",
                            span.start as usize,
                        ))
                    }
                }
            }
        };
        Ok(AttributeNode::Directive(Directive {
            kind,
            name: CompactString::new(name),
            modifiers,
            expression,
            span,
        }))
    }

    fn parse_attribute_value(&mut self) -> Result<AttributeValue<'a>, ParseError> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let open = self.pos;
                self.pos += 1;
                let chunks = self.parse_chunks(|b| b == quote)?;
                if self.peek() != Some(quote) {
                    return Err(ParseError::new("Unterminated attribute value", open));
                }
                self.pos += 1;
                Ok(AttributeValue::Chunks(chunks))
            }
            Some(b'{') => {
                let tag = self.parse_expression_tag()?;
                Ok(AttributeValue::Expression(tag))
            }
            Some(_) => {
                let chunks = self.parse_chunks(|b| is_whitespace(b) || b == b'>')?;
                if chunks.is_empty() {
                    return Err(ParseError::new("Expected attribute value", self.pos));
                }
                Ok(AttributeValue::Chunks(chunks))
            }
            None => Err(ParseError::new("Expected attribute value", self.pos)),
        }
    }

    /// Text and `{expression}` chunks until `stop` matches.
    fn parse_chunks(&mut self, stop: impl Fn(u8) -> bool) -> Result<Vec<ValueChunk<'a>>, ParseError> {
        let mut chunks = Vec::new();
        let mut text_start = self.pos;
        while let Some(b) = self.peek() {
            if stop(b) {
                break;
            }
            if b == b'{' {
                self.push_text_chunk(&mut chunks, text_start);
                chunks.push(ValueChunk::Expression(self.parse_expression_tag()?));
                text_start = self.pos;
            } else {
                self.pos += 1;
            }
        }
        self.push_text_chunk(&mut chunks, text_start);
        Ok(chunks)
    }

    fn push_text_chunk(&self, chunks: &mut Vec<ValueChunk<'a>>, start: usize) {
        if start < self.pos {
            chunks.push(ValueChunk::Text(Text {
                data: CompactString::new(&self.source[start..self.pos]),
                span: Span::new(start as u32, self.pos as u32),
            }));
        }
    }

    fn parse_expression_tag(&mut self) -> Result<ExpressionTag<'a>, ParseError> {
        let start = self.pos;
        let close = find_closing_brace(self.bytes, start)
            .ok_or_else(|| ParseError::new("Expected }", start))?;
        let expression = self.expression(start + 1, close)?;
        self.pos = close + 1;
        Ok(ExpressionTag {
            expression,
            span: Span::new(start as u32, self.pos as u32),
        })
    }

    /// `{expr}`, `{#..}`, `{:..}`, `{/..}` or `{@..}` in content position.
    fn parse_tag_node(&mut self) -> Result<TemplateNode<'a>, ParseError> {
        let start = self.pos;
        let close = find_closing_brace(self.bytes, start)
            .ok_or_else(|| ParseError::new("Expected }", start))?;
        let inner_start = trim_start(self.bytes, start + 1, close);
        let kind = match self.bytes.get(inner_start) {
            Some(b'#') => BlockTagKind::Open,
            Some(b':') => BlockTagKind::Continue,
            Some(b'/') => BlockTagKind::Close,
            Some(b'@') => BlockTagKind::Special,
            _ => {
                let tag = self.parse_expression_tag()?;
                return Ok(TemplateNode::ExpressionTag(tag));
            }
        };

        let keyword_start = inner_start + 1;
        let mut keyword_end = keyword_start;
        while keyword_end < close && self.bytes[keyword_end].is_ascii_alphabetic() {
            keyword_end += 1;
        }
        if keyword_end == keyword_start {
            return Err(ParseError::new("Expected a block keyword", keyword_start));
        }
        let keyword = &self.source[keyword_start..keyword_end];
        let expression = self.block_expression(kind, keyword, keyword_end, close)?;
        self.pos = close + 1;
        Ok(TemplateNode::BlockTag(BlockTag {
            kind,
            keyword: CompactString::new(keyword),
            expression,
            span: Span::new(start as u32, self.pos as u32),
        }))
    }

    /// The expression carried by a block tag; `rest` runs from the end of the
    /// keyword to the closing brace.
    fn block_expression(
        &self,
        kind: BlockTagKind,
        keyword: &str,
        rest: usize,
        close: usize,
    ) -> Result<Option<JsExpression<'a>>, ParseError> {
        let text = &self.source[rest..close];
        let end_at = |needle: &str| find_top_level(text, needle).map_or(close, |i| rest + i);

        let range = match (kind, keyword) {
            (BlockTagKind::Close, _) => None,
            (BlockTagKind::Open, "each") => Some((rest, end_at(" as "))),
            (BlockTagKind::Open, "await") => Some((rest, end_at(" then ").min(end_at(" catch ")))),
            (BlockTagKind::Open, "snippet") => None,
            (BlockTagKind::Continue, "else") => {
                let trimmed = trim_start(self.bytes, rest, close);
                if self.source[trimmed..close].starts_with("if")
                    && self.bytes.get(trimmed + 2).is_some_and(|b| is_whitespace(*b))
                {
                    Some((trimmed + 2, close))
                } else {
                    None
                }
            }
            (BlockTagKind::Continue, _) => None,
            (BlockTagKind::Special, "const") => {
                let eq = find_top_level(text, "=")
                    .ok_or_else(|| ParseError::new("{@const} requires an assignment", rest))?;
                Some((rest + eq + 1, close))
            }
            _ => Some((rest, close)),
        };

        match range {
            Some((start, end)) if !self.source[start..end].trim().is_empty() => {
                Ok(Some(self.expression(start, end)?))
            }
            Some(_) if matches!(kind, BlockTagKind::Open) && keyword != "each" => Err(
                ParseError::new(format!("{{#{}}} requires an expression", keyword), rest),
            ),
            _ => Ok(None),
        }
    }

    /// Content up to `</name>`; leaves `pos` after the closing tag. Returns
    /// the content range and the full closing tag end.
    /// `<textarea>` holds text and expression tags, nothing else.
    fn parse_textarea_body(&mut self) -> Result<Vec<TemplateNode<'a>>, ParseError> {
        let content_start = self.pos;
        let mut nodes = Vec::new();
        loop {
            let start = self.pos;
            let closing = memmem::find(&self.bytes[start..], b"</textarea")
                .map(|n| start + n)
                .ok_or_else(|| ParseError::new("<textarea> was left open", content_start))?;
            let end = memchr(b'{', &self.bytes[start..closing]).map_or(closing, |n| start + n);
            if start < end {
                nodes.push(TemplateNode::Text(Text {
                    data: CompactString::new(&self.source[start..end]),
                    span: Span::new(start as u32, end as u32),
                }));
            }
            self.pos = end;
            if end == closing {
                break;
            }
            nodes.push(TemplateNode::ExpressionTag(self.parse_expression_tag()?));
        }
        self.parse_closing_tag()?;
        Ok(nodes)
    }

    fn raw_content(&mut self, name: &str) -> Result<(Span, usize), ParseError> {
        let content_start = self.pos;
        let closing = format!("</{}", name);
        let found = memmem::find(&self.bytes[content_start..], closing.as_bytes())
            .ok_or_else(|| ParseError::new(format!("<{}> was left open", name), content_start))?;
        let content_end = content_start + found;
        let gt = memchr(b'>', &self.bytes[content_end..])
            .ok_or_else(|| ParseError::new("Expected >", content_end))?;
        self.pos = content_end + gt + 1;
        Ok((
            Span::new(content_start as u32, content_end as u32),
            self.pos,
        ))
    }

    fn parse_special_block(&mut self, tag: Tag<'a>) -> Result<(), ParseError> {
        let (content, end) = self.raw_content(&tag.name)?;
        let span = Span::new(tag.start as u32, end as u32);

        if tag.name == "style" {
            if self.css.is_some() {
                return Err(ParseError::new(
                    "A component can have a single top-level <style> element",
                    tag.start,
                ));
            }
            self.css = Some(parse_stylesheet(self.source, content, span)?);
            return Ok(());
        }

        let static_value = |name: &str| {
            tag.attributes.iter().find_map(|attr| match attr {
                AttributeNode::Attribute(a) if a.name == name => Some(&a.value),
                _ => None,
            })
        };
        let is_module = static_value("module").is_some()
            || static_value("context")
                .and_then(|v| v.as_static_text())
                .is_some_and(|t| t.data == "module");
        let lang = match static_value("lang").and_then(|v| v.as_static_text()) {
            Some(t) if t.data == "ts" || t.data == "typescript" => ScriptLang::TypeScript,
            _ => ScriptLang::JavaScript,
        };

        let program = parse_program(
            self.allocator,
            self.source,
            content.start as usize,
            content.end as usize,
            lang,
        )?;
        let context = if is_module {
            ScriptContext::Module
        } else {
            ScriptContext::Instance
        };
        let script = Script {
            context,
            lang,
            program,
            content,
            span,
        };
        let slot = match context {
            ScriptContext::Instance => &mut self.instance,
            ScriptContext::Module => &mut self.module,
        };
        if slot.is_some() {
            return Err(ParseError::new(
                match context {
                    ScriptContext::Instance => {
                        "A component can have a single top-level <script> element"
                    }
                    ScriptContext::Module => {
                        "A component can have a single top-level <script module> element"
                    }
                },
                tag.start,
            ));
        }
        *slot = Some(script);
        Ok(())
    }
}

fn trim_start(bytes: &[u8], mut start: usize, end: usize) -> usize {
    while start < end && is_whitespace(bytes[start]) {
        start += 1;
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_ast::ast::Expression;
    use oxc_span::GetSpan;

    fn element<'r, 'a>(node: &'r TemplateNode<'a>) -> &'r Element<'a> {
        match node {
            TemplateNode::Element(el) => el,
            other => panic!("expected element, got {:?}", other.node_type()),
        }
    }

    fn attribute<'r, 'a>(node: &'r AttributeNode<'a>) -> &'r Attribute<'a> {
        match node {
            AttributeNode::Attribute(a) => a,
            other => panic!("expected attribute, got {:?}", other.node_type()),
        }
    }

    #[test]
    fn test_parse_regions() {
        let allocator = Allocator::default();
        let source = "<script>let a = 1;</script>\n<script module>export const b = 2;</script>\n<div></div>\n<style>.a { color: red }</style>";
        let root = parse(&allocator, source).unwrap();
        let instance = root.instance.as_ref().unwrap();
        assert_eq!(instance.content.source_text(source), "let a = 1;");
        assert_eq!(instance.span.source_text(source), "<script>let a = 1;</script>");
        let module = root.module.as_ref().unwrap();
        assert_eq!(module.context, ScriptContext::Module);
        assert_eq!(module.program.body.len(), 1);
        let css = root.css.as_ref().unwrap();
        assert_eq!(css.content.source_text(source), ".a { color: red }");
        let elements: Vec<_> = root
            .fragment
            .nodes
            .iter()
            .filter(|n| matches!(n, TemplateNode::Element(_)))
            .collect();
        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn test_context_module_attribute() {
        let allocator = Allocator::default();
        let root = parse(&allocator, "<script context=\"module\">let a;</script>").unwrap();
        assert!(root.instance.is_none());
        assert!(root.module.is_some());
    }

    #[test]
    fn test_typescript_markup_expressions() {
        let allocator = Allocator::default();
        let source = "<script lang=\"ts\">let a: number = 1;</script><p>{a as number}</p>";
        let root = parse(&allocator, source).unwrap();
        assert_eq!(root.instance.as_ref().unwrap().lang, ScriptLang::TypeScript);
    }

    #[test]
    fn test_duplicate_regions() {
        let allocator = Allocator::default();
        assert!(parse(&allocator, "<style></style><style></style>").is_err());
        assert!(parse(&allocator, "<script></script><script></script>").is_err());
        assert!(parse(&allocator, "<script></script><script module></script>").is_ok());
    }

    #[test]
    fn test_nested_style_is_raw_text() {
        let allocator = Allocator::default();
        let source = "<svelte:head><style>.a {}</style></svelte:head>";
        let root = parse(&allocator, source).unwrap();
        assert!(root.css.is_none());
        let head = element(&root.fragment.nodes[0]);
        let style = element(&head.fragment.nodes[0]);
        assert_eq!(style.name, "style");
        assert!(matches!(&style.fragment.nodes[0], TemplateNode::Text(t) if t.data == ".a {}"));
    }

    #[test]
    fn test_textarea_body_has_expression_tags() {
        let allocator = Allocator::default();
        let source = "<textarea>a {$css(\"x\")} <b></textarea>";
        let root = parse(&allocator, source).unwrap();
        let textarea = element(&root.fragment.nodes[0]);
        assert_eq!(textarea.fragment.nodes.len(), 3);
        assert!(matches!(&textarea.fragment.nodes[0], TemplateNode::Text(t) if t.data == "a "));
        let TemplateNode::ExpressionTag(tag) = &textarea.fragment.nodes[1] else {
            panic!("expected expression tag");
        };
        assert_eq!(tag.span.source_text(source), "{$css(\"x\")}");
        assert!(matches!(&textarea.fragment.nodes[2], TemplateNode::Text(t) if t.data == " <b>"));
        assert_eq!(textarea.span.source_text(source), source);
    }

    #[test]
    fn test_attributes() {
        let allocator = Allocator::default();
        let source = r#"<div class="a {b} c" id=x hidden title={t} {name} {...rest}></div>"#;
        let root = parse(&allocator, source).unwrap();
        let div = element(&root.fragment.nodes[0]);
        assert_eq!(div.attributes.len(), 6);

        let class = attribute(&div.attributes[0]);
        match &class.value {
            AttributeValue::Chunks(chunks) => {
                assert_eq!(chunks.len(), 3);
                assert!(matches!(&chunks[0], ValueChunk::Text(t) if t.data == "a "));
                assert!(matches!(&chunks[2], ValueChunk::Text(t) if t.data == " c"));
            }
            _ => panic!("expected chunks"),
        }
        assert_eq!(class.span.source_text(source), r#"class="a {b} c""#);

        let id = attribute(&div.attributes[1]);
        assert_eq!(id.value.as_static_text().map(|t| t.data.as_str()), Some("x"));
        assert!(matches!(attribute(&div.attributes[2]).value, AttributeValue::True));
        assert!(matches!(
            attribute(&div.attributes[3]).value,
            AttributeValue::Expression(_)
        ));
        assert_eq!(attribute(&div.attributes[4]).name, "name");
        assert!(matches!(&div.attributes[5], AttributeNode::Spread(_)));
    }

    #[test]
    fn test_directives() {
        let allocator = Allocator::default();
        let source = "<button class:active on:click|once|preventDefault={go} class:big={size > 2}>x</button>";
        let root = parse(&allocator, source).unwrap();
        let button = element(&root.fragment.nodes[0]);
        let directives: Vec<_> = button
            .attributes
            .iter()
            .map(|a| match a {
                AttributeNode::Directive(d) => d,
                _ => panic!("expected directive"),
            })
            .collect();
        assert_eq!(directives[0].kind, DirectiveKind::Class);
        assert_eq!(directives[0].name, "active");
        assert!(directives[0].expression.is_none());
        assert_eq!(directives[1].kind, DirectiveKind::On);
        assert_eq!(directives[1].modifiers, vec!["once", "preventDefault"]);
        assert!(directives[2].expression.is_some());
    }

    #[test]
    fn test_expression_offsets() {
        let allocator = Allocator::default();
        let source = "<p class={$css('a')}>{ $css(\"b\") }</p>";
        let root = parse(&allocator, source).unwrap();
        let p = element(&root.fragment.nodes[0]);
        let class = attribute(&p.attributes[0]);
        let AttributeValue::Expression(tag) = &class.value else {
            panic!("expected expression");
        };
        let span = tag.expression.absolute(tag.expression.node.span());
        assert_eq!(span.source_text(source), "$css('a')");
        assert!(matches!(tag.expression.node, Expression::CallExpression(_)));

        let TemplateNode::ExpressionTag(tag) = &p.fragment.nodes[0] else {
            panic!("expected expression tag");
        };
        let span = tag.expression.absolute(tag.expression.node.span());
        assert_eq!(span.source_text(source), "$css(\"b\")");
        assert_eq!(tag.span.source_text(source), "{ $css(\"b\") }");
    }

    #[test]
    fn test_block_tags() {
        let allocator = Allocator::default();
        let source = "{#if a}x{:else if b}y{:else}z{/if}{#each items as item (item.id)}{@const c = item.c}{/each}{#await p then v}{/await}{@html h}";
        let root = parse(&allocator, source).unwrap();
        let blocks: Vec<_> = root
            .fragment
            .nodes
            .iter()
            .filter_map(|n| match n {
                TemplateNode::BlockTag(b) => Some(b),
                _ => None,
            })
            .collect();
        let summary: Vec<_> = blocks
            .iter()
            .map(|b| {
                (
                    b.kind,
                    b.keyword.as_str(),
                    b.expression
                        .as_ref()
                        .map(|e| e.absolute(e.node.span()).source_text(source)),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                (BlockTagKind::Open, "if", Some("a")),
                (BlockTagKind::Continue, "else", Some("b")),
                (BlockTagKind::Continue, "else", None),
                (BlockTagKind::Close, "if", None),
                (BlockTagKind::Open, "each", Some("items")),
                (BlockTagKind::Special, "const", Some("item.c")),
                (BlockTagKind::Close, "each", None),
                (BlockTagKind::Open, "await", Some("p")),
                (BlockTagKind::Close, "await", None),
                (BlockTagKind::Special, "html", Some("h")),
            ]
        );
    }

    #[test]
    fn test_void_and_self_closing() {
        let allocator = Allocator::default();
        let root = parse(&allocator, "<div><br><img src=a.png/><Comp /></div>").unwrap();
        let div = element(&root.fragment.nodes[0]);
        assert_eq!(div.fragment.nodes.len(), 3);
        assert!(element(&div.fragment.nodes[2]).is_component());
    }

    #[test]
    fn test_comments_and_doctype() {
        let allocator = Allocator::default();
        let root = parse(&allocator, "<!doctype html><!-- <p> {x} -->").unwrap();
        assert_eq!(root.fragment.nodes.len(), 2);
        assert!(matches!(&root.fragment.nodes[1], TemplateNode::Comment(c) if c.data == " <p> {x} "));
    }

    #[test]
    fn test_errors() {
        let allocator = Allocator::default();
        let errors = [
            "<<div />",
            "<div>",
            "<div></span>",
            "</div>",
            "<p class=\"a>",
            "{a +}",
            "{#if}{/if}",
            "<p on:click=\"go\"></p>",
            "<!-- open",
            "<script>let = ;</script>",
            "<style>.a {</style>",
        ];
        for source in errors {
            assert!(parse(&allocator, source).is_err(), "{source} should fail");
        }
    }
}
