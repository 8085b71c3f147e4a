//! Stylesheet parser.
//!
//! Produces rules, at-rules and declarations with absolute spans. Selector
//! preludes are parsed into full selector trees; declaration values and
//! at-rule preludes stay raw ranges.

use phf::phf_set;
use sigil_carton::{CompactString, Span};
use sigil_relief::css::*;

use crate::js::skip_string;
use crate::ParseError;

/// Pseudo classes whose argument is itself a selector list.
static SELECTOR_PSEUDO_CLASSES: phf::Set<&'static str> = phf_set! {
    "is", "where", "not", "has", "global",
};

/// Parse the stylesheet between `content.start` and `content.end`.
pub fn parse_stylesheet(source: &str, content: Span, span: Span) -> Result<StyleSheet, ParseError> {
    let mut parser = CssParser {
        source,
        bytes: source.as_bytes(),
        pos: content.start as usize,
        end: content.end as usize,
    };
    let children = parser.parse_items(false)?;
    Ok(StyleSheet {
        children,
        content,
        span,
    })
}

/// Parse a selector list occupying exactly `span`.
pub fn parse_selector_list(source: &str, span: Span) -> Result<SelectorList, ParseError> {
    let mut parser = SelectorParser {
        source,
        bytes: source.as_bytes(),
        pos: span.start as usize,
        end: span.end as usize,
    };
    let list = parser.parse_list()?;
    parser.skip_trivia()?;
    if parser.pos < parser.end {
        return Err(ParseError::new("Unexpected character in selector", parser.pos));
    }
    Ok(list)
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

#[inline]
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'-' || b == b'_' || b == b'\\' || b >= 0x80
}

fn trim_end(bytes: &[u8], start: usize, mut end: usize) -> usize {
    while end > start && is_whitespace(bytes[end - 1]) {
        end -= 1;
    }
    end
}

fn trim_start(bytes: &[u8], mut start: usize, end: usize) -> usize {
    while start < end && is_whitespace(bytes[start]) {
        start += 1;
    }
    start
}

/// Skip whitespace and `/* */` comments between `pos` and `end`.
fn skip_trivia(bytes: &[u8], mut pos: usize, end: usize) -> Result<usize, ParseError> {
    while pos < end {
        if is_whitespace(bytes[pos]) {
            pos += 1;
        } else if bytes[pos..end].starts_with(b"/*") {
            let close = memchr::memmem::find(&bytes[pos + 2..end], b"*/")
                .ok_or_else(|| ParseError::new("Unterminated comment", pos))?;
            pos += 2 + close + 2;
        } else {
            break;
        }
    }
    Ok(pos)
}

struct CssParser<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    end: usize,
}

impl<'s> CssParser<'s> {
    fn parse_items(&mut self, nested: bool) -> Result<Vec<CssNode>, ParseError> {
        let mut children = Vec::new();
        loop {
            self.pos = skip_trivia(self.bytes, self.pos, self.end)?;
            if self.pos >= self.end {
                if nested {
                    return Err(ParseError::new("Expected }", self.pos));
                }
                return Ok(children);
            }
            match self.bytes[self.pos] {
                b'}' if nested => return Ok(children),
                b'}' => return Err(ParseError::new("Unexpected }", self.pos)),
                b';' => self.pos += 1,
                b'@' => children.push(CssNode::Atrule(self.parse_atrule()?)),
                _ if nested && self.find_delimiter(self.pos)?.1 != b'{' => {
                    children.push(CssNode::Declaration(self.parse_declaration()?));
                }
                _ => children.push(CssNode::Rule(self.parse_rule()?)),
            }
        }
    }

    /// First `;`, `{` or `}` outside of parens, brackets, strings and
    /// comments. Returns `(self.end, 0)` when there is none.
    fn find_delimiter(&self, from: usize) -> Result<(usize, u8), ParseError> {
        let mut depth = 0usize;
        let mut i = from;
        while i < self.end {
            match self.bytes[i] {
                b'"' | b'\'' => {
                    i = skip_string(&self.bytes[..self.end], i)
                        .ok_or_else(|| ParseError::new("Unterminated string", i))?;
                    continue;
                }
                b'/' if self.bytes.get(i + 1) == Some(&b'*') => {
                    i = skip_trivia(self.bytes, i, self.end)?;
                    continue;
                }
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b @ (b';' | b'{' | b'}') if depth == 0 => return Ok((i, b)),
                _ => {}
            }
            i += 1;
        }
        Ok((self.end, 0))
    }

    fn parse_rule(&mut self) -> Result<Rule, ParseError> {
        let start = self.pos;
        let (brace, byte) = self.find_delimiter(start)?;
        if byte != b'{' {
            return Err(ParseError::new("Expected {", brace));
        }
        let prelude_end = trim_end(self.bytes, start, brace);
        let prelude = parse_selector_list(self.source, Span::new(start as u32, prelude_end as u32))?;
        self.pos = brace;
        let block = self.parse_block()?;
        Ok(Rule {
            prelude,
            block,
            span: Span::new(start as u32, self.pos as u32),
        })
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let children = self.parse_items(true)?;
        self.pos += 1;
        Ok(Block {
            children,
            span: Span::new(start as u32, self.pos as u32),
        })
    }

    /// Step over a balanced block without parsing its content.
    fn skip_block(&mut self) -> Result<Block, ParseError> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut i = start + 1;
        loop {
            let (delim, byte) = self.find_delimiter(i)?;
            match byte {
                b'{' => depth += 1,
                b'}' if depth == 0 => {
                    self.pos = delim + 1;
                    return Ok(Block {
                        children: Vec::new(),
                        span: Span::new(start as u32, self.pos as u32),
                    });
                }
                b'}' => depth -= 1,
                b';' => {}
                _ => return Err(ParseError::new("Expected }", delim)),
            }
            i = delim + 1;
        }
    }

    fn parse_atrule(&mut self) -> Result<Atrule, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let name_start = self.pos;
        while self.pos < self.end && is_ident_byte(self.bytes[self.pos]) {
            self.pos += 1;
        }
        if self.pos == name_start {
            return Err(ParseError::new("Expected at-rule name", self.pos));
        }
        let name = CompactString::new(&self.source[name_start..self.pos]);

        let (delim, byte) = self.find_delimiter(self.pos)?;
        let prelude_start = trim_start(self.bytes, self.pos, delim);
        let prelude = Span::new(
            prelude_start as u32,
            trim_end(self.bytes, prelude_start, delim) as u32,
        );
        let block = match byte {
            b'{' => {
                self.pos = delim;
                if name.ends_with("keyframes") {
                    Some(self.skip_block()?)
                } else {
                    Some(self.parse_block()?)
                }
            }
            b';' => {
                self.pos = delim + 1;
                None
            }
            _ => {
                self.pos = delim;
                None
            }
        };
        Ok(Atrule {
            name,
            prelude,
            block,
            span: Span::new(start as u32, self.pos as u32),
        })
    }

    fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        let start = self.pos;
        let (delim, byte) = self.find_delimiter(start)?;
        let colon = memchr::memchr(b':', &self.bytes[start..delim])
            .ok_or_else(|| ParseError::new("Expected a declaration", start))?;
        let property = self.source[start..start + colon].trim();
        if property.is_empty() {
            return Err(ParseError::new("Expected a property name", start));
        }
        let value_start = trim_start(self.bytes, start + colon + 1, delim);
        let end = trim_end(self.bytes, start, delim);
        self.pos = if byte == b';' { delim + 1 } else { delim };
        Ok(Declaration {
            property: CompactString::new(property),
            value: Span::new(value_start as u32, end.max(value_start) as u32),
            span: Span::new(start as u32, end as u32),
        })
    }
}

struct SelectorParser<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    end: usize,
}

impl<'s> SelectorParser<'s> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        (self.pos < self.end).then(|| self.bytes[self.pos])
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        self.pos = skip_trivia(self.bytes, self.pos, self.end)?;
        Ok(())
    }

    fn parse_list(&mut self) -> Result<SelectorList, ParseError> {
        self.skip_trivia()?;
        let start = self.pos;
        let mut children = Vec::new();
        loop {
            children.push(self.parse_complex()?);
            self.skip_trivia()?;
            if self.peek() == Some(b',') {
                self.pos += 1;
                continue;
            }
            break;
        }
        let end = children.last().map_or(start as u32, |c: &ComplexSelector| c.span.end);
        Ok(SelectorList {
            children,
            span: Span::new(start as u32, end),
        })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, ParseError> {
        self.skip_trivia()?;
        let start = self.pos;
        let mut children: Vec<RelativeSelector> = Vec::new();
        loop {
            let gap = self.pos;
            self.skip_trivia()?;
            let Some(byte) = self.peek() else { break };
            if byte == b',' {
                break;
            }
            let combinator = match byte {
                b'>' => Some(self.combinator(CombinatorKind::Child, 1)),
                b'+' => Some(self.combinator(CombinatorKind::NextSibling, 1)),
                b'~' => Some(self.combinator(CombinatorKind::SubsequentSibling, 1)),
                b'|' if self.bytes.get(self.pos + 1) == Some(&b'|') => {
                    Some(self.combinator(CombinatorKind::Column, 2))
                }
                _ if !children.is_empty() && self.pos > gap => Some(Combinator {
                    kind: CombinatorKind::Descendant,
                    span: Span::new(gap as u32, self.pos as u32),
                }),
                _ => None,
            };
            if !children.is_empty() && combinator.is_none() {
                return Err(ParseError::new("Unexpected character in selector", self.pos));
            }
            self.skip_trivia()?;
            let compound_start = self.pos;
            let selectors = self.parse_compound()?;
            if selectors.is_empty() {
                return Err(ParseError::new("Expected a selector", self.pos));
            }
            let span_start = combinator.map_or(compound_start as u32, |c| c.span.start);
            children.push(RelativeSelector {
                combinator,
                selectors,
                span: Span::new(span_start, self.pos as u32),
            });
        }
        let Some(last) = children.last() else {
            return Err(ParseError::new("Expected a selector", self.pos));
        };
        let end = last.span.end;
        Ok(ComplexSelector {
            children,
            span: Span::new(start as u32, end),
        })
    }

    fn combinator(&mut self, kind: CombinatorKind, len: usize) -> Combinator {
        let start = self.pos;
        self.pos += len;
        Combinator {
            kind,
            span: Span::new(start as u32, self.pos as u32),
        }
    }

    fn parse_compound(&mut self) -> Result<Vec<SimpleSelector>, ParseError> {
        let mut selectors = Vec::new();
        while let Some(byte) = self.peek() {
            let start = self.pos;
            let selector = match byte {
                b'.' => {
                    self.pos += 1;
                    let name = self.ident()?;
                    SimpleSelector::Class(self.named(name, start))
                }
                b'#' => {
                    self.pos += 1;
                    let name = self.ident()?;
                    SimpleSelector::Id(self.named(name, start))
                }
                b'[' => {
                    let close = self.find_close(b'[', b']')?;
                    self.pos = trim_start(self.bytes, start + 1, close);
                    let name_start = self.pos;
                    while self.pos < close && is_ident_byte(self.bytes[self.pos]) {
                        self.pos += 1;
                    }
                    let name = CompactString::new(&self.source[name_start..self.pos]);
                    self.pos = close + 1;
                    SimpleSelector::Attribute(self.named(name, start))
                }
                b':' if self.bytes.get(self.pos + 1) == Some(&b':') => {
                    self.pos += 2;
                    let name = self.ident()?;
                    if self.peek() == Some(b'(') {
                        self.pos = self.find_close(b'(', b')')? + 1;
                    }
                    SimpleSelector::PseudoElement(self.named(name, start))
                }
                b':' => {
                    self.pos += 1;
                    let name = self.ident()?;
                    let args = if self.peek() == Some(b'(') {
                        let close = self.find_close(b'(', b')')?;
                        let args = if SELECTOR_PSEUDO_CLASSES.contains(name.as_str()) {
                            Some(parse_selector_list(
                                self.source,
                                Span::new(self.pos as u32 + 1, close as u32),
                            )?)
                        } else {
                            None
                        };
                        self.pos = close + 1;
                        args
                    } else {
                        None
                    };
                    SimpleSelector::PseudoClass(PseudoClassSelector {
                        name,
                        args,
                        span: Span::new(start as u32, self.pos as u32),
                    })
                }
                b'&' => {
                    self.pos += 1;
                    SimpleSelector::Nesting(Span::new(start as u32, self.pos as u32))
                }
                b'*' => {
                    self.pos += 1;
                    SimpleSelector::Type(self.named(CompactString::const_new("*"), start))
                }
                b if is_ident_start(b) => {
                    let name = self.ident()?;
                    SimpleSelector::Type(self.named(name, start))
                }
                _ => break,
            };
            selectors.push(selector);
        }
        Ok(selectors)
    }

    fn named(&self, name: CompactString, start: usize) -> NamedSelector {
        NamedSelector {
            name,
            span: Span::new(start as u32, self.pos as u32),
        }
    }

    /// Identifier with CSS escapes kept verbatim.
    fn ident(&mut self) -> Result<CompactString, ParseError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\\' {
                self.pos += 1;
                // escaped character, possibly multi-byte
                if let Some(c) = self.source[self.pos..self.end].chars().next() {
                    self.pos += c.len_utf8();
                }
            } else if is_ident_byte(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(ParseError::new("Expected an identifier", start));
        }
        Ok(CompactString::new(&self.source[start..self.pos]))
    }

    /// Index of the bracket closing the one at `self.pos`.
    fn find_close(&self, open: u8, close: u8) -> Result<usize, ParseError> {
        let mut depth = 0usize;
        let mut i = self.pos;
        while i < self.end {
            match self.bytes[i] {
                b'"' | b'\'' => {
                    i = skip_string(&self.bytes[..self.end], i)
                        .ok_or_else(|| ParseError::new("Unterminated string", i))?;
                    continue;
                }
                b if b == open => depth += 1,
                b if b == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(ParseError::new(
            format!("Expected {}", close as char),
            self.pos,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(css: &str) -> StyleSheet {
        let span = Span::new(0, css.len() as u32);
        parse_stylesheet(css, span, span).unwrap()
    }

    fn rule(node: &CssNode) -> &Rule {
        match node {
            CssNode::Rule(rule) => rule,
            other => panic!("expected rule, got {:?}", other),
        }
    }

    fn selectors(css: &str) -> SelectorList {
        parse_selector_list(css, Span::new(0, css.len() as u32)).unwrap()
    }

    #[test]
    fn test_simple_rule() {
        let css = ".a { color: red; }";
        let sheet = sheet(css);
        assert_eq!(sheet.children.len(), 1);
        let rule = rule(&sheet.children[0]);
        assert_eq!(rule.prelude.span.source_text(css), ".a");
        assert_eq!(rule.span, Span::new(0, css.len() as u32));
        match &rule.block.children[0] {
            CssNode::Declaration(decl) => {
                assert_eq!(decl.property, "color");
                assert_eq!(decl.value.source_text(css), "red");
                assert_eq!(decl.span.source_text(css), "color: red");
            }
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_declaration_without_semicolon() {
        let sheet = sheet(".a{color:red}");
        let rule = rule(&sheet.children[0]);
        assert_eq!(rule.block.children.len(), 1);
    }

    #[test]
    fn test_nested_rules() {
        let css = ".a { color: red; &:hover { color: blue } .b { top: 0 } }";
        let sheet = sheet(css);
        let outer = rule(&sheet.children[0]);
        assert_eq!(outer.block.children.len(), 3);
        assert_eq!(
            rule(&outer.block.children[1]).prelude.span.source_text(css),
            "&:hover"
        );
        assert_eq!(
            rule(&outer.block.children[2]).prelude.span.source_text(css),
            ".b"
        );
    }

    #[test]
    fn test_atrules() {
        let css = "@import 'x.css';\n@media (min-width: 10px) { .a { top: 0 } }\n@keyframes spin { from { top: 0 } to { top: 1px } }";
        let sheet = sheet(css);
        assert_eq!(sheet.children.len(), 3);
        match &sheet.children[0] {
            CssNode::Atrule(at) => {
                assert_eq!(at.name, "import");
                assert!(at.block.is_none());
                assert_eq!(at.prelude.source_text(css), "'x.css'");
            }
            other => panic!("expected at-rule, got {:?}", other),
        }
        match &sheet.children[1] {
            CssNode::Atrule(at) => {
                assert_eq!(at.prelude.source_text(css), "(min-width: 10px)");
                let block = at.block.as_ref().unwrap();
                assert_eq!(rule(&block.children[0]).prelude.span.source_text(css), ".a");
            }
            other => panic!("expected at-rule, got {:?}", other),
        }
        match &sheet.children[2] {
            CssNode::Atrule(at) => {
                assert_eq!(at.name, "keyframes");
                assert!(at.block.as_ref().unwrap().children.is_empty());
                assert_eq!(at.span.end as usize, css.len());
            }
            other => panic!("expected at-rule, got {:?}", other),
        }
    }

    #[test]
    fn test_comments_and_strings() {
        let css = "/* .x { } */ .a::after { content: '}'; background: url(a;b) }";
        let sheet = sheet(css);
        assert_eq!(sheet.children.len(), 1);
        let rule = rule(&sheet.children[0]);
        assert_eq!(rule.block.children.len(), 2);
    }

    #[test]
    fn test_selector_structure() {
        let css = "div.a.b > .c  .d, #e[f='g']";
        let list = selectors(css);
        assert_eq!(list.children.len(), 2);
        let first = &list.children[0];
        assert_eq!(first.span.source_text(css), "div.a.b > .c  .d");
        assert_eq!(first.children.len(), 3);
        assert_eq!(first.children[0].selectors.len(), 3);
        assert!(first.children[0].combinator.is_none());
        assert_eq!(
            first.children[1].combinator.map(|c| c.kind),
            Some(CombinatorKind::Child)
        );
        assert_eq!(
            first.children[2].combinator.map(|c| c.kind),
            Some(CombinatorKind::Descendant)
        );
        let names: Vec<_> = first.children[0]
            .selectors
            .iter()
            .map(|s| s.span().source_text(css))
            .collect();
        assert_eq!(names, vec!["div", ".a", ".b"]);

        let second = &list.children[1].children[0].selectors;
        assert!(matches!(&second[0], SimpleSelector::Id(s) if s.name == "e"));
        assert!(matches!(&second[1], SimpleSelector::Attribute(s) if s.name == "f"));
        assert_eq!(second[1].span().source_text(css), "[f='g']");
    }

    #[test]
    fn test_pseudo_class_arguments() {
        let css = ":global(.a .b):not(.c):nth-child(2n+1)::before";
        let list = selectors(css);
        let compound = &list.children[0].children[0].selectors;
        assert_eq!(compound.len(), 4);
        match &compound[0] {
            SimpleSelector::PseudoClass(p) => {
                assert!(p.is_global());
                let args = p.args.as_ref().unwrap();
                assert_eq!(args.span.source_text(css), ".a .b");
            }
            other => panic!("expected pseudo class, got {:?}", other),
        }
        assert!(matches!(&compound[2], SimpleSelector::PseudoClass(p) if p.args.is_none()));
        assert!(matches!(&compound[3], SimpleSelector::PseudoElement(p) if p.name == "before"));
    }

    #[test]
    fn test_escaped_class_name() {
        let css = ".sm\\:flex";
        let list = selectors(css);
        assert_eq!(
            list.children[0].children[0].selectors[0].name(),
            Some("sm\\:flex")
        );
    }

    #[test]
    fn test_relative_selector_in_has() {
        let css = ".a:has(> .b)";
        let list = selectors(css);
        let has = match &list.children[0].children[0].selectors[1] {
            SimpleSelector::PseudoClass(p) => p.args.as_ref().unwrap(),
            other => panic!("expected pseudo class, got {:?}", other),
        };
        assert_eq!(
            has.children[0].children[0].combinator.map(|c| c.kind),
            Some(CombinatorKind::Child)
        );
    }

    #[test]
    fn test_errors() {
        let parse = |css: &str| {
            let span = Span::new(0, css.len() as u32);
            parse_stylesheet(css, span, span)
        };
        assert!(parse(".a { color: red").is_err());
        assert!(parse(".a color: red").is_err());
        assert!(parse("} .a {}").is_err());
        assert!(parse(".a, { }").is_err());
        assert!(parse(".a { } /* open").is_err());
        assert!(parse(". { }").is_err());
    }
}
