//! JavaScript helpers: oxc parsing of embedded code and brace matching over
//! raw source text.

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;
use sigil_relief::{JsExpression, ScriptLang};

use crate::ParseError;

pub(crate) fn source_type(lang: ScriptLang) -> SourceType {
    match lang {
        ScriptLang::JavaScript => SourceType::mjs(),
        ScriptLang::TypeScript => SourceType::ts(),
    }
}

/// Parse `source[start..end]` as a single expression.
pub(crate) fn parse_expression<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    start: usize,
    end: usize,
    lang: ScriptLang,
) -> Result<JsExpression<'a>, ParseError> {
    let text = &source[start..end];
    if text.trim().is_empty() {
        return Err(ParseError::new("Expected an expression", start));
    }
    Parser::new(allocator, text, source_type(lang))
        .parse_expression()
        .map(|node| JsExpression {
            node,
            offset: start as u32,
        })
        .map_err(|errors| {
            let message = errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Invalid expression".to_string());
            ParseError::new(message, start)
        })
}

/// Parse `source[start..end]` as a module body.
pub(crate) fn parse_program<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    start: usize,
    end: usize,
    lang: ScriptLang,
) -> Result<Program<'a>, ParseError> {
    let ret = Parser::new(allocator, &source[start..end], source_type(lang)).parse();
    if let Some(error) = ret.errors.first() {
        return Err(ParseError::new(error.to_string(), start));
    }
    if ret.panicked {
        return Err(ParseError::new("Failed to parse script", start));
    }
    Ok(ret.program)
}

/// Index just past the string literal opening at `start`.
pub(crate) fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            c if c == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Scan template literal text from `i` until its closing backtick (returns the
/// index after it) or an interpolation (pushes a marker, returns the index
/// after `${`).
fn scan_template(bytes: &[u8], mut i: usize, stack: &mut Vec<u8>) -> Option<usize> {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                stack.push(b'$');
                return Some(i + 2);
            }
            _ => i += 1,
        }
    }
    None
}

/// Find the `}` matching the `{` at `open`, skipping strings, template
/// literals and comments.
pub(crate) fn find_closing_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut stack = vec![b'{'];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'`' => {
                i = scan_template(bytes, i + 1, &mut stack)?;
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = memchr::memchr(b'\n', &bytes[i..]).map_or(bytes.len(), |n| i + n);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = memchr::memmem::find(&bytes[i + 2..], b"*/").map(|n| i + 2 + n + 2)?;
                continue;
            }
            b'{' => stack.push(b'{'),
            b'}' => {
                let top = stack.pop()?;
                if stack.is_empty() {
                    return Some(i);
                }
                if top == b'$' {
                    i = scan_template(bytes, i + 1, &mut stack)?;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Find `needle` in `text` outside of brackets, strings and template
/// literals. Word needles (starting with a space) must be followed by a
/// space too, e.g. `" as "`.
pub(crate) fn find_top_level(text: &str, needle: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let needle = needle.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'`' => {
                // Interpolations are skipped as a whole
                let close = find_template_end(bytes, i)?;
                i = close;
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ if depth == 0 && bytes[i..].starts_with(needle) => {
                if needle == b"=" && !is_assignment(bytes, i) {
                    i += 1;
                    continue;
                }
                return Some(i);
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn find_template_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut stack = Vec::new();
    let mut i = scan_template(bytes, start + 1, &mut stack)?;
    while !stack.is_empty() {
        // inside `${`: match braces until the interpolation closes
        let close = find_closing_brace(bytes, i - 1)?;
        stack.pop();
        i = scan_template(bytes, close + 1, &mut stack)?;
    }
    Some(i)
}

fn is_assignment(bytes: &[u8], i: usize) -> bool {
    let prev = i.checked_sub(1).map(|p| bytes[p]);
    let next = bytes.get(i + 1).copied();
    !matches!(prev, Some(b'=' | b'!' | b'<' | b'>'))
        && !matches!(next, Some(b'=' | b'>'))
}
