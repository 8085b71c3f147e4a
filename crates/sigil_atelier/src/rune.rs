//! `$css` call recognition shared by the scanner and the rewriter.

use oxc_ast::ast::{Argument, CallExpression, Expression};
use sigil_carton::{SmallVec, Span};

use crate::error::{RuneError, RuneErrorKind};

pub const RUNE_NAME: &str = "$css";

/// The class list of a `$css(...)` call.
///
/// Returns `None` when `call` is not a rune call; `span` is the absolute
/// range of the call, used for errors.
pub(crate) fn rune_argument<'b>(
    call: &'b CallExpression<'_>,
    span: Span,
) -> Option<Result<&'b str, RuneError>> {
    match &call.callee {
        Expression::Identifier(ident) if ident.name == RUNE_NAME => {}
        _ => return None,
    }
    let invalid = |detail: &str| {
        Some(Err(RuneError::new(
            RuneErrorKind::InvalidCall,
            "Invalid $css call",
            span,
            detail,
        )))
    };
    if call.arguments.len() != 1 {
        return invalid("$css must have exactly one argument");
    }
    match &call.arguments[0] {
        Argument::StringLiteral(literal) => Some(Ok(literal.value.as_str())),
        Argument::NumericLiteral(_)
        | Argument::BooleanLiteral(_)
        | Argument::NullLiteral(_)
        | Argument::BigIntLiteral(_)
        | Argument::RegExpLiteral(_) => invalid("$css argument must be a string"),
        _ => invalid("$css must have exactly one argument"),
    }
}

/// Whitespace separated class names.
pub(crate) fn split_classes(value: &str) -> impl Iterator<Item = &str> {
    value.split_whitespace()
}

/// Whitespace separated class names with their absolute ranges; `base` is
/// the offset of `text` in the component.
pub(crate) fn class_spans(text: &str, base: u32) -> SmallVec<[(&str, Span); 4]> {
    let mut names = SmallVec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                names.push((&text[s..i], Span::new(base + s as u32, base + i as u32)));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        names.push((
            &text[s..],
            Span::new(base + s as u32, base + text.len() as u32),
        ));
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_classes() {
        let names: Vec<_> = split_classes("  a b\tc\n").collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(split_classes("").count(), 0);
    }

    #[test]
    fn test_class_spans() {
        let spans = class_spans(" a  bc", 10);
        assert_eq!(
            spans.as_slice(),
            &[("a", Span::new(11, 12)), ("bc", Span::new(14, 16))]
        );
    }
}
