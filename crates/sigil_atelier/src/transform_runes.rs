//! Rune Call Rewriter.
//!
//! Replaces every `$css("...")` call in markup and scripts with a string
//! literal holding the hashed class names.

use oxc_ast::ast::{CallExpression, Program};
use oxc_ast_visit::{walk, Visit};
use sigil_carton::{EditBuffer, Span};
use sigil_relief::{JsExpression, Root, TemplateVisitor};
use tracing::debug;

use crate::error::{RuneError, RuneErrorKind, TransformError};
use crate::options::RUNE_CLASSES;
use crate::rune::{rune_argument, split_classes};
use crate::scan::ClassNameSet;
use crate::transform_css::ClassNameMap;

/// Rewrite all rune calls of the component.
///
/// A class without a hashed name fails with an error at the location the
/// scanner recorded for it.
pub fn transform_runes(
    root: &Root<'_>,
    buffer: &mut EditBuffer<'_>,
    classes: &ClassNameSet,
    class_names: &ClassNameMap,
    increase_specificity: bool,
) -> Result<(), TransformError> {
    let mut rewriter = RuneRewriter {
        buffer,
        classes,
        class_names,
        sentinel: increase_specificity.then_some(RUNE_CLASSES[0]),
        offset: 0,
        rewritten: 0,
        error: None,
    };
    rewriter.visit_fragment(&root.fragment, &())?;
    for script in root.scripts() {
        rewriter.rewrite_program(&script.program, script.content.start)?;
    }
    debug!(calls = rewriter.rewritten, "rewrote rune calls");
    Ok(())
}

struct RuneRewriter<'r, 'b> {
    buffer: &'r mut EditBuffer<'b>,
    classes: &'r ClassNameSet,
    class_names: &'r ClassNameMap,
    sentinel: Option<&'static str>,
    /// Offset of the JavaScript source being walked
    offset: u32,
    rewritten: usize,
    error: Option<TransformError>,
}

impl RuneRewriter<'_, '_> {
    fn rewrite_program(&mut self, program: &Program<'_>, offset: u32) -> Result<(), TransformError> {
        self.offset = offset;
        self.visit_program(program);
        self.take_error()
    }

    fn take_error(&mut self) -> Result<(), TransformError> {
        match self.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn replacement(&self, value: &str) -> Result<String, RuneError> {
        let mut hashed = Vec::new();
        for name in split_classes(value) {
            let Some(class) = self.class_names.get(name) else {
                let span = self.classes.get(name).unwrap_or_default();
                return Err(RuneError::new(
                    RuneErrorKind::UndefinedClass,
                    "Invalid $css call",
                    span,
                    format!("class {name} is not defined"),
                ));
            };
            hashed.push(class.as_str());
        }
        hashed.extend(self.sentinel);
        Ok(format!("\"{}\"", hashed.join(" ")))
    }

    fn rewrite_call(&mut self, span: Span, value: &str) -> Result<(), TransformError> {
        let replacement = self.replacement(value)?;
        self.buffer.overwrite(span, replacement)?;
        self.rewritten += 1;
        Ok(())
    }
}

impl<'a> TemplateVisitor<'a> for RuneRewriter<'_, '_> {
    type State = ();
    type Error = TransformError;

    fn visit_expression(
        &mut self,
        expression: &JsExpression<'a>,
        _state: &(),
    ) -> Result<(), TransformError> {
        self.offset = expression.offset;
        Visit::visit_expression(self, &expression.node);
        self.take_error()
    }
}

impl<'a> Visit<'a> for RuneRewriter<'_, '_> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if self.error.is_some() {
            return;
        }
        let span = Span::new(call.span.start, call.span.end).offset_by(self.offset);
        let result = match rune_argument(call, span) {
            None => {
                walk::walk_call_expression(self, call);
                return;
            }
            Some(Ok(value)) => self.rewrite_call(span, value),
            Some(Err(error)) => Err(error.into()),
        };
        if let Err(error) = result {
            self.error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use sigil_armature::parse;
    use sigil_carton::CompactString;

    use crate::scan::find_referenced_classes;

    fn rewrite(source: &str, names: &[&str], increase_specificity: bool) -> Result<String, TransformError> {
        let allocator = Allocator::default();
        let root = parse(&allocator, source).unwrap();
        let scan = find_referenced_classes(&root)?;
        let class_names: ClassNameMap = names
            .iter()
            .map(|name| (CompactString::new(name), format!("{name}-hash")))
            .collect();
        let mut buffer = EditBuffer::new(source);
        transform_runes(&root, &mut buffer, &scan.classes, &class_names, increase_specificity)?;
        Ok(buffer.render())
    }

    #[test]
    fn test_rewrites_all_regions() {
        let source = r#"<script module>export const a = $css("a");</script>
<script>const b = $css("a b");</script>
<p class={$css("b")}>{$css("a")}</p>"#;
        let code = rewrite(source, &["a", "b"], false).unwrap();
        assert_eq!(
            code,
            r#"<script module>export const a = "a-hash";</script>
<script>const b = "a-hash b-hash";</script>
<p class={"b-hash"}>{"a-hash"}</p>"#
        );
    }

    #[test]
    fn test_textarea_content() {
        let code = rewrite(r#"<textarea>{$css("a")} and {$css("b")}</textarea>"#, &["a", "b"], false).unwrap();
        assert_eq!(code, r#"<textarea>{"a-hash"} and {"b-hash"}</textarea>"#);
        let error = rewrite(r#"<textarea>{$css("a")}</textarea>"#, &[], false).unwrap_err();
        assert!(matches!(error, TransformError::Rune(e) if e.kind == RuneErrorKind::UndefinedClass));
    }

    #[test]
    fn test_nested_calls() {
        let code = rewrite(
            r#"<p class={cn($css("a"), active && $css("b"))}>x</p>"#,
            &["a", "b"],
            false,
        )
        .unwrap();
        assert_eq!(code, r#"<p class={cn("a-hash", active && "b-hash")}>x</p>"#);
    }

    #[test]
    fn test_whitespace_in_class_list() {
        let code = rewrite(r#"<p class={$css("  a   b ")}>x</p>"#, &["a", "b"], false).unwrap();
        assert_eq!(code, r#"<p class={"a-hash b-hash"}>x</p>"#);
    }

    #[test]
    fn test_sentinel_class() {
        let code = rewrite(r#"<p class={$css("a")}>x</p>"#, &["a"], true).unwrap();
        assert_eq!(code, r#"<p class={"a-hash __css_rune"}>x</p>"#);
    }

    #[test]
    fn test_undefined_class_points_at_recorded_reference() {
        let source = r#"<script>const x = $css("missing");</script>
<p class={$css("a")}>x</p>"#;
        let error = rewrite(source, &["a"], false).unwrap_err();
        let TransformError::Rune(error) = error else {
            panic!("expected a rune error");
        };
        assert_eq!(error.kind, RuneErrorKind::UndefinedClass);
        assert_eq!(error.message, "Invalid $css call");
        assert_eq!(error.detail.as_deref(), Some("class missing is not defined"));
        assert_eq!(error.span().source_text(source), r#"$css("missing")"#);
    }

    #[test]
    fn test_other_calls_untouched() {
        let source = r#"<script>const x = css("a"); $other("b");</script>"#;
        assert_eq!(rewrite(source, &[], false).unwrap(), source);
    }
}
