//! Class Reference Scanner.
//!
//! One pass over the markup and both script regions that records:
//!
//! - every class named by a `$css(...)` call, with the call's range
//! - every class used natively: `class="..."` text, string literals and
//!   object keys inside a `class={...}` value, and `class:` directives
//!
//! Scripts only contribute rune calls. A class may end up in both sets.

use oxc_ast::ast::{CallExpression, ObjectExpression, ObjectPropertyKind, PropertyKey, StringLiteral};
use oxc_ast_visit::{walk, Visit};
use oxc_span::GetSpan;
use sigil_carton::{CompactString, FxHashMap, Span};
use sigil_relief::visit::{walk_attribute, walk_directive};
use sigil_relief::*;
use tracing::debug;

use crate::error::RuneError;
use crate::rune::{class_spans, rune_argument, split_classes};

/// Class names with the location they were last referenced at.
#[derive(Debug, Clone, Default)]
pub struct ClassNameSet {
    entries: FxHashMap<CompactString, Span>,
}

impl ClassNameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name`; a later reference replaces an earlier one.
    pub fn insert(&mut self, name: &str, span: Span) {
        self.entries.insert(CompactString::new(name), span);
    }

    pub fn get(&self, name: &str) -> Option<Span> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by position, then name.
    pub fn sorted(&self) -> Vec<(&str, Span)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(name, span)| (name.as_str(), *span))
            .collect();
        entries.sort_by(|a, b| (a.1.start, a.0).cmp(&(b.1.start, b.0)));
        entries
    }
}

impl<'n> FromIterator<(&'n str, Span)> for ClassNameSet {
    fn from_iter<I: IntoIterator<Item = (&'n str, Span)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, span) in iter {
            set.insert(name, span);
        }
        set
    }
}

/// Scanner output.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Classes referenced through `$css(...)`
    pub classes: ClassNameSet,
    /// Classes referenced without the rune
    pub used_classes: ClassNameSet,
}

/// Collect rune and native class references of a component.
pub fn find_referenced_classes(root: &Root<'_>) -> Result<ScanResult, RuneError> {
    let mut scanner = ClassScanner::default();
    scanner.visit_fragment(&root.fragment, &ClassContext::default())?;
    for script in root.scripts() {
        let mut expressions = ExpressionScanner {
            result: &mut scanner.result,
            offset: script.content.start,
            in_class: false,
            native: false,
            error: None,
        };
        expressions.visit_program(&script.program);
        expressions.finish()?;
    }
    debug!(
        classes = scanner.result.classes.len(),
        used_classes = scanner.result.used_classes.len(),
        "scanned class references"
    );
    Ok(scanner.result)
}

/// Ancestor state of the markup walk.
#[derive(Debug, Clone, Copy, Default)]
struct ClassContext {
    /// Inside the value of a `class` attribute
    in_class: bool,
}

#[derive(Default)]
struct ClassScanner {
    result: ScanResult,
}

impl ClassScanner {
    fn record_text(&mut self, text: &Text) {
        for (name, span) in class_spans(&text.data, text.span.start) {
            self.result.used_classes.insert(name, span);
        }
    }
}

impl<'a> TemplateVisitor<'a> for ClassScanner {
    type State = ClassContext;
    type Error = RuneError;

    fn visit_attribute(
        &mut self,
        attribute: &Attribute<'a>,
        state: &ClassContext,
    ) -> Result<(), RuneError> {
        if attribute.name != "class" {
            return walk_attribute(self, attribute, state);
        }
        if let Some(text) = attribute.value.as_static_text() {
            self.record_text(text);
            return Ok(());
        }
        walk_attribute(self, attribute, &ClassContext { in_class: true })
    }

    fn visit_directive(
        &mut self,
        directive: &Directive<'a>,
        state: &ClassContext,
    ) -> Result<(), RuneError> {
        if directive.kind == DirectiveKind::Class {
            self.result.used_classes.insert(&directive.name, directive.span);
        }
        walk_directive(self, directive, state)
    }

    fn visit_text(&mut self, text: &Text, state: &ClassContext) -> Result<(), RuneError> {
        // text chunks of a mixed `class="a {b}"` value
        if state.in_class {
            self.record_text(text);
        }
        Ok(())
    }

    fn visit_expression(
        &mut self,
        expression: &JsExpression<'a>,
        state: &ClassContext,
    ) -> Result<(), RuneError> {
        let mut expressions = ExpressionScanner {
            result: &mut self.result,
            offset: expression.offset,
            in_class: state.in_class,
            native: true,
            error: None,
        };
        expressions.visit_expression(&expression.node);
        expressions.finish()
    }
}

/// Walks one JavaScript tree. `in_class` is reset inside rune calls and
/// object literals, mirroring how the markup walk threads it.
struct ExpressionScanner<'r> {
    result: &'r mut ScanResult,
    offset: u32,
    in_class: bool,
    /// Record native usage (markup only)
    native: bool,
    error: Option<RuneError>,
}

impl ExpressionScanner<'_> {
    fn absolute(&self, span: oxc_span::Span) -> Span {
        Span::new(span.start, span.end).offset_by(self.offset)
    }

    fn finish(self) -> Result<(), RuneError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn with_class_context(&mut self, in_class: bool, f: impl FnOnce(&mut Self)) {
        let saved = std::mem::replace(&mut self.in_class, in_class);
        f(self);
        self.in_class = saved;
    }
}

impl<'a> Visit<'a> for ExpressionScanner<'_> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if self.error.is_some() {
            return;
        }
        let span = self.absolute(call.span);
        match rune_argument(call, span) {
            None => walk::walk_call_expression(self, call),
            Some(Ok(value)) => {
                for name in split_classes(value) {
                    self.result.classes.insert(name, span);
                }
                self.with_class_context(false, |this| walk::walk_call_expression(this, call));
            }
            Some(Err(error)) => self.error = Some(error),
        }
    }

    fn visit_object_expression(&mut self, object: &ObjectExpression<'a>) {
        if self.native && self.in_class {
            for property in &object.properties {
                let ObjectPropertyKind::ObjectProperty(property) = property else {
                    continue;
                };
                if property.computed {
                    continue;
                }
                let span = self.absolute(property.key.span());
                match &property.key {
                    PropertyKey::StaticIdentifier(ident) => {
                        self.result.used_classes.insert(&ident.name, span);
                    }
                    PropertyKey::StringLiteral(literal) => {
                        for name in split_classes(&literal.value) {
                            self.result.used_classes.insert(name, span);
                        }
                    }
                    _ => {}
                }
            }
        }
        self.with_class_context(false, |this| walk::walk_object_expression(this, object));
    }

    fn visit_string_literal(&mut self, literal: &StringLiteral<'a>) {
        if self.native && self.in_class {
            let span = self.absolute(literal.span);
            for name in split_classes(&literal.value) {
                self.result.used_classes.insert(name, span);
            }
        }
    }
}
