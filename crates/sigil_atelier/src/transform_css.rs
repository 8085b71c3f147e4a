//! Selector Classifier & Rewriter.
//!
//! Every rule prelude is processed one complex selector at a time:
//!
//! 1. classify its simple selectors (skipping `:global(...)` arguments)
//! 2. validate their placement
//! 3. escape the rune selectors, expanding the selector when some of them
//!    are also used natively
//!
//! The hashed name of each rune class is recorded in the returned
//! [`ClassNameMap`] the first time a selector names it.

use std::collections::BTreeMap;
use std::convert::Infallible;

use sigil_carton::{CompactString, EditBuffer};
use sigil_relief::visit::walk_simple_selector;
use sigil_relief::{ComplexSelector, CssVisitor, Root, Rule, SimpleSelector};
use tracing::{debug, warn};

use crate::diagnostic::print_location;
use crate::error::TransformError;
use crate::permutation::{escaped_runs, permute, Target};
use crate::placement::{validate_placement, Occurrence, Placement};
use crate::scan::ScanResult;

/// Original class name to hashed class name.
pub type ClassNameMap = BTreeMap<CompactString, String>;

/// Settings of one stylesheet rewrite.
#[derive(Debug, Clone, Copy)]
pub struct StyleRewrite<'s> {
    /// Per-file hash appended to class names
    pub hash: &'s str,
    /// Used in warnings
    pub filename: &'s str,
    /// Emit a warning for every expanded selector
    pub warn_selectors: bool,
    /// Add `.__css_rune` to every escape wrapper
    pub increase_specificity: bool,
}

/// Result of the stylesheet rewrite.
#[derive(Debug, Clone, Default)]
pub struct StyleOutput {
    pub class_names: ClassNameMap,
    pub warnings: Vec<String>,
}

/// Rewrite the selectors of the component stylesheet.
///
/// Returns an empty map when the component has no `<style>`.
pub fn transform_css(
    root: &Root<'_>,
    buffer: &mut EditBuffer<'_>,
    scan: &ScanResult,
    options: &StyleRewrite<'_>,
) -> Result<StyleOutput, TransformError> {
    let Some(stylesheet) = &root.css else {
        return Ok(StyleOutput::default());
    };
    let mut rewriter = StyleRewriter {
        source: root.source,
        buffer,
        scan,
        options,
        suffix: if options.increase_specificity {
            ".__css_rune"
        } else {
            ""
        },
        output: StyleOutput::default(),
        rewritten: 0,
    };
    rewriter.visit_stylesheet(stylesheet, &())?;
    debug!(
        classes = rewriter.output.class_names.len(),
        selectors = rewriter.rewritten,
        "rewrote stylesheet"
    );
    Ok(rewriter.output)
}

struct StyleRewriter<'r, 'b, 's> {
    source: &'s str,
    buffer: &'r mut EditBuffer<'b>,
    scan: &'r ScanResult,
    options: &'r StyleRewrite<'s>,
    suffix: &'static str,
    output: StyleOutput,
    /// Complex selectors touched so far
    rewritten: usize,
}

impl StyleRewriter<'_, '_, '_> {
    fn rewrite_complex(
        &mut self,
        rule: &Rule,
        complex: &ComplexSelector,
    ) -> Result<(), TransformError> {
        let mut collector = OccurrenceCollector {
            scan: self.scan,
            occurrences: Vec::new(),
        };
        collector
            .visit_complex_selector(complex, &())
            .unwrap_or_else(|never| match never {});
        let occurrences = collector.occurrences;
        if !occurrences.iter().any(|o| o.placement.is_rune()) {
            return Ok(());
        }
        validate_placement(&occurrences, rule.prelude.span)?;

        let hash = self.options.hash;
        for occurrence in occurrences.iter().filter(|o| o.placement.is_rune()) {
            if !self.output.class_names.contains_key(&occurrence.name) {
                self.output
                    .class_names
                    .insert(occurrence.name.clone(), format!("{}-{hash}", occurrence.name));
            }
        }
        let class_names = &self.output.class_names;
        let targets: Vec<Target<'_>> = occurrences
            .iter()
            .filter(|o| o.placement.is_rune())
            .filter_map(|o| {
                class_names.get(&o.name).map(|hashed| Target {
                    span: o.span,
                    hashed,
                    mixed: o.placement == Placement::Mixed,
                })
            })
            .collect();
        self.rewritten += 1;

        let has_mixed = targets.iter().any(|t| t.mixed);
        let with_native_class = occurrences
            .iter()
            .any(|o| o.is_class && o.placement == Placement::Native);
        let warn = self.options.warn_selectors
            && (with_native_class || (has_mixed && occurrences.len() > 1));

        if !has_mixed {
            let runs = escaped_runs(&targets, |_| true, self.suffix);
            if warn {
                self.push_selector_warning(complex, None);
            }
            for (span, wrapper) in runs {
                self.buffer.overwrite(span, wrapper)?;
            }
            return Ok(());
        }

        let variants = permute(self.source, complex.span, &targets, self.suffix)?;
        debug!(
            selector = complex.span.source_text(self.source),
            variants = variants.len(),
            "expanded mixed selector"
        );
        if warn {
            self.push_selector_warning(complex, Some(variants.len()));
        }
        self.buffer.overwrite(complex.span, variants.join(", "))?;
        Ok(())
    }

    /// `expanded` is the number of selectors a mixed selector became.
    fn push_selector_warning(&mut self, complex: &ComplexSelector, expanded: Option<usize>) {
        let selector = complex.span.source_text(self.source);
        let location = print_location(
            self.options.filename,
            self.source,
            complex.span.start,
            complex.span.end,
            3,
        );
        let mut warning = format!(
            "[css rune]: The selector \"{selector}\" combines classes used with and without the $css rune."
        );
        if let Some(count) = expanded {
            warning.push_str(&format!(
                " It was expanded into {count} selectors to match both usages."
            ));
        }
        warning.push_str("\n\n");
        warning.push_str(&location.text);
        warning.push_str("\n\n");
        warning.push_str(
            "You can suppress this warning by setting the `mixedUseWarnings` option to `\"use\"` or `false`.\n",
        );
        warn!("{warning}");
        self.output.warnings.push(warning);
    }
}

impl CssVisitor for StyleRewriter<'_, '_, '_> {
    type State = ();
    type Error = TransformError;

    fn visit_rule(&mut self, rule: &Rule, state: &()) -> Result<(), TransformError> {
        for complex in &rule.prelude.children {
            self.rewrite_complex(rule, complex)?;
        }
        // nested rules
        self.visit_block(&rule.block, state)
    }
}

/// Classifies the simple selectors of one complex selector.
struct OccurrenceCollector<'r> {
    scan: &'r ScanResult,
    occurrences: Vec<Occurrence>,
}

impl CssVisitor for OccurrenceCollector<'_> {
    type State = ();
    type Error = Infallible;

    fn visit_simple_selector(
        &mut self,
        selector: &SimpleSelector,
        state: &(),
    ) -> Result<(), Infallible> {
        let named = match selector {
            SimpleSelector::Class(class) => {
                let placement = match (
                    self.scan.classes.contains(&class.name),
                    self.scan.used_classes.contains(&class.name),
                ) {
                    (true, true) => Placement::Mixed,
                    (true, false) => Placement::Rune,
                    (false, _) => Placement::Native,
                };
                Some((class, placement, true))
            }
            SimpleSelector::Id(named)
            | SimpleSelector::Type(named)
            | SimpleSelector::Attribute(named) => Some((named, Placement::Native, false)),
            SimpleSelector::PseudoClass(pseudo) if pseudo.is_global() => return Ok(()),
            _ => None,
        };
        if let Some((named, placement, is_class)) = named {
            self.occurrences.push(Occurrence {
                name: named.name.clone(),
                span: named.span,
                placement,
                is_class,
            });
        }
        walk_simple_selector(self, selector, state)
    }
}
