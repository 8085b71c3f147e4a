//! Escaping rune selectors inside one complex selector.
//!
//! A rune selector is escaped by wrapping its hashed name in `:global(...)`.
//! Escaped selectors that are chained without anything between them share a
//! single wrapper (`:global(.a-h.b-h)`), since `:global(.a-h):global(.b-h)`
//! is rejected by the host compiler.
//!
//! Selectors that are also used natively must keep matching the scoped class,
//! so the complex selector is expanded into every escaped/scoped combination
//! of them.

use sigil_carton::Span;

use crate::error::{RuneError, RuneErrorKind};

/// Highest number of mixed selectors a complex selector may expand.
pub const MAX_PERMUTATION_SELECTORS: usize = 12;

/// A rune selector of a complex selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target<'h> {
    pub span: Span,
    /// Hashed class name
    pub hashed: &'h str,
    /// Also used natively
    pub mixed: bool,
}

/// Wrappers for the targets selected by `escaped`, in source order.
///
/// `suffix` is appended inside each wrapper.
pub fn escaped_runs(
    targets: &[Target<'_>],
    escaped: impl Fn(usize) -> bool,
    suffix: &str,
) -> Vec<(Span, String)> {
    let mut runs: Vec<(Span, String)> = Vec::new();
    let mut open: Option<(Span, String)> = None;
    for (i, target) in targets.iter().enumerate() {
        if !escaped(i) {
            if let Some(run) = open.take() {
                runs.push(run);
            }
            continue;
        }
        match &mut open {
            Some((span, classes)) if span.end == target.span.start => {
                span.end = target.span.end;
                classes.push('.');
                classes.push_str(target.hashed);
            }
            _ => {
                if let Some(run) = open.take() {
                    runs.push(run);
                }
                open = Some((target.span, format!(".{}", target.hashed)));
            }
        }
    }
    runs.extend(open);
    runs.into_iter()
        .map(|(span, classes)| (span, format!(":global({classes}{suffix})")))
        .collect()
}

/// Copy `span` of `source` with `runs` substituted.
fn render_variant(source: &str, span: Span, runs: &[(Span, String)]) -> String {
    let mut out = String::with_capacity(span.len() as usize + 32);
    let mut cursor = span.start;
    for (run, replacement) in runs {
        out.push_str(Span::new(cursor, run.start).source_text(source));
        out.push_str(replacement);
        cursor = run.end;
    }
    out.push_str(Span::new(cursor, span.end).source_text(source));
    out
}

/// Expand the complex selector at `span` into every combination of escaped
/// and scoped mixed targets, joined with `", "`.
///
/// Rune-only targets are escaped in every variant. Variants are ordered by
/// a bitmask counting down, the first mixed target being the most
/// significant bit, so the fully escaped variant comes first.
pub fn permute(
    source: &str,
    span: Span,
    targets: &[Target<'_>],
    suffix: &str,
) -> Result<Vec<String>, RuneError> {
    let mixed: Vec<usize> = targets
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.mixed.then_some(i))
        .collect();
    let k = mixed.len();
    if k > MAX_PERMUTATION_SELECTORS {
        return Err(RuneError::new(
            RuneErrorKind::InvalidPlacement,
            "Too many mixed selectors",
            span,
            format!(
                "The selector uses {k} classes with and without the $css rune, at most {MAX_PERMUTATION_SELECTORS} are supported."
            ),
        ));
    }

    let mut variants = Vec::with_capacity(1 << k);
    for mask in (0..1u32 << k).rev() {
        let escaped = |i: usize| match mixed.iter().position(|&m| m == i) {
            Some(bit) => mask & (1 << (k - 1 - bit)) != 0,
            None => true,
        };
        let runs = escaped_runs(targets, escaped, suffix);
        variants.push(render_variant(source, span, &runs));
    }
    Ok(variants)
}
