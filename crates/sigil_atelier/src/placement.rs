//! Placement rules for global escapes.
//!
//! The host compiler accepts `:global(...)` only at the beginning or end of
//! a selector. Every simple selector of a complex selector is classified
//! and the sequence is checked before anything is rewritten:
//!
//! ```text
//! .rune .rune .native .native .rune   // OK
//! .rune .native .rune .native .rune   // NOT OK
//! .native .mixed .native              // NOT OK, mixed must be first or last
//! ```

use sigil_carton::{CompactString, Span};

use crate::error::{RuneError, RuneErrorKind};

const PLACEMENT_MESSAGE: &str =
    "Invalid class placement. Svelte only allows global classes at the beginning or end of a selector list.";

/// How a selector is referenced by the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Not named by any rune; ids, types and attributes are always native
    Native,
    /// Named by a rune only
    Rune,
    /// Named by a rune and used natively
    Mixed,
}

impl Placement {
    pub fn is_rune(self) -> bool {
        self != Self::Native
    }
}

/// A simple selector taking part in placement validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub name: CompactString,
    pub span: Span,
    pub placement: Placement,
    /// Class selector, as opposed to an id, type or attribute
    pub is_class: bool,
}

/// Check that rune selectors only appear where they can be escaped.
///
/// `list` is the range of the whole selector list and is used for the
/// error.
pub fn validate_placement(occurrences: &[Occurrence], list: Span) -> Result<(), RuneError> {
    let mut sorted: Vec<&Occurrence> = occurrences.iter().collect();
    sorted.sort_by_key(|o| o.span.start);

    // only rune selectors seen so far
    let mut in_start = true;
    // a native selector was followed by a rune selector
    let mut in_end = false;
    let mut cause: Option<&Occurrence> = None;
    let last = sorted.len().saturating_sub(1);

    for (i, occurrence) in sorted.iter().copied().enumerate() {
        let placement = occurrence.placement;
        if placement.is_rune() {
            cause = Some(occurrence);
        }
        if placement == Placement::Mixed && i != 0 && i != last {
            return Err(placement_error(occurrence, list));
        }
        if placement != Placement::Rune && in_start {
            in_start = false;
            continue;
        }
        if placement == Placement::Mixed || (!in_start && placement == Placement::Rune) {
            in_end = true;
        }
        if placement == Placement::Native && in_end {
            return Err(placement_error(cause.unwrap_or(occurrence), list));
        }
    }
    Ok(())
}

fn placement_error(cause: &Occurrence, list: Span) -> RuneError {
    let name = &cause.name;
    let mut detail = String::from(
        "Contains a selector that is used by runes and is not in the beginning or end of the selector list. \n\n",
    );
    match cause.placement {
        Placement::Mixed => {
            detail.push_str(&format!(
                "The class \"{name}\" is used with the $css rune and natively. It can only be used the first or last selector.\n"
            ));
            detail.push_str(&format!(
                "Consider using the $css rune for all references to this class \"{name}\"."
            ));
        }
        Placement::Rune => {
            detail.push_str(&format!(
                "The class \"{name}\" is used with the $css rune. Other selectors in this rule are used natively or mixed. Classes that are used with the $css rune must be in the beginning or end of the selector.\n"
            ));
            detail.push_str(".rune .rune .native .native .rune // OK\n");
            detail.push_str(".rune .native .rune .native .rune // NOT OK");
        }
        Placement::Native => {}
    }
    detail.push('\n');
    RuneError::new(RuneErrorKind::InvalidPlacement, PLACEMENT_MESSAGE, list, detail)
}
