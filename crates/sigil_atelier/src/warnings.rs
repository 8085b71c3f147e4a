//! Usage-level mixed-use warnings.

use tracing::warn;

use crate::diagnostic::print_location;
use crate::scan::ScanResult;

const SUPPRESS_HINT: &str =
    "You can suppress this warning by setting the `mixedUseWarnings` option to `false`.\n";

/// One warning per class referenced both through the rune and natively,
/// in source order of the rune reference. Each warning is also logged.
pub fn mixed_use_warnings(filename: &str, content: &str, scan: &ScanResult) -> Vec<String> {
    scan.classes
        .sorted()
        .into_iter()
        .filter_map(|(name, rune)| {
            let used = scan.used_classes.get(name)?;
            let rune_location = print_location(filename, content, rune.start, rune.end, 3);
            let used_location = print_location("", content, used.start, used.end, 3);

            let mut warning = format!(
                "[css rune]: The class \"{name}\" is used directly and with the $css rune. Consider using the $css rune for all classes."
            );
            warning.push_str("\n\n");
            warning.push_str(&rune_location.text);
            warning.push_str(&rune_location.caption("used with $css rune"));
            warning.push('\n');
            warning.push_str(&used_location.text);
            warning.push_str(&used_location.caption("used without $css rune"));
            warning.push_str("\n\n");
            warning.push_str(SUPPRESS_HINT);
            warning.push('\n');
            warn!("{warning}");
            Some(warning)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_carton::Span;

    #[test]
    fn test_warns_for_mixed_classes_only() {
        let content = "<p class=\"a\"></p>\n<p class={$css(\"a b\")}></p>";
        let scan = ScanResult {
            classes: [("a", Span::new(27, 38)), ("b", Span::new(27, 38))]
                .into_iter()
                .collect(),
            used_classes: [("a", Span::new(10, 11))].into_iter().collect(),
        };
        let warnings = mixed_use_warnings("App.svelte", content, &scan);
        assert_eq!(warnings.len(), 1);
        let warning = &warnings[0];
        assert!(warning.starts_with("[css rune]: The class \"a\" is used directly"));
        assert!(warning.contains("App.svelte\n\n0 |<p class=\"a\"></p>\n1 |"));
        assert!(warning.contains("used with $css rune"));
        assert!(warning.contains("used without $css rune"));
        assert!(warning.ends_with("to `false`.\n\n"));
    }

    #[test]
    fn test_no_overlap() {
        let scan = ScanResult {
            classes: [("a", Span::new(0, 1))].into_iter().collect(),
            used_classes: [("b", Span::new(0, 1))].into_iter().collect(),
        };
        assert!(mixed_use_warnings("", "ab", &scan).is_empty());
    }
}
