//! The per-component pipeline.
//!
//! PARSE -> SCAN -> REWRITE STYLES -> REWRITE RUNES -> RENDER. Any failure
//! aborts the component; nothing is rendered from a partial edit buffer.

use oxc_allocator::Allocator;
use serde::Serialize;
use sigil_carton::{EditBuffer, SourceMap};
use tracing::debug;

use crate::error::{PreprocessError, RuneError, RuneErrorKind};
use crate::options::{PreprocessOptions, RUNE_CLASSES};
use crate::scan::{find_referenced_classes, ScanResult};
use crate::transform_css::{transform_css, ClassNameMap, StyleRewrite};
use crate::transform_runes::transform_runes;
use crate::warnings::mixed_use_warnings;

/// Rewritten component.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessOutput {
    pub code: String,
    /// `None` when the component does not use the rune
    pub map: Option<SourceMap>,
    pub class_names: ClassNameMap,
    pub warnings: Vec<String>,
}

impl PreprocessOutput {
    fn unchanged(source: &str) -> Self {
        Self {
            code: source.to_string(),
            map: None,
            class_names: ClassNameMap::new(),
            warnings: Vec::new(),
        }
    }
}

/// Preprocess one component.
///
/// `filename` is mixed into the class hash and shown in diagnostics.
pub fn preprocess(
    source: &str,
    filename: &str,
    options: &PreprocessOptions,
) -> Result<PreprocessOutput, PreprocessError> {
    let allocator = Allocator::default();
    let root = sigil_armature::parse(&allocator, source).map_err(PreprocessError::parse)?;

    let scan = find_referenced_classes(&root)
        .map_err(|error| PreprocessError::rune(error, filename, source))?;
    if scan.classes.is_empty() {
        debug!("no rune calls, skipping");
        return Ok(PreprocessOutput::unchanged(source));
    }
    if options.increase_specificity {
        check_reserved(&scan).map_err(|error| PreprocessError::rune(error, filename, source))?;
    }

    let mut warnings = if options.mixed_use_warnings.is_enabled() {
        mixed_use_warnings(filename, source, &scan)
    } else {
        Vec::new()
    };

    let hash = options.hash.hash(&format!("{filename}{source}"));
    let mut buffer = EditBuffer::new(source);
    let style = transform_css(
        &root,
        &mut buffer,
        &scan,
        &StyleRewrite {
            hash: &hash,
            filename,
            warn_selectors: options.mixed_use_warnings.warns_selectors(),
            increase_specificity: options.increase_specificity,
        },
    )
    .map_err(|error| PreprocessError::from_transform(error, filename, source))?;
    transform_runes(
        &root,
        &mut buffer,
        &scan.classes,
        &style.class_names,
        options.increase_specificity,
    )
    .map_err(|error| PreprocessError::from_transform(error, filename, source))?;

    let (code, map) = buffer.render_output(filename);
    warnings.extend(style.warnings);
    debug!(classes = style.class_names.len(), "preprocessed component");
    Ok(PreprocessOutput {
        code,
        map: Some(map),
        class_names: style.class_names,
        warnings,
    })
}

fn check_reserved(scan: &ScanResult) -> Result<(), RuneError> {
    for reserved in RUNE_CLASSES {
        if let Some(span) = scan.classes.get(reserved) {
            return Err(RuneError::new(
                RuneErrorKind::ReservedClass,
                "Invalid $css call",
                span,
                format!("class {reserved} is reserved when increaseSpecificity is enabled"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MixedUseWarnings;
    use sigil_carton::Hasher;

    fn options() -> PreprocessOptions {
        PreprocessOptions {
            hash: Hasher::custom(|_| "hash".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_unchanged_without_runes() {
        let source = "<script>let a = 1;</script>\n<p class=\"a\">hi</p>\n<style>.a { color: red; }</style>";
        let output = preprocess(source, "App.svelte", &options()).unwrap();
        assert_eq!(output.code, source);
        assert!(output.map.is_none());
        assert!(output.class_names.is_empty());
    }

    #[test]
    fn test_basic_component() {
        let source = r#"<script>
  const active = $css("test");
</script>
<p class={active}>hi</p>
<style>
  .test { color: red; }
</style>"#;
        let output = preprocess(source, "App.svelte", &options()).unwrap();
        insta::assert_snapshot!(output.code, @r#"
        <script>
          const active = "test-hash";
        </script>
        <p class={active}>hi</p>
        <style>
          :global(.test-hash) { color: red; }
        </style>
        "#);
        assert_eq!(
            output.class_names.get("test").map(String::as_str),
            Some("test-hash")
        );
        assert!(output.map.is_some());
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let error = preprocess("<<div />", "App.svelte", &options()).unwrap_err();
        assert!(matches!(error, PreprocessError::Parse { .. }));
        assert!(error.to_string().ends_with("The component failed to be parsed."));
    }

    #[test]
    fn test_undefined_class_is_pretty_printed() {
        let source = "<p class={$css(\"missing\")}>x</p>\n<style>.a {}</style>";
        let error = preprocess(source, "App.svelte", &options()).unwrap_err();
        let rune = error.rune_error().unwrap();
        assert_eq!(rune.kind, RuneErrorKind::UndefinedClass);
        let pretty = error.to_string();
        assert!(pretty.starts_with("Invalid $css call\n\nApp.svelte\n\n0 |<p class="));
        assert!(pretty.contains("class missing is not defined"));
    }

    #[test]
    fn test_mixed_usage_warnings() {
        let source = r#"<p class="test">a</p>
<p class={$css("test")}>b</p>
<style>.test {}</style>"#;
        let output = preprocess(source, "App.svelte", &options()).unwrap();
        assert!(output.code.contains(":global(.test-hash), .test {}"));
        assert_eq!(output.warnings.len(), 1);

        let silent = PreprocessOptions {
            mixed_use_warnings: MixedUseWarnings::Off,
            ..options()
        };
        let output = preprocess(source, "App.svelte", &silent).unwrap();
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_selector_warnings_at_highest_level() {
        let source = r#"<p class="a b local">a</p>
<p class={$css("a b")}>b</p>
<style>.a .local .b {}</style>"#;
        let all = PreprocessOptions {
            mixed_use_warnings: MixedUseWarnings::All,
            ..options()
        };
        let output = preprocess(source, "App.svelte", &all).unwrap();
        // two class warnings and one selector warning
        assert_eq!(output.warnings.len(), 3);
        assert!(output.warnings[2].contains("expanded into 4 selectors"));
    }

    #[test]
    fn test_reserved_classes() {
        let source = "<p class={$css(\"__css_rune\")}>x</p><style>.__css_rune {}</style>";
        let specific = PreprocessOptions {
            increase_specificity: true,
            ..options()
        };
        let error = preprocess(source, "App.svelte", &specific).unwrap_err();
        assert_eq!(error.rune_error().unwrap().kind, RuneErrorKind::ReservedClass);
        // allowed without the option
        assert!(preprocess(source, "App.svelte", &options()).is_ok());
    }

    #[test]
    fn test_hash_input_is_filename_and_source() {
        let source = "<p class={$css(\"a\")}>x</p><style>.a {}</style>";
        let echo = PreprocessOptions {
            hash: Hasher::custom(|input| input.len().to_string()),
            ..Default::default()
        };
        let output = preprocess(source, "A.svelte", &echo).unwrap();
        let expected = format!("a-{}", "A.svelte".len() + source.len());
        assert_eq!(output.class_names.get("a"), Some(&expected));
    }

    #[test]
    fn test_default_hash_is_stable() {
        let source = "<p class={$css(\"a\")}>x</p><style>.a {}</style>";
        let first = preprocess(source, "A.svelte", &PreprocessOptions::default()).unwrap();
        let second = preprocess(source, "A.svelte", &PreprocessOptions::default()).unwrap();
        assert_eq!(first.code, second.code);
        let other = preprocess(source, "B.svelte", &PreprocessOptions::default()).unwrap();
        assert_ne!(first.class_names, other.class_names);

        let edited = "<p class={$css(\"a\")}>y</p><style>.a {}</style>";
        let changed = preprocess(edited, "A.svelte", &PreprocessOptions::default()).unwrap();
        assert_ne!(first.class_names, changed.class_names);
    }
}
