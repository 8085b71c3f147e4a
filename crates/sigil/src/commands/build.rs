//! Build command - Preprocess Svelte components

use clap::{Args, ValueEnum};
use ignore::Walk;
use rayon::prelude::*;
use serde::Serialize;
use sigil_atelier::{preprocess, ClassNameMap, MixedUseWarnings, PreprocessOptions};
use sigil_carton::{Hasher, SourceMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::debug;

use crate::config::load_config;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Output rewritten components
    #[default]
    Code,
    /// Output JSON with code, class names and warnings, plus a source map
    Json,
    /// Only show statistics (no output)
    Stats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HashArg {
    /// djb2 in base 36
    Djb2,
    /// xxHash3 in hex
    Xxh3,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WarningsArg {
    /// No mixed-use warnings
    Off,
    /// Warn about classes used with and without the rune
    Use,
    /// Also warn about every expanded selector
    All,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Glob pattern(s) to match .svelte files (default: ./**/*.svelte)
    #[arg(default_value = "./**/*.svelte")]
    pub patterns: Vec<String>,

    /// Output directory (default: ./dist)
    #[arg(short, long, default_value = "./dist")]
    pub output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "code")]
    pub format: OutputFormat,

    /// Class hash function (overrides sigil.config.json)
    #[arg(long, value_enum)]
    pub hash: Option<HashArg>,

    /// Mixed-use warning level (overrides sigil.config.json)
    #[arg(long, value_enum)]
    pub mixed_use_warnings: Option<WarningsArg>,

    /// Add the `__css_rune` class to rune classes and escaped selectors
    #[arg(long)]
    pub increase_specificity: bool,

    /// Number of threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Continue on errors
    #[arg(long)]
    pub continue_on_error: bool,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            patterns: vec!["./**/*.svelte".to_string()],
            output: PathBuf::from("./dist"),
            format: OutputFormat::default(),
            hash: None,
            mixed_use_warnings: None,
            increase_specificity: false,
            threads: None,
            continue_on_error: false,
        }
    }
}

impl BuildArgs {
    /// Configuration file options with command-line overrides applied.
    fn options(&self, mut options: PreprocessOptions) -> PreprocessOptions {
        if let Some(hash) = self.hash {
            options.hash = match hash {
                HashArg::Djb2 => Hasher::Djb2,
                HashArg::Xxh3 => Hasher::Xxh3,
            };
        }
        if let Some(level) = self.mixed_use_warnings {
            options.mixed_use_warnings = match level {
                WarningsArg::Off => MixedUseWarnings::Off,
                WarningsArg::Use => MixedUseWarnings::Use,
                WarningsArg::All => MixedUseWarnings::All,
            };
        }
        if self.increase_specificity {
            options.increase_specificity = true;
        }
        options
    }
}

#[derive(Debug)]
struct BuildStats {
    success: AtomicUsize,
    failed: AtomicUsize,
    rewritten: AtomicUsize,
    warnings: AtomicUsize,
}

impl BuildStats {
    fn new() -> Self {
        Self {
            success: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            rewritten: AtomicUsize::new(0),
            warnings: AtomicUsize::new(0),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileOutput {
    filename: String,
    code: String,
    class_names: ClassNameMap,
    warnings: Vec<String>,
    #[serde(skip)]
    map: Option<SourceMap>,
}

pub fn run(args: BuildArgs) {
    let start = Instant::now();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            eprintln!("Failed to configure thread pool: {}", e);
            std::process::exit(1);
        }
    }

    let options = args.options(load_config(None).preprocess);
    debug!(?options, "resolved options");

    let files = collect_files(&args.patterns);
    if files.is_empty() {
        eprintln!("No .svelte files found matching the patterns");
        std::process::exit(1);
    }

    let stats = BuildStats::new();
    let results: Vec<_> = files
        .par_iter()
        .map(|(root, path)| match preprocess_file(path, &options) {
            Ok(output) => {
                stats.success.fetch_add(1, Ordering::Relaxed);
                if output.map.is_some() {
                    stats.rewritten.fetch_add(1, Ordering::Relaxed);
                }
                stats
                    .warnings
                    .fetch_add(output.warnings.len(), Ordering::Relaxed);
                Some((relative_path(root, path), output))
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                eprintln!("Error preprocessing {}:\n{}", path.display(), e);

                if !args.continue_on_error {
                    std::process::exit(1);
                }

                None
            }
        })
        .collect();

    if !matches!(args.format, OutputFormat::Stats) {
        for (relative, output) in results.into_iter().flatten() {
            if let Err(e) = write_output(&args.output, &relative, args.format, &output) {
                eprintln!("Failed to write {}: {}", relative.display(), e);
                stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    let elapsed = start.elapsed();
    let success = stats.success.load(Ordering::Relaxed);
    let failed = stats.failed.load(Ordering::Relaxed);
    let rewritten = stats.rewritten.load(Ordering::Relaxed);
    let warnings = stats.warnings.load(Ordering::Relaxed);

    if failed > 0 {
        eprintln!(
            "✗ {} file(s) failed, {} preprocessed in {:.4}s",
            failed,
            success,
            elapsed.as_secs_f64()
        );
        std::process::exit(1);
    }

    let file_word = if success == 1 { "file" } else { "files" };
    eprintln!(
        "✓ {} {} preprocessed ({} using $css, {} warning(s)) in {:.4}s",
        success,
        file_word,
        rewritten,
        warnings,
        elapsed.as_secs_f64()
    );
}

const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Matching `.svelte` files with the directory their walk started at.
fn collect_files(patterns: &[String]) -> Vec<(PathBuf, PathBuf)> {
    let mut files = Vec::new();

    for pattern in patterns {
        let (root, glob_pattern) = parse_pattern(pattern);
        let matcher = match glob::Pattern::new(&normalize(&glob_pattern)) {
            Ok(matcher) => matcher,
            Err(e) => {
                eprintln!("Invalid pattern {}: {}", pattern, e);
                continue;
            }
        };

        for entry in Walk::new(&root).flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "svelte")
                && matcher.matches_with(&normalize(&path.to_string_lossy()), MATCH_OPTIONS)
            {
                files.push((PathBuf::from(&root), path.to_path_buf()));
            }
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    files.dedup_by(|a, b| a.1 == b.1);
    files
}

/// Split a pattern into the directory to walk and the glob to match.
fn parse_pattern(pattern: &str) -> (String, String) {
    if let Some(pos) = pattern.find(['*', '?', '[']) {
        let root_part = &pattern[..pos];
        if let Some(last_slash) = root_part.rfind('/') {
            let root = &pattern[..last_slash];
            let root = if root.is_empty() { "." } else { root };
            return (root.to_string(), pattern.to_string());
        }
        return (".".to_string(), format!("./{}", pattern));
    }

    let path = Path::new(pattern);
    if path.is_dir() {
        let root = pattern.trim_end_matches('/');
        return (root.to_string(), format!("{}/**/*.svelte", root));
    }

    if let Some(parent) = path.parent() {
        let parent_str = parent.to_string_lossy();
        let parent_str = if parent_str.is_empty() {
            "."
        } else {
            &parent_str
        };
        let pattern = if parent_str == "." && !pattern.starts_with("./") {
            format!("./{}", pattern)
        } else {
            pattern.to_string()
        };
        return (parent_str.to_string(), pattern);
    }

    (".".to_string(), pattern.to_string())
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

fn relative_path(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()))
}

fn preprocess_file(path: &Path, options: &PreprocessOptions) -> Result<FileOutput, String> {
    let source = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    let filename = path.to_string_lossy().to_string();

    let output = preprocess(&source, &filename, options).map_err(|e| e.to_string())?;

    Ok(FileOutput {
        filename,
        code: output.code,
        class_names: output.class_names,
        warnings: output.warnings,
        map: output.map,
    })
}

fn write_output(
    out_dir: &Path,
    relative: &Path,
    format: OutputFormat,
    output: &FileOutput,
) -> std::io::Result<()> {
    let out_path = out_dir.join(relative);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }

    match format {
        OutputFormat::Stats => Ok(()),
        OutputFormat::Code => fs::write(&out_path, &output.code),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(output).map_err(std::io::Error::other)?;
            fs::write(out_path.with_extension("json"), json)?;
            if let Some(map) = &output.map {
                let map = serde_json::to_string_pretty(map).map_err(std::io::Error::other)?;
                fs::write(out_path.with_extension("map.json"), map)?;
            }
            Ok(())
        }
    }
}
