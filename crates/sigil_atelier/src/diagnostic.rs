//! Plain-text rendering of positional errors and warnings.
//!
//! ```text
//! Invalid $css call
//!
//! App.svelte
//!
//! 0 |<script>
//! 1 |  const a = $css(1);
//!               ^^^^^^^
//!      $css argument must be a string
//! ```
//!
//! Line numbers are zero based. Lines wider than [`MAX_WIDTH`] are truncated,
//! except the offending line which wraps until the marked range is visible.

use crate::error::RuneError;

pub const MAX_WIDTH: usize = 80;

/// Rendered source excerpt with a caret underline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub text: String,
    /// Column the caret underline starts at
    pub start_column: usize,
    /// Number of carets
    pub width: usize,
}

impl Location {
    /// `message` centred under the underline.
    pub fn caption(&self, message: &str) -> String {
        print_below(message, self.start_column, self.width)
    }
}

fn overflow_line(line: &str) -> String {
    if line.chars().count() > MAX_WIDTH {
        let mut truncated: String = line.chars().take(MAX_WIDTH - 3).collect();
        truncated.push_str("...");
        truncated
    } else {
        line.to_string()
    }
}

/// Split into `MAX_WIDTH` wide rows, keeping at most `max_rows`.
fn wrap_line(line: &str, max_rows: usize) -> String {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(MAX_WIDTH)
        .take(max_rows)
        .map(|row| row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Render the lines leading up to `start` and underline `start..end`.
///
/// `height` is the number of preceding lines shown. An empty `filename`
/// omits the header.
pub fn print_location(filename: &str, content: &str, start: u32, end: u32, height: usize) -> Location {
    let start = floor_char_boundary(content, start as usize);
    let end = floor_char_boundary(content, (end as usize).max(start));

    let mut message = String::new();
    if !filename.is_empty() {
        message.push_str(filename);
        message.push_str("\n\n");
    }

    let before = &content[..start];
    let lines: Vec<&str> = content.split('\n').collect();
    let start_line = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let width = content[start..end].chars().count();
    let number_width = start_line.to_string().len();
    let base_column = content[line_start..start].chars().count() + number_width + 2;
    let start_column = base_column % MAX_WIDTH;
    let rows = (base_column + width) / MAX_WIDTH + 1;

    for (i, line) in lines
        .iter()
        .enumerate()
        .take(start_line)
        .skip(start_line.saturating_sub(height))
    {
        let numbered = format!("{:>w$} |{}", i, line.replace('\t', " "), w = number_width);
        message.push_str(&overflow_line(&numbered));
        message.push('\n');
    }

    let numbered = format!("{} |{}", start_line, lines[start_line].replace('\t', " "));
    message.push_str(&wrap_line(&numbered, rows));
    message.push('\n');
    message.push_str(&" ".repeat(start_column));
    message.push_str(&"^".repeat(width));
    message.push('\n');

    Location {
        text: message,
        start_column,
        width,
    }
}

/// Centre every line of `message` under the range starting at `start_column`
/// spanning `width` columns. Lines that would not fit are left unpadded.
pub fn print_below(message: &str, start_column: usize, width: usize) -> String {
    message
        .split('\n')
        .map(|line| {
            let len = line.chars().count() as i64;
            let padding = (2 * start_column as i64 + width as i64 - len).div_euclid(2);
            if padding <= 0 || padding + len >= MAX_WIDTH as i64 {
                line.to_string()
            } else {
                format!("{}{}", " ".repeat(padding as usize), line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full diagnostic for a positional error.
pub fn pretty_message(filename: &str, content: &str, error: &RuneError) -> String {
    let mut message = error.message.clone();
    message.push_str("\n\n");
    let location = print_location(filename, content, error.start, error.end, 5);
    message.push_str(&location.text);
    if let Some(detail) = &error.detail {
        message.push_str(&location.caption(detail));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuneErrorKind;
    use sigil_carton::Span;

    #[test]
    fn test_print_location() {
        let content = "abc\ndef $css(1) x";
        let location = print_location("test.svelte", content, 8, 15, 5);
        assert_eq!(
            location.text,
            "test.svelte\n\n0 |abc\n1 |def $css(1) x\n       ^^^^^^^\n"
        );
        assert_eq!(location.start_column, 7);
        assert_eq!(location.width, 7);
    }

    #[test]
    fn test_print_location_height_and_padding() {
        let content = "0\n1\n2\n3\n4\n5\n6\n7\n8\n9\n10 x";
        let location = print_location("", content, 23, 24, 2);
        assert_eq!(location.text, " 8 |8\n 9 |9\n10 |10 x\n       ^\n");
    }

    #[test]
    fn test_print_location_truncates_context() {
        let long = "a".repeat(100);
        let content = format!("{}\nb", long);
        let location = print_location("", &content, 101, 102, 5);
        let first = location.text.lines().next().unwrap();
        assert_eq!(first.chars().count(), MAX_WIDTH);
        assert!(first.ends_with("..."));
    }

    #[test]
    fn test_print_location_tabs() {
        let location = print_location("", "\tx", 1, 2, 5);
        assert_eq!(location.text, "0 | x\n    ^\n");
    }

    #[test]
    fn test_print_below_centres() {
        assert_eq!(print_below("bad", 7, 7), "         bad");
        assert_eq!(print_below("a\nbbb", 4, 2), "    a\n   bbb");
    }

    #[test]
    fn test_print_below_overflow() {
        let line = "x".repeat(40);
        assert_eq!(print_below(&line, 70, 2), line);
    }

    #[test]
    fn test_pretty_message() {
        let content = "abc\ndef $css(1) x";
        let error = RuneError::new(
            RuneErrorKind::InvalidCall,
            "Invalid $css call",
            Span::new(8, 15),
            "bad",
        );
        assert_eq!(
            pretty_message("test.svelte", content, &error),
            "Invalid $css call\n\ntest.svelte\n\n0 |abc\n1 |def $css(1) x\n       ^^^^^^^\n         bad"
        );
    }
}
