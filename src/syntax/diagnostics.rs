//! Error localization for parser diagnostics.

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bline (\d+)").expect("line pattern is valid"));
static COLUMN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcolumns? (\d+)").expect("column pattern is valid"));

/// First line number mentioned in a parser message.
pub fn line_from_message(message: &str) -> Option<usize> {
    first_number(&LINE_RE, message).filter(|line| *line > 0)
}

/// First column number mentioned in a parser message.
pub fn column_from_message(message: &str) -> Option<usize> {
    first_number(&COLUMN_RE, message).filter(|column| *column > 0)
}

fn first_number(re: &Regex, message: &str) -> Option<usize> {
    re.captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Up to `width` source lines centered on the 1-based `line`, each prefixed
/// with its line number. `None` when the line is outside the text.
pub fn context_snippet(text: &str, line: usize, width: usize) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    if line == 0 || line > lines.len() || width == 0 {
        return None;
    }

    let before = (width - 1) / 2;
    let start = line.saturating_sub(before).max(1);
    let end = (start + width - 1).min(lines.len());

    let snippet = (start..=end)
        .map(|n| format!("{n:>4} | {}", lines[n - 1]))
        .collect::<Vec<_>>()
        .join("\n");
    Some(snippet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_line_and_column() {
        let msg = "Parser error at line 5 between columns 17 and 23: expected '.'";
        assert_eq!(line_from_message(msg), Some(5));
        assert_eq!(column_from_message(msg), Some(17));
        assert_eq!(line_from_message("unexpected end of file"), None);
    }

    #[test]
    fn snippet_is_centered() {
        let text = "one\ntwo\nthree\nfour\nfive";
        let snippet = context_snippet(text, 3, 3).unwrap();
        assert_eq!(snippet, "   2 | two\n   3 | three\n   4 | four");
    }

    #[test]
    fn snippet_clips_at_edges() {
        let text = "one\ntwo\nthree";
        assert_eq!(context_snippet(text, 1, 3).unwrap(), "   1 | one\n   2 | two\n   3 | three");
        assert_eq!(context_snippet(text, 3, 3).unwrap(), "   2 | two\n   3 | three");
        assert!(context_snippet(text, 9, 3).is_none());
    }
}
