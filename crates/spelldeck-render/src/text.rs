// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Card text normalisation — truncation and paragraph-aware wrapping.
//
// Card bodies are LaTeX fragments, so truncation must never leave a brace
// group open: the output goes straight into a strict parser.

use tracing::debug;

/// Appended after truncated text.
pub const ELLIPSIS: &str = "...";

/// Default wrap column.
pub const DEFAULT_WRAP_WIDTH: usize = 80;

/// How far back from the cut point we look for whitespace before giving up
/// and cutting mid-word.
const WORD_BOUNDARY_WINDOW: usize = 40;

/// Result of processing one description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedText {
    pub text: String,
    /// Whether the text had to be shortened to fit.
    pub truncated: bool,
}

/// Truncates and wraps card text with explicit limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextProcessor {
    pub max_length: usize,
    pub wrap_width: usize,
}

impl TextProcessor {
    pub fn new(max_length: usize, wrap_width: usize) -> Self {
        Self {
            max_length,
            wrap_width,
        }
    }

    /// Truncate (if longer than `max_length` characters) and then wrap.
    pub fn process(&self, raw: &str) -> ProcessedText {
        match truncate(raw, self.max_length) {
            Some(short) => {
                debug!(
                    from = raw.chars().count(),
                    to = short.chars().count(),
                    "truncated card text"
                );
                ProcessedText {
                    text: wrap(&short, self.wrap_width),
                    truncated: true,
                }
            }
            None => ProcessedText {
                text: wrap(raw, self.wrap_width),
                truncated: false,
            },
        }
    }
}

/// Shorten `raw` to at most `max_length` characters plus [`ELLIPSIS`].
///
/// Returns `None` when the text already fits. The kept prefix ends on a word
/// boundary when one exists within [`WORD_BOUNDARY_WINDOW`] characters of the
/// cut, has trailing whitespace removed, and gets one `}` per group it left
/// open. The closing braces count towards `max_length`.
pub fn truncate(raw: &str, max_length: usize) -> Option<String> {
    if raw.chars().count() <= max_length {
        return None;
    }

    let mut limit = max_length;
    loop {
        let prefix = cut_at_word_boundary(raw, limit);
        let open = unclosed_groups(prefix);
        let kept = prefix.chars().count();

        if kept + open <= max_length || limit == 0 {
            let mut out = String::with_capacity(prefix.len() + open + ELLIPSIS.len());
            out.push_str(prefix);
            out.extend(std::iter::repeat_n('}', open));
            out.push_str(ELLIPSIS);
            return Some(out);
        }

        // Make room for the closers and cut again; the prefix only shrinks.
        limit = max_length.saturating_sub(open).min(limit - 1);
    }
}

/// Prefix of at most `limit` characters, backed off to the last whitespace
/// and with trailing whitespace and any dangling backslash removed.
fn cut_at_word_boundary(raw: &str, limit: usize) -> &str {
    let cut = raw
        .char_indices()
        .nth(limit)
        .map_or(raw.len(), |(idx, _)| idx);
    let (head, tail) = raw.split_at(cut);

    let splits_word = !head.ends_with(char::is_whitespace)
        && tail.chars().next().is_some_and(|c| !c.is_whitespace());

    let mut prefix = head;
    if splits_word {
        let window_start = head
            .char_indices()
            .rev()
            .nth(WORD_BOUNDARY_WINDOW.saturating_sub(1))
            .map_or(0, |(idx, _)| idx);
        if let Some(ws) = head[window_start..].rfind(char::is_whitespace) {
            prefix = &head[..window_start + ws];
        }
    }

    let prefix = prefix.trim_end();
    strip_dangling_escape(prefix)
}

/// A prefix ending in an odd run of backslashes would turn the closing brace
/// we append into a literal `\}`.
fn strip_dangling_escape(text: &str) -> &str {
    let trailing = text.len() - text.trim_end_matches('\\').len();
    if trailing % 2 == 1 {
        text[..text.len() - 1].trim_end()
    } else {
        text
    }
}

/// Number of `{` groups opened and not closed in `text`. Escaped braces
/// (`\{`, `\}`) are literal characters, and stray closers are ignored.
pub fn unclosed_groups(text: &str) -> usize {
    let mut depth = 0usize;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                // Skip whatever is escaped, including another backslash.
                chars.next();
            }
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

/// Re-flow prose to `width` columns.
///
/// Blank lines separate paragraphs and are kept as a single blank line;
/// single newlines are soft and fold into the flow. Words are never split:
/// a word longer than `width` gets a line to itself. Wrapping wrapped text
/// at the same width changes nothing.
pub fn wrap(text: &str, width: usize) -> String {
    let width = width.max(1);

    paragraphs(text)
        .map(|paragraph| wrap_paragraph(&paragraph, width).join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Non-empty paragraphs, each as its list of words.
fn paragraphs(text: &str) -> impl Iterator<Item = Vec<&str>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.extend(line.split_whitespace());
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks.into_iter()
}

fn wrap_paragraph(words: &[&str], width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::with_capacity(width);
    let mut current_len = 0usize;

    for word in words {
        let word_len = word.chars().count();
        if current_line.is_empty() {
            current_line.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line.push_str(word);
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }
    lines
}
