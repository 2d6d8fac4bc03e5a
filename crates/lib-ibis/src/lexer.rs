//! Line-oriented lexer for the IBIS text format.
//!
//! IBIS is column-significant: a `[Keyword]` is only a keyword when `[` is
//! the first non-whitespace character of its line, the comment character is
//! configurable at runtime via the `[Comment Char]` directive, and numeric
//! literals carry SI-style unit modifiers appended without whitespace
//! (`1.2n`, `-3k`). The reader exposes the current line as a bounded slice
//! with a running cursor; nothing here allocates except keyword
//! normalization.

use crate::error::IbisError;
use lib_types::NA;

/// Maximum accepted line length, in bytes. Longer lines are a hard stop.
pub const MAX_LINE_LENGTH: usize = 2048;

/// Comment character at the start of a file.
pub const DEFAULT_COMMENT_CHAR: char = '|';

/// Punctuation accepted by the `[Comment Char]` directive.
const ALLOWED_COMMENT_CHARS: &str = "!\"#$%&'()*,:;<>?@\\^`{|}~";

/// Recoverable lexical problems, reported per statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexError {
    /// `[` opened a keyword but no `]` followed on the same line.
    UnterminatedKeyword,
    /// `[Comment Char]` directive did not name a legal character.
    InvalidCommentChar,
}

/// Cursor over the raw file buffer, one line at a time.
pub struct LineReader<'a> {
    source: &'a str,
    /// Byte offset of the next unread character of `source`.
    offset: usize,
    /// 1-based number of the current line.
    line_number: usize,
    /// Current line with the comment stripped.
    line: &'a str,
    /// Cursor within `line`.
    cursor: usize,
    comment_char: char,
    /// A `[Comment Char]` directive takes effect starting the next line.
    pending_comment_char: Option<char>,
}

impl<'a> LineReader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line_number: 0,
            line: "",
            cursor: 0,
            comment_char: DEFAULT_COMMENT_CHAR,
            pending_comment_char: None,
        }
    }

    /// 1-based number of the line the cursor is on.
    #[inline]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Advance to the next line. Returns `Ok(false)` at end of buffer.
    pub fn next_line(&mut self) -> Result<bool, IbisError> {
        if let Some(c) = self.pending_comment_char.take() {
            self.comment_char = c;
        }
        if self.offset >= self.source.len() {
            return Ok(false);
        }
        let rest = &self.source[self.offset..];
        let end = rest.find(['\n', '\0']).unwrap_or(rest.len());
        let raw = &rest[..end];
        self.offset += end + if end < rest.len() { 1 } else { 0 };
        self.line_number += 1;
        if raw.len() > MAX_LINE_LENGTH {
            return Err(IbisError::LineTooLong {
                line: self.line_number,
                max: MAX_LINE_LENGTH,
            });
        }
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        self.line = match raw.find(self.comment_char) {
            Some(i) => &raw[..i],
            None => raw,
        };
        self.cursor = 0;
        Ok(true)
    }

    #[inline]
    fn rest(&self) -> &'a str {
        &self.line[self.cursor..]
    }

    /// Advance the cursor past spaces and tabs.
    pub fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start_matches([' ', '\t']);
        self.cursor = self.line.len() - trimmed.len();
    }

    /// True if only whitespace remains on the line.
    pub fn at_eol(&self) -> bool {
        self.rest().trim_matches([' ', '\t']).is_empty()
    }

    /// Extract a maximal non-whitespace run, or `""` at end of line.
    pub fn read_word(&mut self) -> &'a str {
        self.skip_whitespace();
        let start = self.cursor;
        let end = self
            .rest()
            .find([' ', '\t'])
            .map(|i| start + i)
            .unwrap_or(self.line.len());
        self.cursor = end;
        &self.line[start..end]
    }

    /// Capture the rest of the line with surrounding whitespace trimmed.
    pub fn read_string(&mut self) -> &'a str {
        let s = self.rest().trim_matches([' ', '\t']);
        self.cursor = self.line.len();
        s
    }

    /// Capture the rest of the line verbatim, trimming only trailing
    /// whitespace. Free-text continuations use this so leading indentation
    /// and interior spacing survive.
    pub fn read_verbatim(&mut self) -> &'a str {
        let s = self.rest().trim_end_matches([' ', '\t']);
        self.cursor = self.line.len();
        s
    }

    /// Recognize a `[Keyword]` when `[` is the first non-whitespace
    /// character of the line. Underscores and spaces inside the keyword are
    /// equivalent; the result is lowercase with spaces folded to `_`.
    /// Leaves the cursor just past `]`.
    pub fn keyword(&mut self) -> Result<Option<String>, LexError> {
        let save = self.cursor;
        self.skip_whitespace();
        if !self.rest().starts_with('[') {
            self.cursor = save;
            return Ok(None);
        }
        let close = match self.rest().find(']') {
            Some(i) => i,
            None => return Err(LexError::UnterminatedKeyword),
        };
        let inner = &self.rest()[1..close];
        let normalized: String = inner
            .trim()
            .chars()
            .map(|c| if c == ' ' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        self.cursor += close + 1;
        Ok(Some(normalized))
    }

    /// Handle the body of a `[Comment Char]` directive: a `<char>_char`
    /// token where `<char>` comes from the allowed punctuation set, alone on
    /// the rest of the line. Takes effect starting the next line.
    pub fn change_comment_char(&mut self) -> Result<char, LexError> {
        let word = self.read_word();
        let mut chars = word.chars();
        let c = chars.next().ok_or(LexError::InvalidCommentChar)?;
        if chars.as_str() != "_char" || !ALLOWED_COMMENT_CHARS.contains(c) {
            return Err(LexError::InvalidCommentChar);
        }
        if !self.at_eol() {
            return Err(LexError::InvalidCommentChar);
        }
        self.pending_comment_char = Some(c);
        Ok(c)
    }
}

/// Parse an IBIS numeric literal: a plain float, the literal `NA` (mapped to
/// the NA sentinel), or a float with a unit modifier from
/// `T G M k m u n p f` appended directly (no separating whitespace).
/// Characters after a valid modifier are ignored (`100nF` reads as `100n`);
/// a non-modifier character directly after the number is a parse failure.
pub fn parse_double(word: &str) -> Option<f64> {
    if word.eq_ignore_ascii_case("na") {
        return Some(NA);
    }
    let end = word
        .find(|c: char| !matches!(c, '0'..='9' | '.' | '+' | '-' | 'e' | 'E'))
        .unwrap_or(word.len());
    if end == 0 {
        return None;
    }
    let value: f64 = word[..end].parse().ok()?;
    let rest = &word[end..];
    let Some(modifier) = rest.chars().next() else {
        return Some(value);
    };
    let scale = match modifier {
        'T' => 1e12,
        'G' => 1e9,
        'M' => 1e6,
        'k' => 1e3,
        'm' => 1e-3,
        'u' => 1e-6,
        'n' => 1e-9,
        'p' => 1e-12,
        'f' => 1e-15,
        _ => return None,
    };
    Some(value * scale)
}
