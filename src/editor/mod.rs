// ── Text display surface ──────────────────────────────────────────────────────
//
// The controller talks to the text widget only through `TextSurface`; the
// platform layer supplies the real control, tests supply a fake.  The
// offset → (line, column) translation lives here and is pure Rust.

use std::fmt;

/// The widget that holds the displayed text and the caret.
///
/// Offsets are counted in Unicode scalar values (`char`s), never bytes or
/// UTF-16 units; implementations convert at their boundary.
pub(crate) trait TextSurface {
    /// Replace the whole content.
    fn set_text(&mut self, text: &str);

    /// The current content, as the user sees it.
    fn text(&self) -> String;

    /// Character offset of the caret.
    fn cursor_offset(&self) -> usize;

    /// Move the caret to a character offset (clamped by the implementation).
    fn place_cursor(&mut self, offset: usize);

    /// Content and caret offset together.  Surfaces that must read the
    /// content to locate the caret override this to read it once.
    fn snapshot(&self) -> (String, usize) {
        (self.text(), self.cursor_offset())
    }
}

// ── Cursor position ───────────────────────────────────────────────────────────

/// 1-based line and column of the caret, as shown in the status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CursorPosition {
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl CursorPosition {
    /// Start of the document.
    pub(crate) const ORIGIN: Self = Self { line: 1, column: 1 };

    /// Translate a character offset into a line/column pair against `text`.
    ///
    /// Recognised line breaks: `\n`, `\r\n` (a single break), a lone `\r`,
    /// and U+2029 PARAGRAPH SEPARATOR.  Offsets past the end clamp to the end.
    pub(crate) fn at(text: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;
        // Peeking looks into the full text, so a prefix that ends on the "\r"
        // of a "\r\n" pair keeps the caret on the same line.
        let mut chars = text.chars().peekable();

        for _ in 0..offset {
            let Some(c) = chars.next() else { break };
            match c {
                '\r' if chars.peek() == Some(&'\n') => column += 1,
                '\n' | '\r' | '\u{2029}' => {
                    line += 1;
                    column = 1;
                }
                _ => column += 1,
            }
        }

        Self { line, column }
    }
}

impl Default for CursorPosition {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ln {}, Col {}", self.line, self.column)
    }
}

// ── UTF-16 offsets ────────────────────────────────────────────────────────────
//
// Native text controls count caret positions in UTF-16 code units; the
// surface contract counts characters.

/// Character offset of the UTF-16 position `units` in `text`.  A position
/// inside a surrogate pair rounds up to the next character.
pub(crate) fn char_offset_from_utf16(text: &str, units: usize) -> usize {
    let mut seen = 0;
    for (index, c) in text.chars().enumerate() {
        if seen >= units {
            return index;
        }
        seen += c.len_utf16();
    }
    text.chars().count()
}

/// UTF-16 position of the character offset `chars` in `text`, clamped to the
/// end.
pub(crate) fn utf16_offset_from_char(text: &str, chars: usize) -> usize {
    text.chars().take(chars).map(char::len_utf16).sum()
}

// ── Caret within a selection ──────────────────────────────────────────────────

/// Works out which end of a selection holds the caret, for controls that
/// only report the selection as `(min, max)`.
///
/// The anchor is the end that stayed put: a collapsed selection sets it, and
/// the caret is whichever end differs from it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CaretTracker {
    anchor: usize,
}

impl CaretTracker {
    /// Record the current selection and return the caret position.
    pub(crate) fn observe(&mut self, min: usize, max: usize) -> usize {
        if min == max {
            self.anchor = min;
            min
        } else if self.anchor == max {
            min
        } else {
            // Anchor lost (select-all, programmatic selection): treat the
            // selection as forward.
            self.anchor = min;
            max
        }
    }

    /// A programmatic caret move to `at`.
    pub(crate) fn collapse(&mut self, at: usize) {
        self.anchor = at;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
