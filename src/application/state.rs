//! State shared by both front ends: the text input buffer and the error
//! type every session action returns.

use super::in_flight::Action;
use crate::domain::DomainError;
use crate::infrastructure::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Remote(#[from] ApiError),
    #[error("{0} is already in progress")]
    Busy(Action),
    #[error("No file {0} in this application")]
    UnknownFile(String),
    #[error("Cannot read {path}: {source}")]
    UnreadableFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Nothing selected")]
    NothingSelected,
    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),
}

/// Single-line text buffer with a cursor counted in characters.
///
/// Horse names are typed in Cyrillic, so the cursor never indexes bytes.
///
/// # Examples
///
/// ```
/// use horse_id::application::TextInput;
///
/// let mut input = TextInput::with_text("Звезд");
/// input.insert('а');
/// assert_eq!(input.text(), "Звезда");
/// input.home();
/// input.delete();
/// assert_eq!(input.text(), "везда");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Returns the text and leaves the buffer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte_text() {
        let mut input = TextInput::with_text("Ёж");
        assert_eq!(input.cursor(), 2);
        input.left();
        input.insert('и');
        assert_eq!(input.text(), "Ёиж");
        input.backspace();
        input.backspace();
        assert_eq!(input.text(), "ж");
        assert_eq!(input.cursor(), 0);
        input.backspace();
        assert_eq!(input.text(), "ж");
    }

    #[test]
    fn test_cursor_bounds() {
        let mut input = TextInput::default();
        input.left();
        input.right();
        assert_eq!(input.cursor(), 0);
        input.insert('a');
        input.insert('b');
        input.home();
        input.right();
        input.delete();
        assert_eq!(input.text(), "a");
        input.end();
        input.delete();
        assert_eq!(input.text(), "a");
    }

    #[test]
    fn test_take_empties_buffer() {
        let mut input = TextInput::with_text("path/to/file.pdf");
        assert_eq!(input.take(), "path/to/file.pdf");
        assert_eq!(input.text(), "");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn test_busy_message() {
        let err = ActionError::Busy(Action::Submit);
        assert_eq!(err.to_string(), "Submission is already in progress");
    }
}
