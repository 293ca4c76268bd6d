//! Dictation buffer.

/// Text accumulated while in dictation mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictationBuffer {
    buffer: String,
}

impl DictationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text`, space-separated from what is already there.
    pub fn append(&mut self, text: &str) {
        if !self.buffer.is_empty() {
            self.buffer.push(' ');
        }
        self.buffer.push_str(text);
    }

    pub fn replace(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Whitespace-only counts as empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}
