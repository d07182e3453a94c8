//! Output produced by `serve`
//!
//! [`OutputBuffer`] records each served string with the source line that
//! produced it. One buffer belongs to one run; it is never shared.

/// A served line with its source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub line: usize,
}

/// Ordered output of one run
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    pub lines: Vec<OutputLine>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        OutputBuffer { lines: Vec::new() }
    }

    /// Append one served string
    pub fn serve(&mut self, text: String, line: usize) {
        self.lines.push(OutputLine { text, line });
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Served strings in order
    pub fn get_output(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.text.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
