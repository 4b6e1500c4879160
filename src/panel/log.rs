//! Bounded status log shown under the generation controls

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const MAX_LOG_LINES: usize = 5;
pub const MAX_LOG_WIDTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    /// Push as one or more new lines
    #[default]
    Newline,
    /// Extend the last line
    Append,
    /// Replace the last line
    Overwrite,
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    max_lines: usize,
    max_width: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(MAX_LOG_LINES, MAX_LOG_WIDTH)
    }
}

impl LogBuffer {
    pub fn new(max_lines: usize, max_width: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_lines + 1),
            max_lines: max_lines.max(1),
            max_width: max_width.max(1),
        }
    }

    pub fn log(&mut self, line: &str, mode: LogMode) {
        match mode {
            LogMode::Newline => self.push(line),
            LogMode::Append => self.append(line),
            LogMode::Overwrite => self.overwrite(line),
        }
    }

    /// Push `line`, split into `max_width`-character chunks
    pub fn push(&mut self, line: &str) {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            self.push_one(String::new());
            return;
        }
        for chunk in chars.chunks(self.max_width) {
            self.push_one(chunk.iter().collect());
        }
    }

    /// Extend the last line (a new line when the log is empty), re-wrapping it
    pub fn append(&mut self, text: &str) {
        let mut last = self.lines.pop_back().unwrap_or_default();
        last.push_str(text);
        self.push(&last);
    }

    /// Replace the last line (a new line when the log is empty)
    pub fn overwrite(&mut self, text: &str) {
        self.lines.pop_back();
        self.push(text);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The log as displayed: lines joined with newlines
    pub fn text(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    fn push_one(&mut self, line: String) {
        self.lines.push_back(line);
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }
}
