//! Persistent, copy-on-mutate candidate program text.

use std::sync::Arc;

/// A candidate program as an ordered sequence of text lines.
///
/// Versions are immutable: applying a hypothesis produces a new
/// `SourceProgram` and leaves every prior version valid, so a backtracking
/// search can restore an earlier candidate by holding on to its handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProgram {
    lines: Arc<Vec<String>>,
}

impl SourceProgram {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: Arc::new(text.lines().map(str::to_string).collect()),
        }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self {
            lines: Arc::new(lines),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// 1-based line lookup, matching the influence-path convention.
    pub fn line(&self, lineno: u32) -> Option<&str> {
        self.lines.get(lineno.saturating_sub(1) as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Return a new version with the 1-based line `lineno` replaced.
    /// An out-of-range line returns the program unchanged.
    pub fn with_line_replaced(&self, lineno: u32, text: String) -> Self {
        let idx = lineno.saturating_sub(1) as usize;
        if lineno == 0 || idx >= self.lines.len() {
            return self.clone();
        }
        let mut lines = (*self.lines).clone();
        lines[idx] = text;
        Self {
            lines: Arc::new(lines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacement_is_copy_on_mutate() {
        let v0 = SourceProgram::from_text("a = 1\nb = 2");
        let v1 = v0.with_line_replaced(2, "b = 3".to_string());
        assert_eq!(v0.line(2), Some("b = 2"));
        assert_eq!(v1.line(2), Some("b = 3"));
        assert_eq!(v0.len(), v1.len());
    }

    #[test]
    fn out_of_range_replacement_is_identity() {
        let v0 = SourceProgram::from_text("a = 1");
        assert_eq!(v0.with_line_replaced(9, "x".to_string()), v0);
        assert_eq!(v0.with_line_replaced(0, "x".to_string()), v0);
    }
}
