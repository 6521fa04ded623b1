//! The generated script artifact.

use std::fmt;

/// File name the script is delivered under.
pub const SCRIPT_FILE_NAME: &str = "model.py";

/// An assembled script: ordered lines, each terminated by `\n` when
/// rendered. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    lines: Vec<String>,
    byte_len: usize,
}

impl Script {
    /// Assemble a script from lines without terminators.
    pub fn from_lines(lines: Vec<String>) -> Self {
        let byte_len = lines.iter().map(|line| line.len() + 1).sum();
        Self { lines, byte_len }
    }

    /// Lines in emission order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Total size of the rendered script in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Render the full script text.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.byte_len);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Rendered script as bytes, ready for delivery.
    pub fn into_bytes(self) -> Vec<u8> {
        self.render().into_bytes()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
