//! Output emitter abstraction.
//!
//! Kept separate from the layout logic in [`crate::autoformat`] so the
//! formatter itself never touches a raw `String` directly — it only ever
//! asks an `Emitter` to produce text, indentation, or a newline.

/// Destination for formatted output.
pub trait Emitter {
    /// Emit a text fragment verbatim.
    fn emit(&mut self, text: &str);

    /// Emit a single space.
    fn emit_space(&mut self) {
        self.emit(" ");
    }

    /// Emit a newline followed by `indent` levels of 4-space indentation.
    fn emit_newline(&mut self, indent: usize) {
        self.emit("\n");
        for _ in 0..indent {
            self.emit("    ");
        }
    }
}

/// String-based emitter; the only implementation this crate ships, but kept
/// behind the trait so a future caller (e.g. one writing directly to a file)
/// isn't forced through an intermediate `String`.
#[derive(Default)]
pub struct StringEmitter {
    buffer: String,
}

impl StringEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        StringEmitter { buffer: String::with_capacity(capacity) }
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Column of the cursor on the current (last) line, counted in chars.
    #[must_use]
    pub fn current_column(&self) -> usize {
        match self.buffer.rfind('\n') {
            Some(idx) => self.buffer[idx + 1..].chars().count(),
            None => self.buffer.chars().count(),
        }
    }

    /// 0-indexed line the cursor currently sits on.
    #[must_use]
    pub fn current_line(&self) -> usize {
        self.buffer.matches('\n').count()
    }
}

impl Emitter for StringEmitter {
    fn emit(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_column_after_newline() {
        let mut e = StringEmitter::new();
        e.emit("rule foo");
        assert_eq!(e.current_column(), 8);
        e.emit_newline(1);
        e.emit("meta:");
        assert_eq!(e.current_column(), 4 + 5);
        assert_eq!(e.current_line(), 1);
    }
}
