//! Output emitter.
//!
//! The source renderer writes through an [`Emitter`] so the same rendering
//! code can target an in-memory buffer or anything else that accepts text.

/// Sink for rendered source text.
pub trait Emitter {
    /// Emit a text fragment.
    fn emit(&mut self, text: &str);

    /// Emit a newline (always `\n`, whatever the host platform).
    fn emit_newline(&mut self);

    /// Emit `text` followed by a newline.
    fn emit_line(&mut self, text: &str) {
        self.emit(text);
        self.emit_newline();
    }
}

/// String-based emitter.
#[derive(Default)]
pub struct StringEmitter {
    buffer: String,
}

impl StringEmitter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
        }
    }

    pub fn output(self) -> String {
        self.buffer
    }
}

impl Emitter for StringEmitter {
    fn emit(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn emit_newline(&mut self) {
        self.buffer.push('\n');
    }
}
