//! Buffered text emitter with an indent stack, namespace stripping, and a
//! per-line prefix.
//!
//! Grounded on the original `hidl-util/Formatter.h` (indent/unindent,
//! `setNamespace`, `setLinePrefix`) and, for the "scoped closure instead of
//! manual indent/unindent" idiom, on the teacher's habit of wrapping
//! mutation-prone bracketed regions in a function that takes a closure
//! (e.g. `CodeGen`'s block-scoped emission helpers in `codegen/words.rs`).

/// A single write path: every line passes through prefix application and
/// namespace stripping uniformly, so callers never bypass either.
pub struct Sink {
    buffer: String,
    indent_level: usize,
    at_start_of_line: bool,
    strip_namespace: Option<String>,
    line_prefix: Option<String>,
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink {
    pub fn new() -> Self {
        Sink {
            buffer: String::new(),
            indent_level: 0,
            at_start_of_line: true,
            strip_namespace: None,
            line_prefix: None,
        }
    }

    /// Every occurrence of `space` is removed from subsequently flushed
    /// text (e.g. stripping a redundant fully-qualified namespace prefix
    /// from emitted C++ type names).
    pub fn set_namespace(&mut self, space: impl Into<String>) {
        self.strip_namespace = Some(space.into());
    }

    pub fn clear_namespace(&mut self) {
        self.strip_namespace = None;
    }

    /// Prefix emitted before indentation at the start of every line, until
    /// cleared. Useful for comment blocks.
    pub fn set_line_prefix(&mut self, prefix: impl Into<String>) {
        self.line_prefix = Some(prefix.into());
    }

    pub fn unset_line_prefix(&mut self) {
        self.line_prefix = None;
    }

    pub fn indent_depth(&mut self, level: usize) {
        self.indent_level += level;
    }

    pub fn unindent_depth(&mut self, level: usize) {
        self.indent_level = self.indent_level.saturating_sub(level);
    }

    /// Scope `level` extra indent levels around `f`. Cannot leak a missing
    /// `unindent` the way manual indent()/unindent() pairs can.
    pub fn indent<F: FnOnce(&mut Sink)>(&mut self, level: usize, f: F) {
        self.indent_level += level;
        f(self);
        self.indent_level = self.indent_level.saturating_sub(level);
    }

    /// `indent(1, f)`.
    pub fn block<F: FnOnce(&mut Sink)>(&mut self, f: F) {
        self.indent(1, f);
    }

    /// Write `text`, expanding embedded `\n`s into separate lines so each
    /// gets its own prefix/indentation.
    pub fn write(&mut self, text: &str) -> &mut Self {
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.buffer.push('\n');
                self.at_start_of_line = true;
            }
            if segment.is_empty() {
                continue;
            }
            self.write_segment(segment);
        }
        self
    }

    /// `write` followed by a trailing newline.
    pub fn writeln(&mut self, text: &str) -> &mut Self {
        self.write(text);
        self.write("\n");
        self
    }

    fn write_segment(&mut self, segment: &str) {
        if self.at_start_of_line {
            if let Some(prefix) = &self.line_prefix {
                self.buffer.push_str(prefix);
            }
            for _ in 0..self.indent_level {
                self.buffer.push_str("  ");
            }
            self.at_start_of_line = false;
        }
        match &self.strip_namespace {
            Some(ns) if !ns.is_empty() => self.buffer.push_str(&segment.replace(ns.as_str(), "")),
            _ => self.buffer.push_str(segment),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_adds_two_spaces_per_level() {
        let mut sink = Sink::new();
        sink.indent(2, |s| {
            s.writeln("x");
        });
        assert_eq!(sink.as_str(), "    x\n");
    }

    #[test]
    fn indent_is_scoped_and_restores_depth() {
        let mut sink = Sink::new();
        sink.writeln("outer");
        sink.indent(1, |s| {
            s.writeln("inner");
        });
        sink.writeln("outer-again");
        assert_eq!(sink.as_str(), "outer\n  inner\nouter-again\n");
    }

    #[test]
    fn namespace_is_stripped_from_flushed_text() {
        let mut sink = Sink::new();
        sink.set_namespace("::foo::bar::");
        sink.writeln("::foo::bar::Baz x;");
        assert_eq!(sink.as_str(), "Baz x;\n");
    }

    #[test]
    fn line_prefix_precedes_indentation() {
        let mut sink = Sink::new();
        sink.set_line_prefix("// ");
        sink.indent(1, |s| {
            s.writeln("comment");
        });
        assert_eq!(sink.as_str(), "//   comment\n");
    }

    #[test]
    fn multiline_write_applies_prefix_to_every_line() {
        let mut sink = Sink::new();
        sink.write("a\nb\nc");
        assert_eq!(sink.as_str(), "a\nb\nc");
        let mut indented = Sink::new();
        indented.indent(1, |s| {
            s.write("a\nb\n");
        });
        assert_eq!(indented.as_str(), "  a\n  b\n");
    }
}
