//! Indenting line writer used by every emitter.

/// Accumulates output lines at a current indentation level.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    buf: String,
    indent_spaces: usize,
    level: usize,
}

impl Default for CodeWriter {
    fn default() -> Self {
        CodeWriter::new()
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        CodeWriter {
            buf: String::new(),
            indent_spaces: 4,
            level: 0,
        }
    }

    /// An empty writer starting at `level`, for output spliced into another
    /// writer at the same depth.
    pub fn at_level(level: usize) -> Self {
        CodeWriter {
            level,
            ..CodeWriter::new()
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Write one line at the current indentation. Empty lines stay empty.
    pub fn out(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if !line.is_empty() && self.level > 0 {
            self.buf
                .extend(std::iter::repeat(' ').take(self.indent_spaces * self.level));
        }
        self.buf.push_str(line);
        self.buf.push('\n');
    }

    /// Write `line` followed by a `{ … }` block.
    pub fn out_block<R>(&mut self, line: impl AsRef<str>, f: impl FnOnce(&mut Self) -> R) -> R {
        self.out(line);
        self.block(f)
    }

    pub fn blank(&mut self) {
        self.out("");
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn outdent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Run `f` one level deeper.
    pub fn indented<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.level += 1;
        let r = f(self);
        self.outdent();
        r
    }

    /// A brace-delimited, indented block.
    pub fn block<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.block_with("{", "}", f)
    }

    pub fn block_with<R>(&mut self, open: &str, close: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.out(open);
        let r = self.indented(f);
        self.out(close);
        r
    }

    /// Append already formatted text verbatim.
    pub fn append(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks_indent() {
        let mut s = CodeWriter::new();
        s.out_block("namespace Numpy", |s| {
            s.out_block("class np", |s| s.out("int x;"));
        });
        assert_eq!(
            s.as_str(),
            "namespace Numpy\n{\n    class np\n    {\n        int x;\n    }\n}\n"
        );
    }

    #[test]
    fn blank_lines_carry_no_indent() {
        let mut s = CodeWriter::at_level(2);
        s.blank();
        assert_eq!(s.as_str(), "\n");
    }

    #[test]
    fn custom_braces() {
        let mut s = CodeWriter::new();
        s.block_with("{", "});", |s| s.out("a,"));
        assert_eq!(s.as_str(), "{\n    a,\n});\n");
    }

    #[test]
    fn block_returns_closure_value() {
        let mut s = CodeWriter::new();
        let r: Result<(), String> = s.block(|_| Err("boom".to_string()));
        assert!(r.is_err());
        assert_eq!(s.level(), 0);
    }

    #[test]
    fn outdent_saturates() {
        let mut s = CodeWriter::new();
        s.outdent();
        s.out("x");
        assert_eq!(s.as_str(), "x\n");
    }
}
