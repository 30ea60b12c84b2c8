//! Line-oriented code writer

pub struct CodeWriter {
    indent: usize,
    depth: usize,
    out: String,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::with_indent(4)
    }

    pub fn with_indent(indent: usize) -> Self {
        Self { indent, depth: 0, out: String::new() }
    }

    /// Start at a given nesting level, for text spliced into an indented region
    pub fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Write one line at the current indentation
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if text.is_empty() {
            self.out.push('\n');
        } else {
            self.out.push_str(&self.current_indent());
            self.out.push_str(text);
            self.out.push('\n');
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    /// Write `open`, the body one level deeper, then `close`
    pub fn block(&mut self, open: impl AsRef<str>, close: impl AsRef<str>, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.line(open);
        self.indent();
        body(self);
        self.dedent();
        self.line(close)
    }

    /// Write a `/** ... */` comment, one line per line of `text`
    ///
    /// A `*/` inside the text would end the comment early, so it is written
    /// as `*\/`.
    pub fn doc_comment(&mut self, text: &str) -> &mut Self {
        let text = text.replace("*/", "*\\/");
        let lines: Vec<&str> = text.lines().collect();
        match lines.as_slice() {
            [] => {}
            [single] => {
                self.line(format!("/** {} */", single));
            }
            _ => {
                self.line("/**");
                for line in lines {
                    if line.is_empty() {
                        self.line(" *");
                    } else {
                        self.line(format!(" * {}", line));
                    }
                }
                self.line(" */");
            }
        }
        self
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn current_indent(&self) -> String {
        " ".repeat(self.depth * self.indent)
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape a string for a double-quoted C-family literal
pub fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|ch| match ch {
            '\n' => vec!['\\', 'n'],
            '\t' => vec!['\\', 't'],
            '\r' => vec!['\\', 'r'],
            '\\' => vec!['\\', '\\'],
            '"' => vec!['\\', '"'],
            c => vec![c],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_indents_body() {
        let mut w = CodeWriter::new();
        w.block("struct A {", "};", |w| {
            w.line("int x;");
        });
        assert_eq!(w.finish(), "struct A {\n    int x;\n};\n");
    }

    #[test]
    fn test_blank_lines_have_no_trailing_spaces() {
        let mut w = CodeWriter::with_indent(2);
        w.indent().line("a").line("").blank().line("b");
        assert_eq!(w.finish(), "  a\n\n\n  b\n");
    }

    #[test]
    fn test_doc_comment() {
        let mut w = CodeWriter::new().at_depth(1);
        w.doc_comment("one");
        w.doc_comment("first\n\nthird");
        assert_eq!(
            w.finish(),
            "    /** one */\n    /**\n     * first\n     *\n     * third\n     */\n"
        );
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a \"b\"\n"), "a \\\"b\\\"\\n");
    }

    #[test]
    fn test_doc_comment_cannot_close_early() {
        let mut w = CodeWriter::new();
        w.doc_comment("matches a/*/b");
        w.doc_comment("ends */ here\nsecond");
        assert_eq!(w.finish(), "/** matches a/*\\/b */\n/**\n * ends *\\/ here\n * second\n */\n");
    }
}
