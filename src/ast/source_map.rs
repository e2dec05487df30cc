use super::Span;

/// Byte offset to (line, column) translation for one source text.
///
/// Lines and columns are 1-based. Columns count bytes, which matches what
/// the lexer sees for the ASCII-only PL/0 grammar.
pub struct SourceMap {
    // Offset of the first byte of every line; always starts with 0.
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.bytes().enumerate().filter(|(_, b)| *b == b'\n').map(|(i, _)| i + 1))
            .collect();
        SourceMap { line_starts }
    }

    /// Returns (line, col) of `offset`. A newline byte belongs to the line it ends.
    pub fn lookup(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset).max(1);
        let col = offset - self.line_starts[line - 1];
        (line, col + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of the 1-based `line` without its line terminator, or "" when
    /// the line does not exist.
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> &'a str {
        if line == 0 || line > self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line - 1];
        let end = self.line_starts.get(line).copied().unwrap_or(source.len());
        source[start..end].trim_end_matches(['\n', '\r'])
    }

    /// Byte span of the 1-based `line`, line terminator excluded.
    pub fn line_span(&self, source: &str, line: usize) -> Option<Span> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        Some(Span { start, end: start + self.line_text(source, line).len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_expression() {
        let sm = SourceMap::new("1 + 2 * 3");
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.lookup(4), (1, 5));
        assert_eq!(sm.line_count(), 1);
    }

    #[test]
    fn program_across_lines() {
        let src = "const k = 3;\nvar x;\nx := k * 2.";
        let sm = SourceMap::new(src);
        assert_eq!(sm.lookup(11), (1, 12)); // ';'
        assert_eq!(sm.lookup(12), (1, 13)); // '\n' stays on line 1
        assert_eq!(sm.lookup(13), (2, 1)); // 'v'
        assert_eq!(sm.lookup(20), (3, 1)); // 'x'
        assert_eq!(sm.line_text(src, 2), "var x;");
        assert_eq!(sm.line_text(src, 3), "x := k * 2.");
    }

    #[test]
    fn crlf_is_trimmed() {
        let src = "1 +\r\n2";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 1), "1 +");
        assert_eq!(sm.lookup(5), (2, 1));
    }

    #[test]
    fn missing_lines_are_empty() {
        let src = "42\n";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 0), "");
        assert_eq!(sm.line_text(src, 2), "");
        assert_eq!(sm.line_text(src, 7), "");
    }

    #[test]
    fn line_spans() {
        let src = "1 +\n 20 / 0\n";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_span(src, 1), Some(Span { start: 0, end: 3 }));
        assert_eq!(sm.line_span(src, 2), Some(Span { start: 4, end: 11 }));
        assert_eq!(sm.line_span(src, 0), None);
        assert_eq!(sm.line_span(src, 4), None);
    }

    #[test]
    fn empty_source() {
        let sm = SourceMap::new("");
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.line_text("", 1), "");
    }
}
