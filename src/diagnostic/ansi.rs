use crate::ast::SourceMap;
use super::Diagnostic;

/// Human-readable renderer. With `use_color` off this is the plain text format.
pub struct AnsiRenderer {
    pub use_color: bool,
}

impl AnsiRenderer {
    fn bold(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1m{s}\x1b[0m") } else { s.to_string() }
    }

    fn bold_red(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1;31m{s}\x1b[0m") } else { s.to_string() }
    }

    fn cyan(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[36m{s}\x1b[0m") } else { s.to_string() }
    }

    fn dim(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[2m{s}\x1b[0m") } else { s.to_string() }
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let mut out = String::new();

        // "error[PL0-P001]: message"
        let header = match d.code {
            Some(code) => format!("error[{code}]"),
            None => "error".to_string(),
        };
        out.push_str(&format!("{}: {}\n", self.bold_red(&header), self.bold(&d.message)));

        if let (Some(label), Some(source)) = (d.labels.first(), &d.source) {
            let map = SourceMap::new(source);
            let (line, col) = map.lookup(label.span.start);
            let line_text = map.line_text(source, line);

            out.push_str(&format!("  {} {}:{}\n", self.cyan("-->"), line, col));

            let gutter = line.to_string().len();
            let pipe = self.cyan("|");
            let pad = " ".repeat(gutter);

            out.push_str(&format!("{pad} {pipe}\n"));

            let line_num = self.cyan(&format!("{line:>gutter$}"));
            out.push_str(&format!("{line_num} {pipe} {line_text}\n"));

            // Carets stop at the end of the first line of a multi-line span.
            let span_start_in_line = col.saturating_sub(1);
            let room = line_text.len().saturating_sub(span_start_in_line).max(1);
            let span_len = label.span.end.saturating_sub(label.span.start).clamp(1, room);
            let carets = self.bold_red(&"^".repeat(span_len));
            let indent = " ".repeat(span_start_in_line);
            if label.message.is_empty() {
                out.push_str(&format!("{pad} {pipe} {indent}{carets}\n"));
            } else {
                out.push_str(&format!("{pad} {pipe} {indent}{carets} {}\n", self.bold_red(&label.message)));
            }

            out.push_str(&format!("{pad} {pipe}\n"));
        }

        for note in &d.notes {
            out.push_str(&format!("  {} note: {}\n", self.dim("="), note));
        }

        if let Some(suggestion) = &d.suggestion {
            out.push_str(&format!("  {} suggestion: {}\n", self.dim("="), suggestion));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    fn make_diag(source: &str, start: usize, end: usize) -> Diagnostic {
        Diagnostic::error("unsupported operation: integer + string")
            .with_code("PL0-R001")
            .with_span(Span { start, end }, "here")
            .with_source(source.to_string())
            .with_note("at line 1, bytecode offset 0004")
            .with_suggestion("convert the operand first")
    }

    #[test]
    fn render_header_with_code() {
        let r = AnsiRenderer { use_color: false };
        let out = r.render(&make_diag("1 + \"x\"", 2, 3));
        assert!(out.starts_with("error[PL0-R001]: unsupported operation"), "bad header in:\n{out}");
    }

    #[test]
    fn render_header_without_code() {
        let r = AnsiRenderer { use_color: false };
        assert_eq!(r.render(&Diagnostic::error("something bad")), "error: something bad\n");
    }

    #[test]
    fn render_full_snippet() {
        let r = AnsiRenderer { use_color: false };
        let out = r.render(&make_diag("1 + \"x\"", 2, 3));
        let expected = "\
error[PL0-R001]: unsupported operation: integer + string
  --> 1:3
  |
1 | 1 + \"x\"
  |   ^ here
  |
  = note: at line 1, bytecode offset 0004
  = suggestion: convert the operand first
";
        assert_eq!(out, expected);
    }

    #[test]
    fn render_multiline_source_correct_line() {
        let source = "1 +\n2 * (3";
        let r = AnsiRenderer { use_color: false };
        let d = Diagnostic::error("expected ')', got end of input")
            .with_span(Span { start: 10, end: 10 }, "here")
            .with_source(source.to_string());
        let out = r.render(&d);
        assert!(out.contains("--> 2:7"), "expected line 2 in:\n{out}");
        assert!(out.contains("2 | 2 * (3"), "expected second line in:\n{out}");
        assert!(out.contains("      ^ here"), "caret misplaced in:\n{out}");
    }

    #[test]
    fn caret_length_matches_span() {
        let r = AnsiRenderer { use_color: false };
        let d = Diagnostic::error("operator 'odd' has no bytecode at line 1")
            .with_span(Span { start: 0, end: 5 }, "")
            .with_source("odd 3".to_string());
        let out = r.render(&d);
        assert!(out.contains("| ^^^^^\n"), "expected 5 carets in:\n{out}");
    }

    #[test]
    fn carets_clipped_to_first_line() {
        let r = AnsiRenderer { use_color: false };
        let d = Diagnostic::error("bad")
            .with_span(Span { start: 0, end: 7 }, "")
            .with_source("1 +\n2 / 0".to_string());
        let out = r.render(&d);
        assert!(out.contains("| ^^^\n"), "expected 3 carets in:\n{out}");
    }

    #[test]
    fn render_no_source_still_works() {
        let r = AnsiRenderer { use_color: false };
        let d = Diagnostic::error("division by zero").with_span(Span { start: 0, end: 1 }, "here");
        let out = r.render(&d);
        assert!(!out.contains("-->"));
    }

    #[test]
    fn color_toggle() {
        let d = make_diag("1 + \"x\"", 2, 3);
        assert!(AnsiRenderer { use_color: true }.render(&d).contains("\x1b["));
        assert!(!AnsiRenderer { use_color: false }.render(&d).contains("\x1b["));
    }
}
