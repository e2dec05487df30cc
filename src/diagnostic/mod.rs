pub mod ansi;
pub mod json;
pub mod registry;

use std::io::{self, Write};

use crate::ast::{SourceMap, Span};
use crate::compiler::CompileError;
use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::value::ValueError;
use crate::vm::{RunError, VmError, VmErrorKind};

/// A source span with a short message printed under its carets.
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

/// An error report. plzero has no warnings, so every diagnostic is an error.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into() });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// How diagnostics are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable with ANSI colour.
    Ansi,
    /// Human-readable, no escape codes.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl OutputFormat {
    pub fn render(self, d: &Diagnostic) -> String {
        match self {
            OutputFormat::Ansi => ansi::AnsiRenderer { use_color: true }.render(d),
            OutputFormat::Text => ansi::AnsiRenderer { use_color: false }.render(d),
            OutputFormat::Json => format!("{}\n", json::render(d)),
        }
    }

    pub fn write_to(self, d: &Diagnostic, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(self.render(d).as_bytes())
    }
}

// ---- From impls for error types ----

impl From<&LexError> for Diagnostic {
    fn from(e: &LexError) -> Self {
        let span = Span { start: e.span.start, end: e.span.start + e.snippet.len().max(1) };
        let code = if e.snippet.starts_with('"') { "PL0-L002" } else { "PL0-L001" };
        Diagnostic::error(format!("unexpected input '{}'", e.snippet))
            .with_code(code)
            .with_span(span, "here")
            .with_suggestion(e.suggestion.clone())
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(e: &ParseError) -> Self {
        Diagnostic::error(&e.message).with_code(e.code).with_span(e.span, "here")
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(e: &CompileError) -> Self {
        let (code, label) = match e {
            CompileError::Lex(inner) => return Diagnostic::from(inner),
            CompileError::Parse(inner) => return Diagnostic::from(inner),
            CompileError::TooManyConstants { .. } => ("PL0-C001", "one constant too many"),
            CompileError::UnsupportedOperator { .. } => ("PL0-C002", "no opcode for this operator"),
            CompileError::InvalidLiteral { .. } => ("PL0-C003", "this literal"),
            CompileError::LineOutOfRange { .. } => ("PL0-C004", "here"),
            CompileError::TooDeep { .. } => ("PL0-C005", "this subtree"),
        };
        let d = Diagnostic::error(e.to_string()).with_code(code);
        match e.span() {
            Some(span) => d.with_span(span, label),
            None => d,
        }
    }
}

fn vm_error_code(kind: &VmErrorKind) -> &'static str {
    match kind {
        VmErrorKind::Value(ValueError::DivisionByZero) => "PL0-R002",
        VmErrorKind::Value(ValueError::IntegerOverflow { .. }) => "PL0-R003",
        VmErrorKind::Value(_) => "PL0-R001",
        VmErrorKind::ErrorInstruction => "PL0-R004",
        VmErrorKind::Halted => "PL0-R006",
        VmErrorKind::UnknownOpcode(_)
        | VmErrorKind::StackUnderflow
        | VmErrorKind::MissingOperand(_)
        | VmErrorKind::BadConstant { .. }
        | VmErrorKind::UnexpectedEnd => "PL0-R005",
    }
}

impl From<&VmError> for Diagnostic {
    fn from(e: &VmError) -> Self {
        Diagnostic::error(e.kind.to_string())
            .with_code(vm_error_code(&e.kind))
            .with_note(format!("at line {}, bytecode offset {:04}", e.line, e.offset))
    }
}

impl From<&RunError> for Diagnostic {
    fn from(e: &RunError) -> Self {
        match e {
            RunError::Compile { error, source_code } => Diagnostic::from(error).with_source(source_code.clone()),
            RunError::Runtime { error, source_code } => {
                let d = Diagnostic::from(error).with_source(source_code.clone());
                let map = SourceMap::new(source_code);
                match map.line_span(source_code, error.line as usize) {
                    Some(span) if error.line > 0 => d.with_span(span, "while evaluating this line"),
                    _ => d,
                }
            }
            RunError::Io { .. } | RunError::Encoding { .. } => Diagnostic::error(e.to_string()).with_code("PL0-R007"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Position;
    use crate::vm::{self, RunOptions};

    #[test]
    fn diagnostic_error_builder() {
        let d = Diagnostic::error("something went wrong");
        assert_eq!(d.message, "something went wrong");
        assert!(d.code.is_none());
        assert!(d.labels.is_empty());
        assert!(d.notes.is_empty());
        assert!(d.suggestion.is_none());
    }

    #[test]
    fn diagnostic_with_span() {
        let d = Diagnostic::error("bad token").with_span(Span { start: 5, end: 8 }, "here");
        assert_eq!(d.labels.len(), 1);
        assert_eq!(d.labels[0].span, Span { start: 5, end: 8 });
        assert_eq!(d.labels[0].message, "here");
    }

    #[test]
    fn from_lex_error() {
        let e = crate::lexer::lex("1 + $").unwrap_err();
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("PL0-L001"));
        assert!(d.message.contains('$'));
        assert_eq!(d.labels[0].span, Span { start: 4, end: 5 });
        assert!(d.suggestion.is_some());
    }

    #[test]
    fn from_unterminated_string() {
        let e = crate::lexer::lex("\"abc").unwrap_err();
        assert_eq!(Diagnostic::from(&e).code, Some("PL0-L002"));
    }

    #[test]
    fn from_parse_error() {
        let e = ParseError {
            code: "PL0-P001",
            position: Position { line: 1, column: 3 },
            span: Span { start: 2, end: 3 },
            message: "expected an expression, got ')'".to_string(),
        };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("PL0-P001"));
        assert!(d.message.contains("expected an expression"));
        assert_eq!(d.labels[0].span, Span { start: 2, end: 3 });
    }

    #[test]
    fn from_compile_error() {
        let e = crate::compiler::compile("odd 3").unwrap_err();
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("PL0-C002"));
        assert!(d.message.contains("odd"));
        assert_eq!(d.labels[0].span, Span { start: 0, end: 5 });
    }

    #[test]
    fn from_vm_error() {
        let e = VmError { line: 3, offset: 7, kind: VmErrorKind::Value(ValueError::DivisionByZero) };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("PL0-R002"));
        assert_eq!(d.message, "division by zero");
        assert!(d.notes[0].contains("line 3"));
        assert!(d.notes[0].contains("0007"));
        assert!(d.labels.is_empty());
    }

    #[test]
    fn runtime_error_points_at_its_line() {
        let err = vm::interpret("1 +\n 2 / 0", &RunOptions::default()).unwrap_err();
        let d = Diagnostic::from(&err);
        assert_eq!(d.labels[0].span, Span { start: 4, end: 10 });
        assert_eq!(d.source.as_deref(), Some("1 +\n 2 / 0"));
    }

    #[test]
    fn every_emitted_code_is_registered() {
        let codes = [
            "PL0-L001", "PL0-L002", "PL0-P001", "PL0-P002", "PL0-P003", "PL0-P004", "PL0-C001", "PL0-C002",
            "PL0-C003", "PL0-C004", "PL0-C005", "PL0-R001", "PL0-R002", "PL0-R003", "PL0-R004", "PL0-R005",
            "PL0-R006", "PL0-R007",
        ];
        for code in codes {
            assert!(registry::lookup(code).is_some(), "{code} missing from registry");
        }
    }

    #[test]
    fn deep_nesting_is_reported_with_its_code() {
        let source = format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000));
        let err = vm::interpret(&source, &RunOptions::default()).unwrap_err();
        let d = Diagnostic::from(&err);
        assert_eq!(d.code, Some("PL0-P004"));
        assert_eq!(d.labels[0].span, Span { start: 128, end: 129 });
    }

    #[test]
    fn formats_render_differently() {
        let d = Diagnostic::error("bad").with_code("PL0-R001");
        assert!(OutputFormat::Ansi.render(&d).contains("\x1b["));
        assert_eq!(OutputFormat::Text.render(&d), "error[PL0-R001]: bad\n");
        let json = OutputFormat::Json.render(&d);
        assert!(json.ends_with('\n'));
        let v: serde_json::Value = serde_json::from_str(json.trim_end()).unwrap();
        assert_eq!(v["code"], "PL0-R001");
    }
}
