use logos::Logos;
use serde::Serialize;

use crate::ast::{Position, SourceMap, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumberKind {
    Integer,
    Double,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"\{[^}]*\}")]
pub enum TokenKind {
    // Keywords. Only expressions are executable; the rest are rejected by the parser.
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("procedure")]
    Procedure,
    #[token("call")]
    Call,
    #[token("begin")]
    Begin,
    #[token("end")]
    End,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("print")]
    Print,
    #[token("odd")]
    Odd,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Punctuation
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":=")]
    Assign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("#")]
    Hash,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("!")]
    Bang,

    // Literals
    #[regex(r"[0-9][0-9']*", lex_number)]
    Number(NumberKind),

    #[regex(r#""[^"\n]*""#)]
    Str,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
}

/// A digit run becomes a double when it is followed by `.` and another digit;
/// a bare trailing `.` is left alone as the program terminator.
fn lex_number(lex: &mut logos::Lexer<TokenKind>) -> NumberKind {
    let rest = lex.remainder().as_bytes();
    if rest.len() >= 2 && rest[0] == b'.' && rest[1].is_ascii_digit() {
        let fraction = rest[1..]
            .iter()
            .take_while(|b| b.is_ascii_digit() || **b == b'\'')
            .count();
        lex.bump(1 + fraction);
        NumberKind::Double
    } else {
        NumberKind::Integer
    }
}

impl TokenKind {
    /// Source spelling for operators, keywords and punctuation; a category
    /// name for literals.
    pub fn symbol(self) -> &'static str {
        match self {
            TokenKind::Var => "var",
            TokenKind::Const => "const",
            TokenKind::Procedure => "procedure",
            TokenKind::Call => "call",
            TokenKind::Begin => "begin",
            TokenKind::End => "end",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::For => "for",
            TokenKind::Print => "print",
            TokenKind::Odd => "odd",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Assign => ":=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Equal => "=",
            TokenKind::EqualEqual => "==",
            TokenKind::BangEqual => "!=",
            TokenKind::Hash => "#",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Bang => "!",
            TokenKind::Number(NumberKind::Integer) => "integer",
            TokenKind::Number(NumberKind::Double) => "double",
            TokenKind::Str => "string",
            TokenKind::Ident => "identifier",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One lexeme: its kind, the literal text, and where it starts.
///
/// `literal` is the source slice, except for strings, where the surrounding
/// quotes are removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub column: usize,
    pub span: Span,
}

impl Token {
    pub fn position(&self) -> Position {
        Position { line: self.line, column: self.column }
    }
}

/// Lex source code into a stream of tokens with positions.
/// Stops at the first character that does not start a token.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let map = SourceMap::new(source);
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span { start: range.start, end: range.end };
        let (line, column) = map.lookup(span.start);
        match result {
            Ok(kind) => {
                let slice = lexer.slice();
                let literal = match kind {
                    TokenKind::Str => slice[1..slice.len() - 1].to_string(),
                    _ => slice.to_string(),
                };
                tokens.push(Token { kind, literal, line, column, span });
            }
            Err(()) => {
                let snippet = source[range].to_string();
                return Err(LexError {
                    suggestion: suggest_fix(&snippet),
                    snippet,
                    span,
                    line,
                    column,
                });
            }
        }
    }

    Ok(tokens)
}

fn suggest_fix(bad: &str) -> String {
    if bad.starts_with('"') {
        "Close the string with '\"' before the end of the line.".to_string()
    } else if bad.starts_with(':') {
        "Assignment is written ':='.".to_string()
    } else if bad.starts_with('}') {
        "Comments are written '{ ... }'; this '}' has no opening brace.".to_string()
    } else {
        format!("Unexpected character(s): '{}'.", bad)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("lexical error at {line}:{column}: '{snippet}'. {suggestion}")]
pub struct LexError {
    pub span: Span,
    pub line: usize,
    pub column: usize,
    pub snippet: String,
    pub suggestion: String,
}
