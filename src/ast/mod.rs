use serde::Serialize;

use crate::lexer::{NumberKind, TokenKind};

pub mod source_map;
pub use source_map::SourceMap;

// ---- Span infrastructure ----

/// Byte range within source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const UNKNOWN: Span = Span { start: 0, end: 0 };

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// 1-based line and column of the token a node was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

// ---- Expression tree ----

/// Which literal the lexer saw; decides how the text becomes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiteralKind {
    Number(NumberKind),
    String,
    Bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    pub kind: LiteralKind,
    /// Literal text as lexed: digit separators kept, string quotes removed.
    pub text: String,
}

/// An expression node. `pos` is the position of the token the node is
/// attributed to: the literal itself, the operator of a unary/binary node,
/// the opening parenthesis of a grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Literal(Literal),
    Unary { op: TokenKind, operand: Box<Expr> },
    /// Generic binary node; the parser produces the precedence-specific
    /// variants below, but trees built elsewhere may use this one.
    Binary { left: Box<Expr>, op: TokenKind, right: Box<Expr> },
    /// `( expr )`
    Grouping(Box<Expr>),
    /// `==`, `=`, `!=`, `#`
    Equality { left: Box<Expr>, op: TokenKind, right: Box<Expr> },
    /// `<`, `<=`, `>`, `>=`
    Comparison { left: Box<Expr>, op: TokenKind, right: Box<Expr> },
    /// `+`, `-`
    Term { left: Box<Expr>, op: TokenKind, right: Box<Expr> },
    /// `*`, `/`
    Factor { left: Box<Expr>, op: TokenKind, right: Box<Expr> },
    /// Wrapper around a literal operand.
    Primary(Box<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Position, span: Span) -> Self {
        Expr { kind, pos, span }
    }

    /// Node at an unknown source location, for trees built by hand.
    pub fn at_line(kind: ExprKind, line: usize) -> Self {
        Expr { kind, pos: Position { line, column: 0 }, span: Span::UNKNOWN }
    }
}

/// Prints the tree in parenthesized prefix (NPN) form: `(+ 1 (* 2 3))`.
impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExprKind::Literal(lit) => match lit.kind {
                LiteralKind::String => write!(f, "\"{}\"", lit.text),
                _ => write!(f, "{}", lit.text),
            },
            ExprKind::Unary { op, operand } => write!(f, "({} {})", op, operand),
            ExprKind::Binary { left, op, right }
            | ExprKind::Equality { left, op, right }
            | ExprKind::Comparison { left, op, right }
            | ExprKind::Term { left, op, right }
            | ExprKind::Factor { left, op, right } => write!(f, "({} {} {})", op, left, right),
            ExprKind::Grouping(inner) => write!(f, "(group {})", inner),
            ExprKind::Primary(inner) => write!(f, "{}", inner),
        }
    }
}
