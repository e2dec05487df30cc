use crate::ast::*;
use crate::chunk::{Chunk, ChunkError, MAX_CONSTANTS, OpCode};
use crate::lexer::{self, LexError, TokenKind};
use crate::parser::{self, MAX_DEPTH, ParseError};
use crate::value::{Value, ValueError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("too many constants in one chunk (limit {}) at line {line}", MAX_CONSTANTS)]
    TooManyConstants { line: usize, span: Span },
    #[error("operator '{op}' has no bytecode at line {line}")]
    UnsupportedOperator { op: TokenKind, line: usize, span: Span },
    #[error("{error} at line {line}")]
    InvalidLiteral { error: ValueError, line: usize, span: Span },
    #[error("line {line} is beyond the line table limit of {}", u16::MAX)]
    LineOutOfRange { line: usize, span: Span },
    #[error("expression tree is deeper than {} levels at line {line}", MAX_DEPTH)]
    TooDeep { line: usize, span: Span },
}

/// Which stage of compilation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerResult {
    LexicalError,
    ParseError,
    LoweringError,
}

impl CompileError {
    pub fn kind(&self) -> CompilerResult {
        match self {
            CompileError::Lex(_) => CompilerResult::LexicalError,
            CompileError::Parse(_) => CompilerResult::ParseError,
            _ => CompilerResult::LoweringError,
        }
    }

    /// Source span of the offending node, when there is one.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Lex(e) => Some(e.span),
            CompileError::Parse(e) => Some(e.span),
            CompileError::TooManyConstants { span, .. }
            | CompileError::UnsupportedOperator { span, .. }
            | CompileError::InvalidLiteral { span, .. }
            | CompileError::LineOutOfRange { span, .. }
            | CompileError::TooDeep { span, .. } => Some(*span).filter(|s| *s != Span::UNKNOWN),
        }
    }
}

/// Lex, parse and lower one program.
pub fn compile(source: &str) -> Result<Chunk, CompileError> {
    let tokens = lexer::lex(source)?;
    let root = parser::parse(tokens)?;
    compile_expr(&root)
}

/// Lower an already-built tree. Trees taller than [`MAX_DEPTH`] are rejected,
/// the same bound `parser::parse` enforces on source.
pub fn compile_expr(root: &Expr) -> Result<Chunk, CompileError> {
    Compiler::new().compile(root)
}

/// Post-order lowering of one expression tree into a fresh chunk.
///
/// Operands are emitted left before right, so at run time the right operand
/// is on top of the stack when the operator executes.
#[derive(Default)]
pub struct Compiler {
    chunk: Chunk,
    depth: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler::default()
    }

    pub fn compile(mut self, root: &Expr) -> Result<Chunk, CompileError> {
        self.expr(root)?;
        self.chunk.append(OpCode::Return, 0);
        Ok(self.chunk)
    }

    fn line(expr: &Expr) -> Result<u16, CompileError> {
        u16::try_from(expr.pos.line)
            .map_err(|_| CompileError::LineOutOfRange { line: expr.pos.line, span: expr.span })
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        if self.depth >= MAX_DEPTH {
            return Err(CompileError::TooDeep { line: expr.pos.line, span: expr.span });
        }
        self.depth += 1;
        let result = self.lower(expr);
        self.depth -= 1;
        result
    }

    fn lower(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match &expr.kind {
            ExprKind::Literal(lit) => {
                let line = Self::line(expr)?;
                let value = Value::from_literal(lit.kind, &lit.text).map_err(|error| {
                    CompileError::InvalidLiteral { error, line: expr.pos.line, span: expr.span }
                })?;
                self.chunk
                    .append_constant(OpCode::Constant, value, line)
                    .map_err(|ChunkError::ConstantPoolFull| CompileError::TooManyConstants {
                        line: expr.pos.line,
                        span: expr.span,
                    })?;
            }
            ExprKind::Grouping(inner) | ExprKind::Primary(inner) => self.expr(inner)?,
            ExprKind::Unary { op, operand } => {
                self.expr(operand)?;
                let line = Self::line(expr)?;
                match op {
                    TokenKind::Minus => {
                        self.chunk.append(OpCode::Negate, line);
                    }
                    TokenKind::Bang => {
                        self.chunk.append(OpCode::Not, line);
                    }
                    TokenKind::Plus => {}
                    other => return Err(Self::unsupported(*other, expr)),
                }
            }
            ExprKind::Binary { left, op, right }
            | ExprKind::Equality { left, op, right }
            | ExprKind::Comparison { left, op, right }
            | ExprKind::Term { left, op, right }
            | ExprKind::Factor { left, op, right } => {
                self.expr(left)?;
                self.expr(right)?;
                let opcode = binary_opcode(*op).ok_or_else(|| Self::unsupported(*op, expr))?;
                let line = Self::line(expr)?;
                self.chunk.append(opcode, line);
            }
        }
        Ok(())
    }

    fn unsupported(op: TokenKind, expr: &Expr) -> CompileError {
        CompileError::UnsupportedOperator { op, line: expr.pos.line, span: expr.span }
    }
}

fn binary_opcode(op: TokenKind) -> Option<OpCode> {
    Some(match op {
        TokenKind::Plus => OpCode::Add,
        TokenKind::Minus => OpCode::Subtract,
        TokenKind::Star => OpCode::Multiply,
        TokenKind::Slash => OpCode::Divide,
        TokenKind::Greater => OpCode::Gt,
        TokenKind::GreaterEqual => OpCode::Ge,
        TokenKind::Less => OpCode::Lt,
        TokenKind::LessEqual => OpCode::Le,
        TokenKind::BangEqual | TokenKind::Hash => OpCode::NotEqual,
        TokenKind::EqualEqual | TokenKind::Equal => OpCode::Equal,
        _ => return None,
    })
}
