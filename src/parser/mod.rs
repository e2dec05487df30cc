use crate::ast::*;
use crate::lexer::{Token, TokenKind};

/// Recursive-descent parser over a lexed token stream.
///
/// ```text
/// program    = expression [ "." ] EOF
/// expression = equality
/// equality   = comparison { ( "==" | "=" | "!=" | "#" ) comparison }
/// comparison = term { ( ">" | ">=" | "<" | "<=" ) term }
/// term       = factor { ( "+" | "-" ) factor }
/// factor     = unary { ( "*" | "/" ) unary }
/// unary      = ( "-" | "+" | "!" | "odd" ) unary | primary
/// primary    = NUMBER | STRING | "true" | "false" | "(" expression ")"
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    height: usize,
}

/// How many groupings and prefix operators may enclose one another.
pub const MAX_NESTING: usize = 128;

/// Tallest tree the parser builds. The compiler, the NPN printer and `Drop`
/// all recurse over the tree, so this bounds them as well.
pub const MAX_DEPTH: usize = 1024;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at {}:{}: {message}", .position.line, .position.column)]
pub struct ParseError {
    pub code: &'static str,
    pub position: Position,
    pub span: Span,
    pub message: String,
}

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a whole token stream into one expression tree.
pub fn parse(tokens: Vec<Token>) -> Result<Expr> {
    Parser::new(tokens).parse_program()
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, depth: 0, height: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        match self.peek_kind() {
            Some(kind) if kinds.contains(&kind) => self.advance(),
            _ => None,
        }
    }

    // Position just past the last token, for errors at end of input.
    fn end_position(&self) -> (Position, Span) {
        match self.tokens.last() {
            Some(t) => (
                Position { line: t.line, column: t.column + (t.span.end - t.span.start) },
                Span { start: t.span.end, end: t.span.end },
            ),
            None => (Position { line: 1, column: 1 }, Span::UNKNOWN),
        }
    }

    fn error_at(&self, code: &'static str, token: Option<&Token>, message: String) -> ParseError {
        let (position, span) = match token {
            Some(t) => (t.position(), t.span),
            None => self.end_position(),
        };
        ParseError { code, position, span, message }
    }

    // Descend into a grouping or prefix operand, refusing past MAX_NESTING.
    fn nested(&mut self, opener: &Token, parse: fn(&mut Parser) -> Result<Expr>) -> Result<Expr> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at(
                "PL0-P004",
                Some(opener),
                format!("expression is nested more than {} levels deep", MAX_NESTING),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // Record the height of the node about to be built.
    fn grow(&mut self, height: usize, at: &Token) -> Result<()> {
        if height > MAX_DEPTH {
            return Err(self.error_at(
                "PL0-P004",
                Some(at),
                format!("expression tree is deeper than {} levels", MAX_DEPTH),
            ));
        }
        self.height = height;
        Ok(())
    }

    // ---- Top-level parsing ----

    pub fn parse_program(&mut self) -> Result<Expr> {
        if self.peek().is_none() {
            return Err(self.error_at("PL0-P002", None, "expected an expression, got end of input".into()));
        }
        let expr = self.expression()?;
        self.eat(&[TokenKind::Dot]);
        match self.peek() {
            None => Ok(expr),
            Some(tok) => Err(self.error_at(
                "PL0-P001",
                Some(tok),
                format!("unexpected '{}' after the end of the expression", tok.literal),
            )),
        }
    }

    fn expression(&mut self) -> Result<Expr> {
        self.equality()
    }

    fn binary_level(
        &mut self,
        ops: &[TokenKind],
        operand: fn(&mut Parser) -> Result<Expr>,
        build: fn(Box<Expr>, TokenKind, Box<Expr>) -> ExprKind,
    ) -> Result<Expr> {
        let mut left = operand(self)?;
        let mut height = self.height;
        while let Some(op) = self.eat(ops) {
            let right = operand(self)?;
            height = height.max(self.height) + 1;
            self.grow(height, &op)?;
            let span = left.span.merge(right.span);
            left = Expr::new(build(Box::new(left), op.kind, Box::new(right)), op.position(), span);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenKind::EqualEqual, TokenKind::Equal, TokenKind::BangEqual, TokenKind::Hash],
            Parser::comparison,
            |left, op, right| ExprKind::Equality { left, op, right },
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::Less, TokenKind::LessEqual],
            Parser::term,
            |left, op, right| ExprKind::Comparison { left, op, right },
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenKind::Plus, TokenKind::Minus],
            Parser::factor,
            |left, op, right| ExprKind::Term { left, op, right },
        )
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenKind::Star, TokenKind::Slash],
            Parser::unary,
            |left, op, right| ExprKind::Factor { left, op, right },
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        if let Some(op) = self.eat(&[TokenKind::Minus, TokenKind::Plus, TokenKind::Bang, TokenKind::Odd]) {
            let operand = self.nested(&op, Parser::unary)?;
            self.grow(self.height + 1, &op)?;
            let span = op.span.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary { op: op.kind, operand: Box::new(operand) },
                op.position(),
                span,
            ));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        let Some(tok) = self.advance() else {
            return Err(self.error_at("PL0-P002", None, "expected an expression, got end of input".into()));
        };

        let literal_kind = match tok.kind {
            TokenKind::Number(n) => Some(LiteralKind::Number(n)),
            TokenKind::Str => Some(LiteralKind::String),
            TokenKind::True | TokenKind::False => Some(LiteralKind::Bool),
            _ => None,
        };
        if let Some(kind) = literal_kind {
            self.height = 2;
            let literal = Expr::new(
                ExprKind::Literal(Literal { kind, text: tok.literal.clone() }),
                tok.position(),
                tok.span,
            );
            return Ok(Expr::new(ExprKind::Primary(Box::new(literal)), tok.position(), tok.span));
        }

        match tok.kind {
            TokenKind::LParen => {
                let inner = self.nested(&tok, Parser::expression)?;
                match self.advance() {
                    Some(close) if close.kind == TokenKind::RParen => {
                        self.grow(self.height + 1, &tok)?;
                        let span = tok.span.merge(close.span);
                        Ok(Expr::new(ExprKind::Grouping(Box::new(inner)), tok.position(), span))
                    }
                    Some(other) => Err(self.error_at(
                        "PL0-P001",
                        Some(&other),
                        format!("expected ')', got '{}'", other.literal),
                    )),
                    None => Err(self.error_at("PL0-P002", None, "expected ')', got end of input".into())),
                }
            }
            TokenKind::Ident => Err(self.error_at(
                "PL0-P003",
                Some(&tok),
                format!("variable '{}' cannot be evaluated; only constant expressions are executable", tok.literal),
            )),
            TokenKind::Var
            | TokenKind::Const
            | TokenKind::Procedure
            | TokenKind::Call
            | TokenKind::Begin
            | TokenKind::End
            | TokenKind::If
            | TokenKind::Then
            | TokenKind::Else
            | TokenKind::While
            | TokenKind::Do
            | TokenKind::For
            | TokenKind::Print
            | TokenKind::Assign => Err(self.error_at(
                "PL0-P003",
                Some(&tok),
                format!("'{}' is not supported; only expressions are executable", tok.literal),
            )),
            _ => Err(self.error_at(
                "PL0-P001",
                Some(&tok),
                format!("expected an expression, got '{}'", tok.literal),
            )),
        }
    }
}
