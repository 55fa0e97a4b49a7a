// ── Expression Parser ───────────────────────────────────────────────────
//
// Recursive descent over three precedence levels, loosest first:
//
//   expr   → term ( ("+" | "-") term )*          left-associative
//   term   → factor ( ("*" | "/") factor )*      left-associative
//   factor → ("+" | "-") factor | atom           right-associative prefix
//   atom   → INT | FLOAT | STRING
//          | IDENT "(" expr ( "," expr )* ")"
//          | IDENT
//          | "(" expr ")"
//
// Parenthesized groups, call argument lists and prefix operators each add
// a nesting level. Binary chains are built by the loops in `parse_expr` and
// `parse_term` and cost nothing, however long they get.

use pl_runtime::RuntimePolicy;

use crate::ast::{Call, InfixOp, Node, Operator, PrefixOp};
use crate::error::ExprError;
use crate::lexer::{Token, TokenKind, tokenize};

pub(crate) fn parse_source(source: &str, policy: &RuntimePolicy) -> Result<Node, ExprError> {
    if !policy.admits_source_len(source.len()) {
        return Err(ExprError::SourceTooLong {
            len: source.len(),
            limit: policy.max_source_bytes.unwrap_or_default(),
        });
    }

    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth: policy.max_nesting_depth,
        end: source.len(),
    };
    let node = parser.parse_expr()?;
    if let Some(token) = parser.peek() {
        return Err(ExprError::parse(
            token.start,
            format!(
                "expected operator or end of input, found {}",
                token.kind.describe()
            ),
        ));
    }
    Ok(node)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn position(&self) -> usize {
        self.peek().map_or(self.end, |token| token.start)
    }

    fn found(&self) -> String {
        self.peek()
            .map_or_else(|| "end of input".to_owned(), |token| token.kind.describe())
    }

    fn enter(&mut self, position: usize) -> Result<(), ExprError> {
        if self.depth >= self.max_depth {
            return Err(ExprError::NestingTooDeep {
                position: Some(position),
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expect_rparen(&mut self, expected: &str) -> Result<(), ExprError> {
        if self.peek_kind() == Some(&TokenKind::RParen) {
            self.pos += 1;
            return Ok(());
        }
        Err(ExprError::parse(
            self.position(),
            format!("expected {expected}, found {}", self.found()),
        ))
    }

    fn parse_expr(&mut self) -> Result<Node, ExprError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => InfixOp::Add,
                Some(TokenKind::Minus) => InfixOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = Node::infix(op, left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Node, ExprError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => InfixOp::Mul,
                Some(TokenKind::Slash) => InfixOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_factor()?;
            left = Node::infix(op, left, right);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Node, ExprError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => PrefixOp::Neg,
            Some(TokenKind::Plus) => PrefixOp::Identity,
            _ => return self.parse_atom(),
        };
        let at = self.position();
        self.pos += 1;
        self.enter(at)?;
        let operand = self.parse_factor()?;
        self.leave();
        Ok(Node::prefix(op, operand))
    }

    fn parse_atom(&mut self) -> Result<Node, ExprError> {
        let Some(token) = self.peek() else {
            return Err(ExprError::parse(
                self.end,
                "expected operand, found end of input",
            ));
        };
        let at = token.start;
        let node = match token.kind.clone() {
            TokenKind::Int(value) => Node::integer(value),
            TokenKind::Float(value) => Node::float(value),
            TokenKind::Str(value) => Node::string(value),
            TokenKind::Ident(name) => {
                if self.tokens.get(self.pos + 1).map(|t| &t.kind) == Some(&TokenKind::LParen) {
                    self.pos += 2;
                    return self.parse_call(name, at);
                }
                Node::column(name)
            }
            TokenKind::LParen => {
                self.pos += 1;
                self.enter(at)?;
                let inner = self.parse_expr()?;
                self.expect_rparen("`)` to close `(`")?;
                self.leave();
                return Ok(inner);
            }
            other => {
                return Err(ExprError::parse(
                    at,
                    format!("expected operand, found {}", other.describe()),
                ));
            }
        };
        self.pos += 1;
        Ok(node)
    }

    /// Called with the cursor just past `name(`.
    fn parse_call(&mut self, name: String, at: usize) -> Result<Node, ExprError> {
        if self.peek_kind() == Some(&TokenKind::RParen) {
            return Err(ExprError::parse(
                self.position(),
                format!("expected at least one argument in call to `{name}`"),
            ));
        }
        self.enter(at)?;
        let mut args = Vec::new();
        loop {
            args.push(self.parse_expr()?);
            if self.peek_kind() == Some(&TokenKind::Comma) {
                self.pos += 1;
                continue;
            }
            break;
        }
        self.expect_rparen(&format!("`,` or `)` in call to `{name}`"))?;
        self.leave();

        let call = Call::new(name, args).map_err(|err| ExprError::parse(at, err.to_string()))?;
        Ok(Node::Operator(Operator::Call(call)))
    }
}
