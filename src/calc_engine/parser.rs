use log::debug;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::error::ParseError;
use super::lexer::{Token, TokenKind};

/// Deepest nesting of parentheses, call arguments and signs.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Tallest tree accepted. Flat chains such as `1+1+...+1` grow the tree
/// without nesting, so this is far above the nesting cap. It still bounds
/// the recursion of evaluating, printing and dropping the tree.
pub const DEFAULT_MAX_HEIGHT: usize = 1024;

/// A subtree together with its height, so the height cap can be enforced
/// without walking the tree again.
struct Node {
    expr: Expr,
    height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Node { expr, height: 1 }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    max_depth: usize,
    max_height: usize,
    nesting: usize,
    // positions of the '(' still waiting for their ')'
    open_parens: Vec<usize>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::End) {
            let position = tokens.last().map_or(0, |t| t.position + 1);
            tokens.push(Token { kind: TokenKind::End, position });
        }
        Parser {
            tokens,
            current: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            max_height: DEFAULT_MAX_HEIGHT,
            nesting: 0,
            open_parens: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn with_max_height(mut self, max_height: usize) -> Self {
        self.max_height = max_height.max(1);
        self
    }

    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        if self.peek().kind == TokenKind::End {
            return Err(ParseError::EmptyExpression { position: self.peek().position });
        }

        let node = self.expr()?;

        let token = self.peek();
        match token.kind {
            TokenKind::End => {
                debug!("parsed '{}' (height {})", node.expr, node.height);
                Ok(node.expr)
            }
            TokenKind::RParen => Err(ParseError::UnmatchedParenthesis { position: token.position }),
            _ => Err(unexpected(token)),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if token.kind != TokenKind::End {
            self.current += 1;
        }
        token
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<BinaryOp> {
        match self.peek().kind {
            TokenKind::Op(c) if ops.contains(&c) => {
                self.advance();
                BinaryOp::from_symbol(c)
            }
            _ => None,
        }
    }

    fn check_height(&self, expr: Expr, height: usize) -> Result<Node, ParseError> {
        if height > self.max_height {
            return Err(ParseError::TooDeep { limit: self.max_height });
        }
        Ok(Node { expr, height })
    }

    fn binary(&self, op: BinaryOp, left: Node, right: Node) -> Result<Node, ParseError> {
        let height = 1 + left.height.max(right.height);
        self.check_height(Expr::binary(op, left.expr, right.expr), height)
    }

    fn expr(&mut self) -> Result<Node, ParseError> {
        let mut left = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let right = self.term()?;
            left = self.binary(op, left, right)?;
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Node, ParseError> {
        let mut left = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/', '%']) {
            let right = self.unary()?;
            left = self.binary(op, left, right)?;
        }
        Ok(left)
    }

    // Every level of parentheses, call arguments and signs passes through
    // here, so this is where recursion is bounded.
    fn unary(&mut self) -> Result<Node, ParseError> {
        if self.nesting >= self.max_depth {
            return Err(ParseError::TooDeep { limit: self.max_depth });
        }
        self.nesting += 1;

        let result = match self.peek().kind {
            TokenKind::Op('-') => {
                self.advance();
                self.unary().and_then(|operand| {
                    self.check_height(Expr::unary(UnaryOp::Neg, operand.expr), operand.height + 1)
                })
            }
            TokenKind::Op('+') => {
                self.advance();
                self.unary()
            }
            _ => self.power(),
        };

        self.nesting -= 1;
        result
    }

    fn power(&mut self) -> Result<Node, ParseError> {
        let base = self.primary()?;
        if self.peek().kind == TokenKind::Op('^') {
            self.advance();
            let exponent = self.unary()?;
            return self.binary(BinaryOp::Pow, base, exponent);
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Node, ParseError> {
        let token = self.advance();

        match token.kind {
            TokenKind::Number(n) => Ok(Node::leaf(Expr::Literal(n))),
            TokenKind::Ident(name) => {
                if self.peek().kind != TokenKind::LParen {
                    return Ok(Node::leaf(Expr::Variable(name)));
                }
                let open = self.advance();
                self.open_parens.push(open.position);

                let args = self.arguments()?;
                let height = 1 + args.iter().map(|a| a.height).max().unwrap_or(0);
                let args = args.into_iter().map(|a| a.expr).collect();
                self.check_height(Expr::Call(name, args), height)
            }
            TokenKind::LParen => {
                self.open_parens.push(token.position);
                if self.peek().kind == TokenKind::RParen {
                    return Err(ParseError::EmptyExpression { position: self.peek().position });
                }
                let inner = self.expr()?;
                self.close()?;
                Ok(inner)
            }
            TokenKind::RParen if !self.open_parens.is_empty() => {
                Err(ParseError::EmptyExpression { position: token.position })
            }
            TokenKind::RParen => Err(ParseError::UnmatchedParenthesis { position: token.position }),
            TokenKind::End => match self.open_parens.last() {
                Some(&position) => Err(ParseError::UnmatchedParenthesis { position }),
                None => Err(unexpected(&token)),
            },
            _ => Err(unexpected(&token)),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        if self.peek().kind == TokenKind::RParen {
            self.close()?;
            return Ok(args);
        }

        loop {
            args.push(self.expr()?);
            if self.peek().kind == TokenKind::Comma {
                self.advance();
                continue;
            }
            self.close()?;
            return Ok(args);
        }
    }

    fn close(&mut self) -> Result<(), ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::RParen => {
                self.advance();
                self.open_parens.pop();
                Ok(())
            }
            TokenKind::End => Err(ParseError::UnmatchedParenthesis {
                position: self.open_parens.last().copied().unwrap_or(token.position),
            }),
            _ => Err(unexpected(token)),
        }
    }
}

fn unexpected(token: &Token) -> ParseError {
    ParseError::UnexpectedToken {
        found: token.kind.to_string(),
        position: token.position,
    }
}

/// Parses a token sequence with the default nesting and height caps.
pub fn parse(tokens: Vec<Token>) -> Result<Expr, ParseError> {
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc_engine::lexer::tokenize;

    fn parse_str(input: &str) -> Result<Expr, ParseError> {
        parse(tokenize(input).unwrap())
    }

    fn num(value: f64) -> Expr {
        Expr::Literal(value)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_str("2+3*4").unwrap(),
            Expr::binary(BinaryOp::Add, num(2.0), Expr::binary(BinaryOp::Mul, num(3.0), num(4.0)))
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            parse_str("10-4-3").unwrap(),
            Expr::binary(BinaryOp::Sub, Expr::binary(BinaryOp::Sub, num(10.0), num(4.0)), num(3.0))
        );
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(
            parse_str("2^3^2").unwrap(),
            Expr::binary(BinaryOp::Pow, num(2.0), Expr::binary(BinaryOp::Pow, num(3.0), num(2.0)))
        );
    }

    #[test]
    fn minus_applies_after_power() {
        assert_eq!(
            parse_str("-2^2").unwrap(),
            Expr::unary(UnaryOp::Neg, Expr::binary(BinaryOp::Pow, num(2.0), num(2.0)))
        );
        assert_eq!(
            parse_str("2^-1").unwrap(),
            Expr::binary(BinaryOp::Pow, num(2.0), Expr::unary(UnaryOp::Neg, num(1.0)))
        );
    }

    #[test]
    fn unary_plus_is_dropped() {
        assert_eq!(parse_str("+5").unwrap(), num(5.0));
    }

    #[test]
    fn calls_and_variables() {
        assert_eq!(
            parse_str("log(8, 2) + pi").unwrap(),
            Expr::binary(
                BinaryOp::Add,
                Expr::Call("log".to_string(), vec![num(8.0), num(2.0)]),
                Expr::Variable("pi".to_string())
            )
        );
        assert_eq!(parse_str("f()").unwrap(), Expr::Call("f".to_string(), vec![]));
    }

    #[test]
    fn empty_input_and_empty_groups() {
        assert_eq!(parse_str("   "), Err(ParseError::EmptyExpression { position: 3 }));
        assert_eq!(parse_str("()"), Err(ParseError::EmptyExpression { position: 1 }));
        assert_eq!(parse_str("(2+)"), Err(ParseError::EmptyExpression { position: 3 }));
        assert_eq!(parse_str("f(1,)"), Err(ParseError::EmptyExpression { position: 4 }));
    }

    #[test]
    fn unbalanced_parentheses() {
        assert_eq!(parse_str("(2+3"), Err(ParseError::UnmatchedParenthesis { position: 0 }));
        assert_eq!(parse_str("sqrt(4"), Err(ParseError::UnmatchedParenthesis { position: 4 }));
        assert_eq!(parse_str("2+3)"), Err(ParseError::UnmatchedParenthesis { position: 3 }));
        assert_eq!(parse_str("(("), Err(ParseError::UnmatchedParenthesis { position: 1 }));
    }

    #[test]
    fn trailing_tokens() {
        assert_eq!(
            parse_str("2 3"),
            Err(ParseError::UnexpectedToken { found: "number 3".to_string(), position: 2 })
        );
        assert_eq!(
            parse_str("1,2"),
            Err(ParseError::UnexpectedToken { found: "','".to_string(), position: 1 })
        );
    }

    #[test]
    fn dangling_operator() {
        assert_eq!(
            parse_str("2+"),
            Err(ParseError::UnexpectedToken { found: "end of input".to_string(), position: 2 })
        );
        assert_eq!(
            parse_str("*2"),
            Err(ParseError::UnexpectedToken { found: "operator '*'".to_string(), position: 0 })
        );
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let input = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(parse_str(&input), Err(ParseError::TooDeep { limit: DEFAULT_MAX_DEPTH }));

        let minus = format!("{}1", "-".repeat(500));
        assert_eq!(parse_str(&minus), Err(ParseError::TooDeep { limit: DEFAULT_MAX_DEPTH }));
    }

    #[test]
    fn flat_chains_are_not_nesting() {
        assert!(parse_str(&vec!["1"; 130].join("+")).is_ok());
        assert!(parse_str(&vec!["2"; 130].join("*")).is_ok());
        assert!(parse_str(&vec!["1"; 1000].join("-")).is_ok());
    }

    #[test]
    fn tree_height_is_capped() {
        let chain = vec!["1"; 2000].join("+");
        assert_eq!(parse_str(&chain), Err(ParseError::TooDeep { limit: DEFAULT_MAX_HEIGHT }));

        let tokens = tokenize("1+2+3").unwrap();
        assert_eq!(
            Parser::new(tokens.clone()).with_max_height(2).parse(),
            Err(ParseError::TooDeep { limit: 2 })
        );
        assert!(Parser::new(tokens).with_max_height(3).parse().is_ok());
    }

    #[test]
    fn custom_depth_limit() {
        let tokens = tokenize("((1))").unwrap();
        assert_eq!(
            Parser::new(tokens.clone()).with_max_depth(2).parse(),
            Err(ParseError::TooDeep { limit: 2 })
        );
        assert_eq!(Parser::new(tokens).with_max_depth(3).parse(), Ok(num(1.0)));
    }

    #[test]
    fn missing_end_token_is_supplied() {
        let mut tokens = tokenize("1+2").unwrap();
        tokens.pop();
        assert!(Parser::new(tokens).parse().is_ok());
    }
}
