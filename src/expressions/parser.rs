//! Expression Parser
//!
//! Recursive descent over the token stream. Precedence, loosest first:
//! `or`, `and`, then a single comparison or `in` test per operand.

use rust_decimal::Decimal;

use crate::expressions::{
    ExpressionError,
    lexer::{CompareOp, Token, TokenKind},
    value::{Value, parse_number},
    variables::{Field, Variables},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Or(Vec<Node>),
    And(Vec<Node>),
    Compare {
        lhs: Operand,
        op: CompareOp,
        rhs: Operand,
    },
    In {
        lhs: Operand,
        list: Vec<String>,
    },
    Operand(Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Text(String),
    Number(Decimal),
    Bool(bool),
    Field(Field),
}

impl Node {
    pub(crate) fn evaluate(&self, variables: &Variables<'_>) -> Result<bool, ExpressionError> {
        match self {
            Self::Or(nodes) => {
                for node in nodes {
                    if node.evaluate(variables)? {
                        return Ok(true);
                    }
                }

                Ok(false)
            }
            Self::And(nodes) => {
                for node in nodes {
                    if !node.evaluate(variables)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            Self::Compare { lhs, op, rhs } => {
                compare(&lhs.resolve(variables)?, *op, &rhs.resolve(variables)?)
            }
            Self::In { lhs, list } => {
                let needle = lhs.resolve(variables)?.to_string();

                Ok(list.iter().any(|entry| *entry == needle))
            }
            Self::Operand(operand) => match operand.resolve(variables)? {
                Value::Bool(value) => Ok(value),
                other => Err(ExpressionError::NotBoolean {
                    value: other.to_string(),
                }),
            },
        }
    }
}

impl Operand {
    fn resolve(&self, variables: &Variables<'_>) -> Result<Value, ExpressionError> {
        match self {
            Self::Text(text) => Ok(Value::Text(text.clone())),
            Self::Number(number) => Ok(Value::Number(*number)),
            Self::Bool(value) => Ok(Value::Bool(*value)),
            Self::Field(field) => variables.resolve(*field),
        }
    }
}

fn compare(lhs: &Value, op: CompareOp, rhs: &Value) -> Result<bool, ExpressionError> {
    Ok(match op {
        CompareOp::Eq => lhs.to_string() == rhs.to_string(),
        CompareOp::Ne => lhs.to_string() != rhs.to_string(),
        CompareOp::Ge => numeric(lhs)? >= numeric(rhs)?,
        CompareOp::Le => numeric(lhs)? <= numeric(rhs)?,
        CompareOp::Gt => numeric(lhs)? > numeric(rhs)?,
        CompareOp::Lt => numeric(lhs)? < numeric(rhs)?,
    })
}

fn numeric(value: &Value) -> Result<Decimal, ExpressionError> {
    value
        .as_decimal()
        .ok_or_else(|| ExpressionError::NonNumericOperand {
            value: value.to_string(),
        })
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse the whole token stream. An empty stream yields `None`.
    pub(crate) fn parse(mut self) -> Result<Option<Node>, ExpressionError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let node = self.or()?;

        match self.next() {
            None => Ok(Some(node)),
            Some(token) => Err(unexpected(token)),
        }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.position).map(|token| &token.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();

        if token.is_some() {
            self.position += 1;
        }

        token
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<(), ExpressionError> {
        match self.next() {
            Some(token) if token.kind == *expected => Ok(()),
            Some(token) => Err(unexpected(token)),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn or(&mut self) -> Result<Node, ExpressionError> {
        let mut nodes = vec![self.and()?];

        while self.peek() == Some(&TokenKind::Or) {
            self.position += 1;
            nodes.push(self.and()?);
        }

        Ok(collapse(nodes, Node::Or))
    }

    fn and(&mut self) -> Result<Node, ExpressionError> {
        let mut nodes = vec![self.term()?];

        while self.peek() == Some(&TokenKind::And) {
            self.position += 1;
            nodes.push(self.term()?);
        }

        Ok(collapse(nodes, Node::And))
    }

    fn term(&mut self) -> Result<Node, ExpressionError> {
        if self.peek() == Some(&TokenKind::LParen) {
            self.position += 1;
            let node = self.or()?;
            self.expect(&TokenKind::RParen)?;

            return Ok(node);
        }

        let lhs = self.operand()?;

        match self.peek() {
            Some(TokenKind::Compare(op)) => {
                let op = *op;
                self.position += 1;
                let rhs = self.operand()?;

                Ok(Node::Compare { lhs, op, rhs })
            }
            Some(TokenKind::In) => {
                self.position += 1;
                let list = self.list()?;

                Ok(Node::In { lhs, list })
            }
            _ => Ok(Node::Operand(lhs)),
        }
    }

    fn operand(&mut self) -> Result<Operand, ExpressionError> {
        let token = self.next().ok_or(ExpressionError::UnexpectedEnd)?;

        match token.kind {
            TokenKind::Quoted(text) => Ok(Operand::Text(text)),
            TokenKind::Word(word) => word_operand(&word),
            _ => Err(unexpected(token)),
        }
    }

    fn list(&mut self) -> Result<Vec<String>, ExpressionError> {
        let open = self.next().ok_or(ExpressionError::UnexpectedEnd)?;

        if open.kind != TokenKind::LBracket {
            return Err(ExpressionError::MalformedList {
                offset: open.offset,
            });
        }

        let mut entries = Vec::new();

        if self.peek() == Some(&TokenKind::RBracket) {
            self.position += 1;
            return Ok(entries);
        }

        loop {
            let entry = self.next().ok_or(ExpressionError::UnexpectedEnd)?;

            match entry.kind {
                TokenKind::Quoted(text) | TokenKind::Word(text) => entries.push(text),
                _ => {
                    return Err(ExpressionError::MalformedList {
                        offset: entry.offset,
                    });
                }
            }

            let separator = self.next().ok_or(ExpressionError::UnexpectedEnd)?;

            match separator.kind {
                TokenKind::Comma => {}
                TokenKind::RBracket => return Ok(entries),
                _ => {
                    return Err(ExpressionError::MalformedList {
                        offset: separator.offset,
                    });
                }
            }
        }
    }
}

fn collapse(mut nodes: Vec<Node>, combine: fn(Vec<Node>) -> Node) -> Node {
    if nodes.len() > 1 {
        return combine(nodes);
    }

    nodes.pop().unwrap_or_else(|| combine(Vec::new()))
}

fn word_operand(word: &str) -> Result<Operand, ExpressionError> {
    match word {
        "true" => return Ok(Operand::Bool(true)),
        "false" => return Ok(Operand::Bool(false)),
        _ => {}
    }

    if let Some(number) = parse_number(word) {
        return Ok(Operand::Number(number));
    }

    Field::from_path(word).map(Operand::Field)
}

fn unexpected(token: Token) -> ExpressionError {
    ExpressionError::UnexpectedToken {
        found: token.kind.to_string(),
        offset: token.offset,
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::expressions::lexer::tokenize;

    use super::*;

    fn parse(source: &str) -> Result<Option<Node>, ExpressionError> {
        Parser::new(tokenize(source)?).parse()
    }

    #[test]
    fn empty_input_parses_to_nothing() -> TestResult {
        assert_eq!(parse("   ")?, None);

        Ok(())
    }

    #[test]
    fn and_binds_tighter_than_or() -> TestResult {
        let node = parse("1 == 1 or 1 == 2 and 2 == 3")?;

        assert!(
            matches!(&node, Some(Node::Or(nodes)) if nodes.len() == 2),
            "expected an OR of two branches, got {node:?}"
        );

        assert!(
            matches!(&node, Some(Node::Or(nodes)) if matches!(nodes.get(1), Some(Node::And(_)))),
            "expected the right branch to be an AND, got {node:?}"
        );

        Ok(())
    }

    #[test]
    fn chained_comparison_is_rejected() {
        let result = parse("1 < 2 < 3");

        assert!(matches!(
            result,
            Err(ExpressionError::UnexpectedToken { ref found, .. }) if found == "<"
        ));
    }

    #[test]
    fn in_requires_a_bracketed_list() {
        assert!(matches!(
            parse("item.Price in '10'"),
            Err(ExpressionError::MalformedList { .. })
        ));

        assert!(matches!(
            parse("item.Price in ['10' '20']"),
            Err(ExpressionError::MalformedList { .. })
        ));

        assert_eq!(
            parse("item.Price in ['10',"),
            Err(ExpressionError::UnexpectedEnd)
        );
    }

    #[test]
    fn unbalanced_parentheses_are_rejected() {
        assert_eq!(parse("(1 == 1"), Err(ExpressionError::UnexpectedEnd));
    }

    #[test]
    fn trailing_operator_is_rejected() {
        assert_eq!(parse("1 == 1 and"), Err(ExpressionError::UnexpectedEnd));
    }
}
