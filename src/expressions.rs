//! Rule Expressions
//!
//! A small boolean/comparison language used by offers to select qualifying and
//! target items, e.g. `item.CategoryID == '123' and item.Quantity >= 2`.
//!
//! Supported forms:
//! - comparisons: `>=`, `<=`, `==`, `!=`, `>`, `<`
//! - membership: `item.Price in ['10', '20']`
//! - `and` / `or` (also upper case), `and` binding tighter, with parentheses for grouping
//! - literals: `'text'`, `"text"`, numbers, `true`, `false`
//! - fields: `item.{ItemID, SKUID, CategoryID, Price, SalePrice, Quantity, Subtotal, ProductID}`
//!   and `order.{OrderTotal, OrderSubtotal, CustomerID}`
//!
//! `==` and `!=` compare string forms; ordering operators require numeric operands.
//! An empty expression is always true.

use thiserror::Error;

use crate::expressions::{lexer::tokenize, parser::Parser, parser::Node, variables::Root};

mod lexer;
mod parser;
pub mod value;
pub mod variables;

pub use variables::{ItemContext, OrderContext, Variables};

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    /// A quoted literal has no closing quote.
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        offset: usize,
    },

    /// A character that cannot start any token.
    #[error("unexpected character '{character}' at offset {offset}")]
    UnexpectedCharacter {
        /// The offending character.
        character: char,
        /// Byte offset of the character.
        offset: usize,
    },

    /// A token in a position the grammar does not allow.
    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedToken {
        /// The offending token.
        found: String,
        /// Byte offset of the token.
        offset: usize,
    },

    /// The expression ended mid-way through a construct.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// The right-hand side of `in` is not a bracketed literal list.
    #[error("malformed `in` list at offset {offset}")]
    MalformedList {
        /// Byte offset of the offending token.
        offset: usize,
    },

    /// A bare word that is neither a literal nor a `root.Field` path.
    #[error("invalid field path '{path}'")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// A path whose root is not recognised.
    #[error("unknown context key '{root}'")]
    UnknownRoot {
        /// The unrecognised root.
        root: String,
    },

    /// A path whose field does not exist on its root.
    #[error("unknown field '{field}' on '{root}'")]
    UnknownField {
        /// The root of the path.
        root: String,
        /// The unrecognised field.
        field: String,
    },

    /// The expression refers to a root that was not supplied for this evaluation.
    #[error("context key '{root}' is not available here")]
    UnboundRoot {
        /// The missing root.
        root: Root,
    },

    /// An ordering comparison operand is not numeric.
    #[error("cannot compare non-numeric value '{value}'")]
    NonNumericOperand {
        /// String form of the operand.
        value: String,
    },

    /// A bare operand used as a condition is not boolean.
    #[error("value '{value}' is not a boolean")]
    NotBoolean {
        /// String form of the operand.
        value: String,
    },
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Option<Node>,
}

impl Expression {
    /// Parse an expression.
    ///
    /// # Errors
    ///
    /// Returns an [`ExpressionError`] if the text is not a valid expression or refers to
    /// an unknown root or field.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let root = Parser::new(tokenize(source)?).parse()?;

        Ok(Self { root })
    }

    /// Whether the expression is empty, and so matches everything.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Evaluate the expression against the given variables.
    ///
    /// # Errors
    ///
    /// Returns an [`ExpressionError`] if a referenced root is not bound, an ordering
    /// comparison has a non-numeric operand, or a bare operand is not boolean.
    pub fn evaluate(&self, variables: &Variables<'_>) -> Result<bool, ExpressionError> {
        self.root
            .as_ref()
            .map_or(Ok(true), |node| node.evaluate(variables))
    }
}

/// Parse and evaluate `source` in one step.
///
/// # Errors
///
/// Returns an [`ExpressionError`] if parsing or evaluation fails.
pub fn evaluate(source: &str, variables: &Variables<'_>) -> Result<bool, ExpressionError> {
    Expression::parse(source)?.evaluate(variables)
}

/// Capability used by the offer processor to test rule text.
pub trait RuleEvaluator: Send + Sync {
    /// Evaluate `rule` against `variables`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExpressionError`] if the rule cannot be parsed or evaluated.
    fn evaluate(&self, rule: &str, variables: &Variables<'_>) -> Result<bool, ExpressionError>;
}

/// The default [`RuleEvaluator`], parsing the rule text on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator;

impl RuleEvaluator for ExpressionEvaluator {
    fn evaluate(&self, rule: &str, variables: &Variables<'_>) -> Result<bool, ExpressionError> {
        evaluate(rule, variables)
    }
}
