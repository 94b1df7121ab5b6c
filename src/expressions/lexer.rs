//! Expression Lexer

use std::{fmt, iter::Peekable, str::CharIndices};

use crate::expressions::ExpressionError;

/// Comparison operators, longest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Ge,
    Le,
    Eq,
    Ne,
    Gt,
    Lt,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Compare(CompareOp),
    And,
    Or,
    In,
    /// Quoted literal, without its quotes.
    Quoted(String),
    /// Unquoted word: number, boolean or dotted path.
    Word(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::LBracket => f.write_str("["),
            Self::RBracket => f.write_str("]"),
            Self::Comma => f.write_str(","),
            Self::Compare(op) => write!(f, "{op}"),
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
            Self::In => f.write_str("in"),
            Self::Quoted(text) => write!(f, "'{text}'"),
            Self::Word(word) => f.write_str(word),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Split an expression into tokens.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut chars = source.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some((offset, ch)) = chars.next() {
        let kind = match ch {
            c if c.is_whitespace() => continue,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            '\'' | '"' => TokenKind::Quoted(quoted(&mut chars, ch, offset)?),
            '>' | '<' | '=' | '!' => TokenKind::Compare(compare_op(&mut chars, ch, offset)?),
            _ => keyword_or_word(word(&mut chars, ch)),
        };

        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

fn quoted(
    chars: &mut Peekable<CharIndices<'_>>,
    quote: char,
    offset: usize,
) -> Result<String, ExpressionError> {
    let mut text = String::new();

    for (_, ch) in chars.by_ref() {
        if ch == quote {
            return Ok(text);
        }

        text.push(ch);
    }

    Err(ExpressionError::UnterminatedString { offset })
}

fn compare_op(
    chars: &mut Peekable<CharIndices<'_>>,
    first: char,
    offset: usize,
) -> Result<CompareOp, ExpressionError> {
    let followed_by_eq = chars.next_if(|(_, ch)| *ch == '=').is_some();

    match (first, followed_by_eq) {
        ('>', true) => Ok(CompareOp::Ge),
        ('<', true) => Ok(CompareOp::Le),
        ('=', true) => Ok(CompareOp::Eq),
        ('!', true) => Ok(CompareOp::Ne),
        ('>', false) => Ok(CompareOp::Gt),
        ('<', false) => Ok(CompareOp::Lt),
        (character, _) => Err(ExpressionError::UnexpectedCharacter { character, offset }),
    }
}

fn word(chars: &mut Peekable<CharIndices<'_>>, first: char) -> String {
    let mut word = String::from(first);

    while let Some((_, ch)) = chars.next_if(|(_, ch)| !is_delimiter(*ch)) {
        word.push(ch);
    }

    word
}

fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '[' | ']' | ',' | '\'' | '"' | '>' | '<' | '=' | '!')
}

fn keyword_or_word(word: String) -> TokenKind {
    match word.as_str() {
        "and" | "AND" => TokenKind::And,
        "or" | "OR" => TokenKind::Or,
        "in" | "IN" => TokenKind::In,
        _ => TokenKind::Word(word),
    }
}
