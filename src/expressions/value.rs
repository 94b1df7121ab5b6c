//! Expression Values

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;

/// A resolved operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text from a quoted literal or a string field.
    Text(String),

    /// A numeric literal or numeric field.
    Number(Decimal),

    /// `true` or `false`.
    Bool(bool),

    /// An optional field with no value.
    Missing,
}

impl Value {
    /// Convert the value to a decimal for ordering comparisons.
    ///
    /// Numbers convert directly and text converts when it parses as a number.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => parse_number(text.trim()),
            Self::Bool(_) | Self::Missing => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{}", number.normalize()),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Missing => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

/// Parse a numeric literal, accepting plain and scientific notation.
pub(crate) fn parse_number(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }

    Decimal::from_str(text)
        .or_else(|_err| Decimal::from_scientific(text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_display_without_trailing_zeros() {
        assert_eq!(Value::Number(Decimal::new(2000, 2)).to_string(), "20");
        assert_eq!(Value::Number(Decimal::new(1250, 2)).to_string(), "12.5");
    }

    #[test]
    fn missing_displays_as_empty() {
        assert_eq!(Value::from(None::<&str>).to_string(), "");
    }

    #[test]
    fn numeric_text_converts_to_decimal() {
        assert_eq!(
            Value::from("19.99").as_decimal(),
            Some(Decimal::new(1999, 2))
        );
        assert_eq!(Value::from("1e2").as_decimal(), Some(Decimal::new(100, 0)));
        assert_eq!(Value::from("SHOES").as_decimal(), None);
        assert_eq!(Value::Bool(true).as_decimal(), None);
        assert_eq!(Value::Missing.as_decimal(), None);
    }
}
