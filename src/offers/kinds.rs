//! Offer Kinds
//!
//! Enumerations stored as strings on offer records.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::offers::OfferError;

/// Promotional mechanism advertised by an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferType {
    /// A percentage off.
    PercentOff,

    /// A fixed amount off.
    AmountOff,

    /// Buy one, get one.
    BuyOneGetOne,
}

/// What an offer's adjustment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    /// The order as a whole.
    Order,

    /// Individual order lines.
    Item,
}

/// Arithmetic used to compute an offer's discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferDiscountType {
    /// Target items are sold at a fixed unit price.
    FixPrice,

    /// A percentage of the target items' total.
    PercentDiscount,

    /// A flat amount off, regardless of target count.
    AmountOff,
}

impl OfferType {
    /// Stored string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PercentOff => "PERCENT_OFF",
            Self::AmountOff => "AMOUNT_OFF",
            Self::BuyOneGetOne => "BUY_ONE_GET_ONE",
        }
    }
}

impl AdjustmentType {
    /// Stored string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "ORDER",
            Self::Item => "ITEM",
        }
    }
}

impl OfferDiscountType {
    /// Stored string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixPrice => "FIX_PRICE",
            Self::PercentDiscount => "PERCENT_DISCOUNT",
            Self::AmountOff => "AMOUNT_OFF",
        }
    }
}

/// Upper-case a stored kind and unify `-`/space separators to `_`.
fn normalise(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|ch| match ch {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

impl FromStr for OfferType {
    type Err = OfferError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalise(value).as_str() {
            "PERCENT_OFF" | "PERCENTAGE_OFF" => Ok(Self::PercentOff),
            "AMOUNT_OFF" => Ok(Self::AmountOff),
            "BUY_ONE_GET_ONE" | "BOGO" => Ok(Self::BuyOneGetOne),
            _ => Err(OfferError::UnsupportedOfferType(value.to_string())),
        }
    }
}

impl FromStr for AdjustmentType {
    type Err = OfferError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalise(value).as_str() {
            "ORDER" | "ORDER_ADJUSTMENT" => Ok(Self::Order),
            "ITEM" | "ITEM_ADJUSTMENT" | "ORDER_ITEM" => Ok(Self::Item),
            _ => Err(OfferError::UnsupportedAdjustmentType(value.to_string())),
        }
    }
}

impl FromStr for OfferDiscountType {
    type Err = OfferError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalise(value).as_str() {
            "FIX_PRICE" | "FIXED_PRICE" => Ok(Self::FixPrice),
            "PERCENT_DISCOUNT" | "PERCENT_OFF" => Ok(Self::PercentDiscount),
            "AMOUNT_OFF" => Ok(Self::AmountOff),
            _ => Err(OfferError::UnsupportedDiscountType(value.to_string())),
        }
    }
}

impl fmt::Display for OfferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AdjustmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OfferDiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn discount_types_parse_leniently() -> TestResult {
        assert_eq!(
            "fix-price".parse::<OfferDiscountType>()?,
            OfferDiscountType::FixPrice
        );
        assert_eq!(
            "PERCENT_DISCOUNT".parse::<OfferDiscountType>()?,
            OfferDiscountType::PercentDiscount
        );
        assert_eq!(
            " amount off ".parse::<OfferDiscountType>()?,
            OfferDiscountType::AmountOff
        );

        Ok(())
    }

    #[test]
    fn unknown_discount_type_is_unsupported() {
        let result = "BUY_X_GET_Y".parse::<OfferDiscountType>();

        assert!(matches!(
            result,
            Err(OfferError::UnsupportedDiscountType(kind)) if kind == "BUY_X_GET_Y"
        ));
    }

    #[test]
    fn string_forms_round_trip_through_display() -> TestResult {
        for kind in [
            OfferDiscountType::FixPrice,
            OfferDiscountType::PercentDiscount,
            OfferDiscountType::AmountOff,
        ] {
            assert_eq!(kind.to_string().parse::<OfferDiscountType>()?, kind);
        }

        assert_eq!("bogo".parse::<OfferType>()?, OfferType::BuyOneGetOne);
        assert_eq!("item".parse::<AdjustmentType>()?, AdjustmentType::Item);

        Ok(())
    }

    #[test]
    fn unknown_adjustment_type_is_unsupported() {
        assert!(matches!(
            "SHIPPING".parse::<AdjustmentType>(),
            Err(OfferError::UnsupportedAdjustmentType(_))
        ));
    }
}
