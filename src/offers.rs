//! Offers
//!
//! Promotional rule definitions evaluated by the [`crate::processor::OfferProcessor`].

use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod kinds;

pub use kinds::{AdjustmentType, OfferDiscountType, OfferType};

/// Errors raised while building an offer from stored data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OfferError {
    /// The stored discount type has no supported arithmetic.
    #[error("unsupported discount type '{0}'")]
    UnsupportedDiscountType(String),

    /// The stored offer type is not recognised.
    #[error("unsupported offer type '{0}'")]
    UnsupportedOfferType(String),

    /// The stored adjustment type is not recognised.
    #[error("unsupported adjustment type '{0}'")]
    UnsupportedAdjustmentType(String),

    /// A monetary or percentage field is negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeValue {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: Decimal,
    },
}

/// Offer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(String);

impl OfferId {
    /// Create an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OfferId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OfferId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A promotional offer.
///
/// Monetary thresholds and `value` are decimal amounts in major units of the order
/// currency. `value` is a percentage for [`OfferDiscountType::PercentDiscount`].
///
/// `value` and both minimums are never negative. They can only be set through
/// [`Offer::new`], the `with_*_min_total` builders or `TryFrom<OfferRecord>`.
#[derive(Debug, Clone, PartialEq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "independent merchandising flags stored on the offer record."
)]
pub struct Offer {
    /// Identifier.
    pub id: OfferId,

    /// Display name.
    pub name: String,

    /// Code a customer may enter to apply the offer.
    pub code: Option<String>,

    /// Advertised mechanism.
    pub offer_type: OfferType,

    /// Whether the adjustment applies to the order or to lines.
    pub adjustment_type: AdjustmentType,

    /// Arithmetic used for the discount.
    pub discount_type: OfferDiscountType,

    /// Percentage, amount off or fixed price, depending on `discount_type`.
    pub(crate) value: Decimal,

    /// Start of the activity window.
    pub start_date: Timestamp,

    /// Optional end of the activity window.
    pub end_date: Option<Timestamp>,

    /// Archived offers never qualify.
    pub archived: bool,

    /// Minimum order subtotal; zero disables the check.
    pub(crate) order_min_total: Decimal,

    /// Minimum total of qualifying items; zero disables the check.
    pub(crate) qualifying_item_min_total: Decimal,

    /// Total uses across all customers.
    ///
    /// Not enforced by qualification; callers that track global usage must exclude
    /// exhausted offers from the catalog they supply.
    pub max_uses: Option<u32>,

    /// Uses allowed per customer.
    pub max_uses_per_customer: Option<u32>,

    /// Selects the items counted toward `qualifying_item_min_total`.
    ///
    /// Only consulted when `qualifying_item_min_total` is above zero; order-level
    /// conditions belong in `offer_rule`.
    pub item_qualifier_rule: Option<String>,

    /// Selects the items that receive the discount.
    pub item_target_rule: Option<String>,

    /// Rule evaluated once against the order.
    pub offer_rule: Option<String>,

    /// Use the sale price, when present, instead of the regular price.
    pub apply_to_sale_price: bool,

    /// May be applied alongside other combinable offers.
    pub combinable: bool,

    /// Excludes every other offer once selected.
    pub totalitarian: bool,

    /// Applied without a code.
    pub automatically_added: bool,

    /// Lower values are preferred.
    pub priority: i32,
}

impl Offer {
    /// Create an active, order-level, non-combinable offer with no thresholds or rules.
    ///
    /// # Errors
    ///
    /// Returns [`OfferError::NegativeValue`] if `value` is negative.
    pub fn new(
        id: impl Into<OfferId>,
        name: impl Into<String>,
        discount_type: OfferDiscountType,
        value: Decimal,
    ) -> Result<Self, OfferError> {
        let value = non_negative("value", value)?;

        let offer_type = match discount_type {
            OfferDiscountType::PercentDiscount => OfferType::PercentOff,
            OfferDiscountType::AmountOff | OfferDiscountType::FixPrice => OfferType::AmountOff,
        };

        Ok(Self {
            id: id.into(),
            name: name.into(),
            code: None,
            offer_type,
            adjustment_type: AdjustmentType::Order,
            discount_type,
            value,
            start_date: Timestamp::UNIX_EPOCH,
            end_date: None,
            archived: false,
            order_min_total: Decimal::ZERO,
            qualifying_item_min_total: Decimal::ZERO,
            max_uses: None,
            max_uses_per_customer: None,
            item_qualifier_rule: None,
            item_target_rule: None,
            offer_rule: None,
            apply_to_sale_price: false,
            combinable: false,
            totalitarian: false,
            automatically_added: false,
            priority: 0,
        })
    }

    /// Set the activity window.
    #[must_use]
    pub fn active_between(mut self, start: Timestamp, end: Option<Timestamp>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the adjustment type.
    #[must_use]
    pub fn with_adjustment_type(mut self, adjustment_type: AdjustmentType) -> Self {
        self.adjustment_type = adjustment_type;
        self
    }

    /// Set the entry code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set whether the offer combines with others.
    #[must_use]
    pub fn combinable(mut self, combinable: bool) -> Self {
        self.combinable = combinable;
        self
    }

    /// Mark the offer as excluding every other offer.
    #[must_use]
    pub fn totalitarian(mut self) -> Self {
        self.totalitarian = true;
        self
    }

    /// Mark the offer for automatic application.
    #[must_use]
    pub fn automatic(mut self) -> Self {
        self.automatically_added = true;
        self
    }

    /// Mark the offer as archived.
    #[must_use]
    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    /// Price targets at their sale price when they have one.
    #[must_use]
    pub fn on_sale_price(mut self) -> Self {
        self.apply_to_sale_price = true;
        self
    }

    /// Set the per-customer usage cap.
    #[must_use]
    pub fn with_max_uses_per_customer(mut self, limit: u32) -> Self {
        self.max_uses_per_customer = Some(limit);
        self
    }

    /// Set the item qualifier rule.
    #[must_use]
    pub fn with_qualifier_rule(mut self, rule: impl Into<String>) -> Self {
        self.item_qualifier_rule = Some(rule.into());
        self
    }

    /// Set the item target rule.
    #[must_use]
    pub fn with_target_rule(mut self, rule: impl Into<String>) -> Self {
        self.item_target_rule = Some(rule.into());
        self
    }

    /// Set the order-level rule.
    #[must_use]
    pub fn with_offer_rule(mut self, rule: impl Into<String>) -> Self {
        self.offer_rule = Some(rule.into());
        self
    }

    /// Set the minimum order subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`OfferError::NegativeValue`] if `minimum` is negative.
    pub fn with_order_min_total(mut self, minimum: Decimal) -> Result<Self, OfferError> {
        self.order_min_total = non_negative("order_min_total", minimum)?;
        Ok(self)
    }

    /// Set the minimum qualifying item total.
    ///
    /// # Errors
    ///
    /// Returns [`OfferError::NegativeValue`] if `minimum` is negative.
    pub fn with_qualifying_item_min_total(mut self, minimum: Decimal) -> Result<Self, OfferError> {
        self.qualifying_item_min_total = non_negative("qualifying_item_min_total", minimum)?;
        Ok(self)
    }

    /// Percentage, amount off or fixed price, depending on `discount_type`.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Minimum order subtotal; zero when unset.
    pub fn order_min_total(&self) -> Decimal {
        self.order_min_total
    }

    /// Minimum total of qualifying items; zero when unset.
    pub fn qualifying_item_min_total(&self) -> Decimal {
        self.qualifying_item_min_total
    }

    /// The item qualifier rule, if it has any content.
    pub fn qualifier_rule(&self) -> Option<&str> {
        non_blank(self.item_qualifier_rule.as_deref())
    }

    /// The item target rule, if it has any content.
    pub fn target_rule(&self) -> Option<&str> {
        non_blank(self.item_target_rule.as_deref())
    }

    /// The order-level rule, if it has any content.
    pub fn order_rule(&self) -> Option<&str> {
        non_blank(self.offer_rule.as_deref())
    }
}

pub(crate) fn non_negative(field: &'static str, value: Decimal) -> Result<Decimal, OfferError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(OfferError::NegativeValue { field, value });
    }

    Ok(value)
}

fn non_blank(rule: Option<&str>) -> Option<&str> {
    rule.filter(|rule| !rule.trim().is_empty())
}
