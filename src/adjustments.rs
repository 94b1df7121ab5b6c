//! Adjustments

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::offers::{AdjustmentType, OfferId};

/// The result of applying an offer to an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferAdjustment<'a> {
    /// Offer applied.
    pub offer_id: OfferId,

    /// Offer display name.
    pub offer_name: String,

    /// Whether the adjustment is order- or item-level.
    pub adjustment_type: AdjustmentType,

    /// Discount amount.
    pub value: Money<'a, Currency>,

    /// When the offer was applied.
    pub applied_at: Timestamp,
}
