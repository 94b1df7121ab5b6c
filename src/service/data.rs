//! Service Data
//!
//! Serializable order snapshots, stored offer records and processing results.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    context::OfferContext,
    items::OfferItem,
    money,
    offers::{
        AdjustmentType, Offer, OfferDiscountType, OfferError, OfferId, OfferType, non_negative,
    },
    processor::DisqualificationReason,
    service::OffersServiceError,
};

/// An order line as supplied by the order system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineSnapshot {
    /// Order line identifier.
    pub item_id: String,

    /// SKU identifier; defaults to the item id.
    #[serde(default)]
    pub sku_id: Option<String>,

    /// Product identifier; defaults to the item id.
    #[serde(default)]
    pub product_id: Option<String>,

    /// Category identifier.
    #[serde(default)]
    pub category_id: Option<String>,

    /// Regular unit price, in major units.
    pub price: Decimal,

    /// Sale unit price, in major units.
    #[serde(default)]
    pub sale_price: Option<Decimal>,

    /// Quantity ordered.
    pub quantity: u32,

    /// Line subtotal; defaults to `price × quantity`.
    #[serde(default)]
    pub subtotal: Option<Decimal>,
}

/// An order as supplied by the order system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Order identifier.
    pub order_id: String,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Customer identifier, absent for guests.
    #[serde(default)]
    pub customer_id: Option<String>,

    /// Order subtotal; defaults to the sum of line subtotals.
    #[serde(default)]
    pub subtotal: Option<Decimal>,

    /// Order total; defaults to the subtotal.
    #[serde(default)]
    pub total: Option<Decimal>,

    /// Order lines.
    pub lines: Vec<OrderLineSnapshot>,

    /// Offers already applied to the order.
    #[serde(default)]
    pub applied_offer_ids: Vec<OfferId>,
}

impl OrderSnapshot {
    /// Resolve the order currency.
    ///
    /// # Errors
    ///
    /// Returns [`OffersServiceError::UnknownCurrency`] if the code is not an ISO currency.
    pub fn currency(&self) -> Result<&'static Currency, OffersServiceError> {
        iso::find(&self.currency)
            .ok_or_else(|| OffersServiceError::UnknownCurrency(self.currency.clone()))
    }

    /// Build the processor's view of this order.
    ///
    /// # Errors
    ///
    /// Returns an [`OffersServiceError`] if the currency is unknown or an amount cannot
    /// be represented in it.
    pub fn to_context(&self) -> Result<OfferContext<'static>, OffersServiceError> {
        let currency = self.currency()?;

        let items = self
            .lines
            .iter()
            .map(|line| line.to_item(currency))
            .collect::<Result<Vec<_>, _>>()?;

        let mut context = OfferContext::new(self.order_id.clone(), currency, items)?
            .with_applied_offers(self.applied_offer_ids.iter().cloned());

        if let Some(subtotal) = self.subtotal {
            let subtotal = money::from_decimal(subtotal, currency)?;
            context = context.with_subtotal(subtotal).with_total(subtotal);
        }

        if let Some(total) = self.total {
            context = context.with_total(money::from_decimal(total, currency)?);
        }

        if let Some(customer_id) = &self.customer_id {
            context = context.with_customer(customer_id.clone());
        }

        Ok(context)
    }
}

impl OrderLineSnapshot {
    fn to_item(&self, currency: &'static Currency) -> Result<OfferItem<'static>, OffersServiceError> {
        let price = money::from_decimal(self.price, currency)?;

        let mut item = OfferItem::new(self.item_id.clone(), price, self.quantity)?;

        if let Some(sku_id) = &self.sku_id {
            item = item.with_sku(sku_id.clone());
        }

        if let Some(product_id) = &self.product_id {
            item = item.with_product(product_id.clone());
        }

        if let Some(category_id) = &self.category_id {
            item = item.with_category(category_id.clone());
        }

        if let Some(sale_price) = self.sale_price {
            item = item.with_sale_price(money::from_decimal(sale_price, currency)?);
        }

        if let Some(subtotal) = self.subtotal {
            item = item.with_subtotal(money::from_decimal(subtotal, currency)?);
        }

        Ok(item)
    }
}

fn epoch() -> Timestamp {
    Timestamp::UNIX_EPOCH
}

/// An offer as stored, with its kinds still in string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "mirrors the stored offer columns."
)]
pub struct OfferRecord {
    /// Identifier.
    pub id: OfferId,

    /// Display name.
    pub name: String,

    /// Entry code.
    #[serde(default)]
    pub code: Option<String>,

    /// Stored offer type.
    pub offer_type: String,

    /// Stored adjustment type.
    pub adjustment_type: String,

    /// Stored discount type.
    pub discount_type: String,

    /// Percentage, amount off or fixed price.
    pub value: Decimal,

    /// Start of the activity window.
    #[serde(default = "epoch")]
    pub start_date: Timestamp,

    /// End of the activity window.
    #[serde(default)]
    pub end_date: Option<Timestamp>,

    /// Archived offers never qualify.
    #[serde(default)]
    pub archived: bool,

    /// Minimum order subtotal.
    #[serde(default)]
    pub order_min_total: Decimal,

    /// Minimum qualifying item total.
    #[serde(default)]
    pub qualifying_item_min_total: Decimal,

    /// Total uses across all customers.
    #[serde(default)]
    pub max_uses: Option<u32>,

    /// Uses allowed per customer.
    #[serde(default)]
    pub max_uses_per_customer: Option<u32>,

    /// Item qualifier rule.
    #[serde(default)]
    pub item_qualifier_rule: Option<String>,

    /// Item target rule.
    #[serde(default)]
    pub item_target_rule: Option<String>,

    /// Order-level rule.
    #[serde(default)]
    pub offer_rule: Option<String>,

    /// Price targets at their sale price.
    #[serde(default)]
    pub apply_to_sale_price: bool,

    /// Combines with other offers.
    #[serde(default)]
    pub combinable: bool,

    /// Excludes all other offers.
    #[serde(default)]
    pub totalitarian: bool,

    /// Applied without a code.
    #[serde(default)]
    pub automatically_added: bool,

    /// Lower values are preferred.
    #[serde(default)]
    pub priority: i32,
}

impl TryFrom<OfferRecord> for Offer {
    type Error = OfferError;

    fn try_from(record: OfferRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            offer_type: record.offer_type.parse::<OfferType>()?,
            adjustment_type: record.adjustment_type.parse::<AdjustmentType>()?,
            discount_type: record.discount_type.parse::<OfferDiscountType>()?,
            value: non_negative("value", record.value)?,
            order_min_total: non_negative("order_min_total", record.order_min_total)?,
            qualifying_item_min_total: non_negative(
                "qualifying_item_min_total",
                record.qualifying_item_min_total,
            )?,
            id: record.id,
            name: record.name,
            code: record.code,
            start_date: record.start_date,
            end_date: record.end_date,
            archived: record.archived,
            max_uses: record.max_uses,
            max_uses_per_customer: record.max_uses_per_customer,
            item_qualifier_rule: record.item_qualifier_rule,
            item_target_rule: record.item_target_rule,
            offer_rule: record.offer_rule,
            apply_to_sale_price: record.apply_to_sale_price,
            combinable: record.combinable,
            totalitarian: record.totalitarian,
            automatically_added: record.automatically_added,
            priority: record.priority,
        })
    }
}

/// An order-level adjustment to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAdjustment {
    /// Adjustment identifier.
    pub id: Uuid,

    /// Order adjusted.
    pub order_id: String,

    /// Offer applied.
    pub offer_id: OfferId,

    /// Offer display name.
    pub offer_name: String,

    /// Amount taken off, in major units.
    pub amount: Decimal,

    /// When the offer was applied.
    pub applied_at: Timestamp,
}

/// An item-level adjustment to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemAdjustmentRecord {
    /// Adjustment identifier.
    pub id: Uuid,

    /// Order adjusted.
    pub order_id: String,

    /// Order line adjusted.
    pub item_id: String,

    /// Offer applied.
    pub offer_id: OfferId,

    /// Offer display name.
    pub offer_name: String,

    /// Amount taken off the line, in major units.
    pub amount: Decimal,

    /// When the offer was applied.
    pub applied_at: Timestamp,
}

/// Adjustments written for one order in one operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdjustmentSet {
    /// Order-level adjustments.
    pub order: Vec<OrderAdjustment>,

    /// Item-level adjustments.
    pub items: Vec<ItemAdjustmentRecord>,
}

impl AdjustmentSet {
    /// Whether the set holds no adjustments.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty() && self.items.is_empty()
    }

    /// Append another set.
    pub fn extend(&mut self, other: Self) {
        self.order.extend(other.order);
        self.items.extend(other.items);
    }
}

/// An offer chosen for the order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedOffer {
    /// Offer applied.
    pub offer_id: OfferId,

    /// Offer display name.
    pub name: String,

    /// Order- or item-level.
    pub adjustment_type: AdjustmentType,

    /// Discount given, in major units.
    pub discount: Decimal,

    /// Lines receiving the discount.
    pub target_item_ids: Vec<String>,
}

/// Result of processing an order's offers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferSummary {
    /// Order processed.
    pub order_id: String,

    /// ISO currency code.
    pub currency: String,

    /// Order subtotal, in major units.
    pub subtotal: Decimal,

    /// Sum of all applied discounts, in major units.
    pub total_discount: Decimal,

    /// Offers applied, in selection order.
    pub applied: Vec<AppliedOffer>,

    /// Adjustments persisted.
    pub adjustments: AdjustmentSet,
}

/// Result of entering an offer code.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeOutcome {
    /// The offer was applied.
    Applied(OfferSummary),

    /// The offer did not qualify.
    Rejected {
        /// Offer the code belongs to.
        offer_id: OfferId,
        /// Why it did not qualify.
        reason: DisqualificationReason,
    },
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use super::*;

    fn line(item_id: &str, price: Decimal, quantity: u32) -> OrderLineSnapshot {
        OrderLineSnapshot {
            item_id: item_id.to_string(),
            sku_id: None,
            product_id: None,
            category_id: None,
            price,
            sale_price: None,
            quantity,
            subtotal: None,
        }
    }

    fn snapshot() -> OrderSnapshot {
        OrderSnapshot {
            order_id: "order-1".to_string(),
            currency: "USD".to_string(),
            customer_id: Some("cust-1".to_string()),
            subtotal: None,
            total: None,
            lines: vec![
                line("a", Decimal::new(2000, 2), 2),
                line("b", Decimal::new(3000, 2), 1),
            ],
            applied_offer_ids: vec![OfferId::from("earlier")],
        }
    }

    fn record() -> OfferRecord {
        OfferRecord {
            id: OfferId::from("o-1"),
            name: "Ten percent".to_string(),
            code: None,
            offer_type: "PERCENT_OFF".to_string(),
            adjustment_type: "ORDER".to_string(),
            discount_type: "PERCENT_DISCOUNT".to_string(),
            value: Decimal::TEN,
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
            automatically_added: true,
            priority: 0,
        }
    }

    #[test]
    fn snapshot_builds_context_from_lines() -> TestResult {
        let context = snapshot().to_context()?;

        assert_eq!(context.currency, USD);
        assert_eq!(context.subtotal, Money::from_minor(7000, USD));
        assert_eq!(context.total, Money::from_minor(7000, USD));
        assert_eq!(context.customer_id.as_deref(), Some("cust-1"));
        assert_eq!(context.applied_offers, vec![OfferId::from("earlier")]);
        assert_eq!(context.items.len(), 2);

        Ok(())
    }

    #[test]
    fn explicit_subtotal_and_total_win() -> TestResult {
        let mut snapshot = snapshot();
        snapshot.subtotal = Some(Decimal::new(4999, 2));
        snapshot.total = Some(Decimal::new(5499, 2));

        let context = snapshot.to_context()?;

        assert_eq!(context.subtotal, Money::from_minor(4999, USD));
        assert_eq!(context.total, Money::from_minor(5499, USD));

        Ok(())
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let mut snapshot = snapshot();
        snapshot.currency = "XXZ".to_string();

        assert!(matches!(
            snapshot.to_context(),
            Err(OffersServiceError::UnknownCurrency(code)) if code == "XXZ"
        ));
    }

    #[test]
    fn record_converts_into_offer() -> TestResult {
        let offer = Offer::try_from(record())?;

        assert_eq!(offer.discount_type, OfferDiscountType::PercentDiscount);
        assert_eq!(offer.offer_type, OfferType::PercentOff);
        assert!(offer.automatically_added);

        Ok(())
    }

    #[test]
    fn record_with_unsupported_discount_type_is_rejected() {
        let mut record = record();
        record.discount_type = "BUY_X_GET_Y".to_string();

        assert!(matches!(
            Offer::try_from(record),
            Err(OfferError::UnsupportedDiscountType(_))
        ));
    }

    #[test]
    fn record_with_negative_value_is_rejected() {
        let mut record = record();
        record.value = Decimal::new(-1, 0);

        assert!(matches!(
            Offer::try_from(record),
            Err(OfferError::NegativeValue { field: "value", .. })
        ));
    }
}
