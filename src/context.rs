//! Offer Context
//!
//! Immutable snapshot of an order, handed to the processor for one evaluation.

use rustc_hash::FxHashMap;
use rusty_money::{Money, MoneyError, iso::Currency};

use crate::{
    expressions::OrderContext,
    items::OfferItem,
    money,
    offers::{Offer, OfferId},
};

/// Everything the processor needs to know about an order.
#[derive(Debug, Clone)]
pub struct OfferContext<'a> {
    /// Order identifier.
    pub order_id: String,

    /// Order currency.
    pub currency: &'a Currency,

    /// Order subtotal.
    pub subtotal: Money<'a, Currency>,

    /// Order total.
    pub total: Money<'a, Currency>,

    /// Optional customer identifier.
    pub customer_id: Option<String>,

    /// Order lines.
    pub items: Vec<OfferItem<'a>>,

    /// Offers already applied in this pass.
    pub applied_offers: Vec<OfferId>,

    /// Offers available for consideration.
    pub available_offers: Vec<Offer>,

    /// Prior uses of each offer by this customer.
    pub usage_counts: FxHashMap<OfferId, u32>,
}

impl<'a> OfferContext<'a> {
    /// Create a context whose subtotal and total are the sum of the line subtotals.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if any line is in a different currency.
    pub fn new(
        order_id: impl Into<String>,
        currency: &'a Currency,
        items: Vec<OfferItem<'a>>,
    ) -> Result<Self, MoneyError> {
        let subtotal = money::sum(currency, items.iter().map(|item| item.subtotal))?;

        Ok(Self {
            order_id: order_id.into(),
            currency,
            subtotal,
            total: subtotal,
            customer_id: None,
            items,
            applied_offers: Vec::new(),
            available_offers: Vec::new(),
            usage_counts: FxHashMap::default(),
        })
    }

    /// Override the order subtotal.
    #[must_use]
    pub fn with_subtotal(mut self, subtotal: Money<'a, Currency>) -> Self {
        self.subtotal = subtotal;
        self
    }

    /// Override the order total.
    #[must_use]
    pub fn with_total(mut self, total: Money<'a, Currency>) -> Self {
        self.total = total;
        self
    }

    /// Set the customer.
    #[must_use]
    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Set the offers already applied.
    #[must_use]
    pub fn with_applied_offers(mut self, applied: impl IntoIterator<Item = OfferId>) -> Self {
        self.applied_offers = applied.into_iter().collect();
        self
    }

    /// Set the offers available for consideration.
    #[must_use]
    pub fn with_available_offers(mut self, offers: Vec<Offer>) -> Self {
        self.available_offers = offers;
        self
    }

    /// Set the customer's prior usage counts.
    #[must_use]
    pub fn with_usage_counts(mut self, usage_counts: FxHashMap<OfferId, u32>) -> Self {
        self.usage_counts = usage_counts;
        self
    }

    /// Prior uses of `offer_id`; zero when unknown.
    pub fn usage_count(&self, offer_id: &OfferId) -> u32 {
        self.usage_counts.get(offer_id).copied().unwrap_or_default()
    }

    /// Expression view of the order.
    pub fn order_variables(&self) -> OrderContext<'_> {
        OrderContext {
            order_total: money::to_decimal(&self.total),
            order_subtotal: money::to_decimal(&self.subtotal),
            customer_id: self.customer_id.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::{EUR, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn new_sums_line_subtotals() -> TestResult {
        let items = vec![
            OfferItem::new("a", Money::from_minor(2000, USD), 2)?,
            OfferItem::new("b", Money::from_minor(3000, USD), 1)?,
        ];

        let context = OfferContext::new("order-1", USD, items)?;

        assert_eq!(context.subtotal, Money::from_minor(7000, USD));
        assert_eq!(context.total, Money::from_minor(7000, USD));

        Ok(())
    }

    #[test]
    fn new_rejects_mixed_currencies() -> TestResult {
        let items = vec![OfferItem::new("a", Money::from_minor(2000, EUR), 1)?];

        assert!(OfferContext::new("order-1", USD, items).is_err());

        Ok(())
    }

    #[test]
    fn unknown_usage_counts_as_zero() -> TestResult {
        let mut usage = FxHashMap::default();
        usage.insert(OfferId::from("used"), 2);

        let context = OfferContext::new("order-1", USD, Vec::new())?.with_usage_counts(usage);

        assert_eq!(context.usage_count(&OfferId::from("used")), 2);
        assert_eq!(context.usage_count(&OfferId::from("fresh")), 0);

        Ok(())
    }

    #[test]
    fn order_variables_reflect_totals_and_customer() -> TestResult {
        let context = OfferContext::new("order-1", USD, Vec::new())?
            .with_subtotal(Money::from_minor(4999, USD))
            .with_total(Money::from_minor(5499, USD))
            .with_customer("cust-9");

        let variables = context.order_variables();

        assert_eq!(variables.order_subtotal, Decimal::new(4999, 2));
        assert_eq!(variables.order_total, Decimal::new(5499, 2));
        assert_eq!(variables.customer_id, Some("cust-9"));

        Ok(())
    }
}
