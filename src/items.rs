//! Items

use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;

use crate::{
    expressions::ItemContext,
    money::{self, AmountError},
    offers::OfferId,
};

/// An adjustment already applied to an order line.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedAdjustment<'a> {
    /// Offer that produced the adjustment.
    pub offer_id: OfferId,

    /// Amount taken off the line.
    pub value: Money<'a, Currency>,
}

/// An order line as seen by the offer processor.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferItem<'a> {
    /// Order line identifier.
    pub item_id: String,

    /// SKU identifier.
    pub sku_id: String,

    /// Product identifier.
    pub product_id: String,

    /// Optional category identifier.
    pub category_id: Option<String>,

    /// Regular unit price.
    pub price: Money<'a, Currency>,

    /// Optional sale unit price.
    pub sale_price: Option<Money<'a, Currency>>,

    /// Quantity ordered.
    pub quantity: u32,

    /// Line subtotal.
    pub subtotal: Money<'a, Currency>,

    /// Adjustments already applied, in application order.
    pub adjustments: SmallVec<[AppliedAdjustment<'a>; 2]>,
}

impl<'a> OfferItem<'a> {
    /// Create a line with its subtotal computed as `price × quantity`.
    ///
    /// SKU and product ids default to the item id.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Overflow`] if the subtotal does not fit in minor units.
    pub fn new(
        item_id: impl Into<String>,
        price: Money<'a, Currency>,
        quantity: u32,
    ) -> Result<Self, AmountError> {
        let item_id = item_id.into();
        let subtotal = money::times(&price, quantity)?;

        Ok(Self {
            sku_id: item_id.clone(),
            product_id: item_id.clone(),
            item_id,
            category_id: None,
            price,
            sale_price: None,
            quantity,
            subtotal,
            adjustments: SmallVec::new(),
        })
    }

    /// Set the SKU identifier.
    #[must_use]
    pub fn with_sku(mut self, sku_id: impl Into<String>) -> Self {
        self.sku_id = sku_id.into();
        self
    }

    /// Set the product identifier.
    #[must_use]
    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = product_id.into();
        self
    }

    /// Set the category identifier.
    #[must_use]
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Set the sale price.
    #[must_use]
    pub fn with_sale_price(mut self, sale_price: Money<'a, Currency>) -> Self {
        self.sale_price = Some(sale_price);
        self
    }

    /// Override the line subtotal.
    #[must_use]
    pub fn with_subtotal(mut self, subtotal: Money<'a, Currency>) -> Self {
        self.subtotal = subtotal;
        self
    }

    /// Record an adjustment already applied to this line.
    #[must_use]
    pub fn with_adjustment(mut self, offer_id: OfferId, value: Money<'a, Currency>) -> Self {
        self.adjustments.push(AppliedAdjustment { offer_id, value });
        self
    }

    /// The unit price an offer works from: the sale price when requested and present.
    pub fn effective_price(&self, apply_to_sale_price: bool) -> Money<'a, Currency> {
        match (apply_to_sale_price, self.sale_price) {
            (true, Some(sale_price)) => sale_price,
            _ => self.price,
        }
    }

    /// Effective price multiplied by quantity.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Overflow`] if the total does not fit in minor units.
    pub fn line_total(&self, apply_to_sale_price: bool) -> Result<Money<'a, Currency>, AmountError> {
        money::times(&self.effective_price(apply_to_sale_price), self.quantity)
    }

    /// Subtotal less every adjustment already applied.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if an adjustment is in another currency.
    pub fn adjusted_price(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.adjustments
            .iter()
            .try_fold(self.subtotal, |remaining, adjustment| {
                remaining.sub(adjustment.value)
            })
    }

    /// Expression view of this line.
    pub fn variables(&self) -> ItemContext<'_> {
        ItemContext {
            item_id: &self.item_id,
            sku_id: &self.sku_id,
            product_id: &self.product_id,
            category_id: self.category_id.as_deref(),
            price: money::to_decimal(&self.price),
            sale_price: self.sale_price.as_ref().map(money::to_decimal),
            quantity: self.quantity,
            subtotal: money::to_decimal(&self.subtotal),
        }
    }
}

/// Sum of line totals for the given items.
///
/// # Errors
///
/// Returns an [`AmountError`] if a line total overflows, or a [`MoneyError`] on currency
/// mismatch, wrapped by the caller's error type.
pub(crate) fn total_of<'a, 'i, E>(
    currency: &'a Currency,
    items: impl IntoIterator<Item = &'i OfferItem<'a>>,
    apply_to_sale_price: bool,
) -> Result<Money<'a, Currency>, E>
where
    'a: 'i,
    E: From<AmountError> + From<MoneyError>,
{
    let mut total = Money::from_minor(0, currency);

    for item in items {
        total = total.add(item.line_total(apply_to_sale_price)?)?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn new_computes_subtotal() -> TestResult {
        let item = OfferItem::new("line-1", Money::from_minor(2000, USD), 2)?;

        assert_eq!(item.subtotal, Money::from_minor(4000, USD));
        assert_eq!(item.sku_id, "line-1");

        Ok(())
    }

    #[test]
    fn effective_price_prefers_sale_price_only_when_asked() -> TestResult {
        let item = OfferItem::new("line-1", Money::from_minor(2000, USD), 1)?
            .with_sale_price(Money::from_minor(1500, USD));

        assert_eq!(item.effective_price(false), Money::from_minor(2000, USD));
        assert_eq!(item.effective_price(true), Money::from_minor(1500, USD));

        Ok(())
    }

    #[test]
    fn effective_price_falls_back_without_sale_price() -> TestResult {
        let item = OfferItem::new("line-1", Money::from_minor(2000, USD), 1)?;

        assert_eq!(item.effective_price(true), Money::from_minor(2000, USD));

        Ok(())
    }

    #[test]
    fn line_total_uses_effective_price() -> TestResult {
        let item = OfferItem::new("line-1", Money::from_minor(2000, USD), 3)?
            .with_sale_price(Money::from_minor(1000, USD));

        assert_eq!(item.line_total(true)?, Money::from_minor(3000, USD));
        assert_eq!(item.line_total(false)?, Money::from_minor(6000, USD));

        Ok(())
    }

    #[test]
    fn adjusted_price_subtracts_applied_adjustments() -> TestResult {
        let item = OfferItem::new("line-1", Money::from_minor(2000, GBP), 2)?
            .with_adjustment(OfferId::from("a"), Money::from_minor(500, GBP))
            .with_adjustment(OfferId::from("b"), Money::from_minor(250, GBP));

        assert_eq!(item.adjusted_price()?, Money::from_minor(3250, GBP));

        Ok(())
    }

    #[test]
    fn variables_expose_major_units() -> TestResult {
        let item = OfferItem::new("line-1", Money::from_minor(1999, GBP), 1)?.with_category("HATS");

        let variables = item.variables();

        assert_eq!(variables.price, Decimal::new(1999, 2));
        assert_eq!(variables.category_id, Some("HATS"));
        assert_eq!(variables.sale_price, None);

        Ok(())
    }
}
