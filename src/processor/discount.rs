//! Discounts

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tracing::warn;

use crate::{
    context::OfferContext,
    expressions::{RuleEvaluator, Variables},
    items::OfferItem,
    money::{self, AmountError},
    offers::{Offer, OfferDiscountType},
    processor::{Clock, OfferProcessor, ProcessorError},
};

/// Share of a discount attributed to one order line.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountTarget<'a> {
    /// Order line identifier.
    pub item_id: String,

    /// Amount taken off the line.
    pub amount: Money<'a, Currency>,
}

/// A computed discount and how it splits across target lines.
///
/// The target amounts always sum to `amount`.
#[derive(Debug, Clone, PartialEq)]
pub struct Discount<'a> {
    /// Total discount.
    pub amount: Money<'a, Currency>,

    /// Per-line breakdown, in order line order.
    pub targets: SmallVec<[DiscountTarget<'a>; 4]>,
}

impl<'a> Discount<'a> {
    /// A zero discount with no targets.
    pub fn none(currency: &'a Currency) -> Self {
        Self {
            amount: Money::from_minor(0, currency),
            targets: SmallVec::new(),
        }
    }

    /// Whether nothing is taken off.
    pub fn is_zero(&self) -> bool {
        self.amount.to_minor_units() == 0
    }

    /// Identifiers of the lines receiving the discount.
    pub fn target_item_ids(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|target| target.item_id.as_str())
    }
}

impl<E: RuleEvaluator, C: Clock> OfferProcessor<E, C> {
    /// Compute the discount `offer` gives on the order in `context`.
    ///
    /// Targets are the lines whose target rule is empty or true. A line whose rule fails
    /// to evaluate is logged and left out.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessorError`] if an amount cannot be represented in the order
    /// currency or a line is in another currency.
    pub fn calculate_discount<'a>(
        &self,
        offer: &Offer,
        context: &OfferContext<'a>,
    ) -> Result<Discount<'a>, ProcessorError> {
        let targets = self.target_items(offer, context);

        if targets.is_empty() {
            return Ok(Discount::none(context.currency));
        }

        let sale = offer.apply_to_sale_price;

        match offer.discount_type {
            OfferDiscountType::PercentDiscount => {
                let (weights, total) = line_totals(&targets, sale)?;
                let percent = Percentage::from(offer.value() / Decimal::ONE_HUNDRED);
                let amount = money::percent_of_minor(percent, total)?;

                split(context.currency, &targets, amount, &weights)
            }
            OfferDiscountType::AmountOff => {
                let (weights, _) = line_totals(&targets, sale)?;
                let amount = money::minor_units(offer.value(), context.currency)?;

                split(context.currency, &targets, amount, &weights)
            }
            OfferDiscountType::FixPrice => fix_price(offer, context.currency, &targets),
        }
    }

    fn target_items<'c, 'a>(
        &self,
        offer: &Offer,
        context: &'c OfferContext<'a>,
    ) -> SmallVec<[&'c OfferItem<'a>; 8]> {
        let Some(rule) = offer.target_rule() else {
            return context.items.iter().collect();
        };

        context
            .items
            .iter()
            .filter(|item| {
                let variables = Variables::new()
                    .with_item(item.variables())
                    .with_order(context.order_variables());

                self.evaluator
                    .evaluate(rule, &variables)
                    .unwrap_or_else(|error| {
                        warn!(
                            offer_id = %offer.id,
                            item_id = %item.item_id,
                            error = %error,
                            "excluding item whose target rule failed to evaluate"
                        );

                        false
                    })
            })
            .collect()
    }
}

fn line_totals(
    targets: &[&OfferItem<'_>],
    apply_to_sale_price: bool,
) -> Result<(SmallVec<[i64; 8]>, i64), AmountError> {
    let line_totals: SmallVec<[i64; 8]> = targets
        .iter()
        .map(|item| {
            item.line_total(apply_to_sale_price)
                .map(|total| total.to_minor_units())
        })
        .collect::<Result<_, _>>()?;

    let total = line_totals
        .iter()
        .try_fold(0_i64, |acc, line| acc.checked_add(*line))
        .ok_or(AmountError::Overflow)?;

    Ok((line_totals, total))
}

fn split<'a>(
    currency: &'a Currency,
    targets: &[&OfferItem<'a>],
    amount: i64,
    weights: &[i64],
) -> Result<Discount<'a>, ProcessorError> {
    let shares = money::allocate(amount, weights)?;

    Ok(Discount {
        amount: Money::from_minor(amount, currency),
        targets: targets
            .iter()
            .zip(shares)
            .map(|(item, share)| DiscountTarget {
                item_id: item.item_id.clone(),
                amount: Money::from_minor(share, currency),
            })
            .collect(),
    })
}

fn fix_price<'a>(
    offer: &Offer,
    currency: &'a Currency,
    targets: &[&OfferItem<'a>],
) -> Result<Discount<'a>, ProcessorError> {
    let fixed = money::minor_units(offer.value(), currency)?;
    let mut discount = Discount::none(currency);

    for item in targets {
        let effective = item
            .effective_price(offer.apply_to_sale_price)
            .to_minor_units();

        if effective <= fixed {
            continue;
        }

        let saving = money::times(&Money::from_minor(effective - fixed, currency), item.quantity)?;

        discount.amount = discount.amount.add(saving)?;
        discount.targets.push(DiscountTarget {
            item_id: item.item_id.clone(),
            amount: saving,
        });
    }

    Ok(discount)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::processor::OfferProcessor;

    use super::*;

    fn context(items: Vec<OfferItem<'static>>) -> TestResult<OfferContext<'static>> {
        Ok(OfferContext::new("order-1", USD, items)?)
    }

    fn item(id: &str, minor: i64, quantity: u32) -> TestResult<OfferItem<'static>> {
        Ok(OfferItem::new(id, Money::from_minor(minor, USD), quantity)?)
    }

    #[test]
    fn percent_discount_of_target_total() -> TestResult {
        let context = context(vec![item("a", 2000, 2)?, item("b", 3000, 1)?])?;
        let offer = Offer::new(
            "pct",
            "Ten percent",
            OfferDiscountType::PercentDiscount,
            Decimal::TEN,
        )?;

        let discount = OfferProcessor::new().calculate_discount(&offer, &context)?;

        assert_eq!(discount.amount, Money::from_minor(700, USD));
        assert_eq!(discount.target_item_ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            discount
                .targets
                .iter()
                .map(|t| t.amount.to_minor_units())
                .collect::<Vec<_>>(),
            vec![400, 300]
        );

        Ok(())
    }

    #[test]
    fn percent_discount_rounds_half_away_from_zero() -> TestResult {
        let context = context(vec![item("a", 1005, 1)?])?;
        let offer = Offer::new(
            "pct",
            "Half off",
            OfferDiscountType::PercentDiscount,
            Decimal::from(50),
        )?;

        let discount = OfferProcessor::new().calculate_discount(&offer, &context)?;

        assert_eq!(discount.amount, Money::from_minor(503, USD));

        Ok(())
    }

    #[test]
    fn fix_price_only_counts_items_above_the_price() -> TestResult {
        let context = context(vec![item("dear", 2000, 1)?, item("cheap", 1000, 1)?])?;
        let offer = Offer::new(
            "fix",
            "Anything for 15",
            OfferDiscountType::FixPrice,
            Decimal::from(15),
        )?;

        let discount = OfferProcessor::new().calculate_discount(&offer, &context)?;

        assert_eq!(discount.amount, Money::from_minor(500, USD));
        assert_eq!(discount.target_item_ids().collect::<Vec<_>>(), vec!["dear"]);

        Ok(())
    }

    #[test]
    fn fix_price_scales_by_quantity_and_uses_sale_price() -> TestResult {
        let context = context(vec![
            item("a", 3000, 2)?.with_sale_price(Money::from_minor(2500, USD)),
        ])?;

        let offer = Offer::new(
            "fix",
            "Anything for 15",
            OfferDiscountType::FixPrice,
            Decimal::from(15),
        )?
        .on_sale_price();

        let discount = OfferProcessor::new().calculate_discount(&offer, &context)?;

        assert_eq!(discount.amount, Money::from_minor(2000, USD));

        Ok(())
    }

    #[test]
    fn amount_off_is_flat_and_split_across_targets() -> TestResult {
        let context = context(vec![item("a", 2000, 2)?, item("b", 3000, 1)?])?;
        let offer = Offer::new("amt", "Ten off", OfferDiscountType::AmountOff, Decimal::TEN)?;

        let discount = OfferProcessor::new().calculate_discount(&offer, &context)?;

        assert_eq!(discount.amount, Money::from_minor(1000, USD));
        assert_eq!(
            discount
                .targets
                .iter()
                .map(|t| t.amount.to_minor_units())
                .sum::<i64>(),
            1000
        );
        assert_eq!(discount.targets.len(), 2);

        Ok(())
    }

    #[test]
    fn no_targets_means_no_discount() -> TestResult {
        let context = context(vec![item("a", 2000, 1)?.with_category("HATS")])?;
        let offer = Offer::new("amt", "Ten off", OfferDiscountType::AmountOff, Decimal::TEN)?
            .with_target_rule("item.CategoryID == 'SHOES'");

        let discount = OfferProcessor::new().calculate_discount(&offer, &context)?;

        assert!(discount.is_zero());
        assert_eq!(discount.target_item_ids().count(), 0);

        Ok(())
    }

    #[test]
    fn target_rule_errors_exclude_only_that_item() -> TestResult {
        let context = context(vec![
            item("text", 2000, 1)?.with_category("SHOES"),
            item("number", 2000, 1)?.with_category("7"),
        ])?;

        let offer = Offer::new(
            "pct",
            "Ten percent",
            OfferDiscountType::PercentDiscount,
            Decimal::TEN,
        )?
        .with_target_rule("item.CategoryID > 5");

        let discount = OfferProcessor::new().calculate_discount(&offer, &context)?;

        assert_eq!(discount.target_item_ids().collect::<Vec<_>>(), vec!["number"]);
        assert_eq!(discount.amount, Money::from_minor(200, USD));

        Ok(())
    }

    #[test]
    fn discounts_are_never_negative() -> TestResult {
        let context = context(vec![item("a", 500, 1)?])?;

        for offer in [
            Offer::new("fix", "Fix", OfferDiscountType::FixPrice, Decimal::from(9))?,
            Offer::new("pct", "Pct", OfferDiscountType::PercentDiscount, Decimal::ZERO)?,
            Offer::new("amt", "Amt", OfferDiscountType::AmountOff, Decimal::ZERO)?,
        ] {
            let discount = OfferProcessor::new().calculate_discount(&offer, &context)?;

            assert!(discount.amount.to_minor_units() >= 0, "{} went negative", offer.id);
        }

        Ok(())
    }
}
