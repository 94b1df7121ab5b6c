//! Qualification

use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    context::OfferContext,
    expressions::{RuleEvaluator, Variables},
    items::{self, OfferItem},
    money,
    offers::Offer,
    processor::{Clock, OfferProcessor, ProcessorError, RuleCheck},
};

/// Outcome of checking an offer against an order.
#[derive(Debug, Clone, PartialEq)]
pub enum Qualification {
    /// Every check passed.
    Qualified,

    /// The first check that failed.
    Disqualified(DisqualificationReason),
}

impl Qualification {
    /// Whether the offer qualified.
    pub fn qualifies(&self) -> bool {
        matches!(self, Self::Qualified)
    }

    /// Why the offer did not qualify, if it did not.
    pub fn reason(&self) -> Option<&DisqualificationReason> {
        match self {
            Self::Qualified => None,
            Self::Disqualified(reason) => Some(reason),
        }
    }
}

/// Why an offer did not qualify.
#[derive(Debug, Clone, PartialEq)]
pub enum DisqualificationReason {
    /// The offer is archived.
    Archived,

    /// The activity window has not opened.
    NotStarted {
        /// When the offer starts.
        starts_at: Timestamp,
    },

    /// The activity window has closed.
    Expired {
        /// When the offer ended.
        ended_at: Timestamp,
    },

    /// The order subtotal is below the offer's minimum.
    BelowOrderMinimum {
        /// Required subtotal.
        minimum: Decimal,
        /// Actual subtotal.
        subtotal: Decimal,
    },

    /// The customer has used the offer as often as allowed.
    CustomerUsageExhausted {
        /// Prior uses.
        uses: u32,
        /// Allowed uses.
        limit: u32,
    },

    /// The offer cannot join offers already applied.
    NotCombinable {
        /// Number of offers already applied.
        applied: usize,
    },

    /// Qualifying items do not reach the offer's minimum.
    BelowQualifyingItemMinimum {
        /// Required total of qualifying items.
        minimum: Decimal,
        /// Actual total of qualifying items.
        total: Decimal,
    },

    /// The order-level rule evaluated to false.
    OfferRuleNotSatisfied,

    /// The offer is already on the order.
    AlreadyApplied,

    /// The offer qualified but discounts nothing on this order.
    NoDiscount,
}

impl fmt::Display for DisqualificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archived => f.write_str("offer is archived"),
            Self::NotStarted { starts_at } => write!(f, "offer does not start until {starts_at}"),
            Self::Expired { ended_at } => write!(f, "offer ended at {ended_at}"),
            Self::BelowOrderMinimum { minimum, subtotal } => write!(
                f,
                "order subtotal {subtotal} is below the minimum {}",
                minimum.normalize()
            ),
            Self::CustomerUsageExhausted { uses, limit } => write!(
                f,
                "customer has used the offer {uses} of {limit} allowed times"
            ),
            Self::NotCombinable { applied } => write!(
                f,
                "offer is not combinable and {applied} offer(s) are already applied"
            ),
            Self::BelowQualifyingItemMinimum { minimum, total } => write!(
                f,
                "qualifying items total {total} is below the minimum {}",
                minimum.normalize()
            ),
            Self::OfferRuleNotSatisfied => f.write_str("order does not satisfy the offer rule"),
            Self::AlreadyApplied => f.write_str("offer is already applied to the order"),
            Self::NoDiscount => f.write_str("offer gives no discount on this order"),
        }
    }
}

impl<E: RuleEvaluator, C: Clock> OfferProcessor<E, C> {
    /// Check whether `offer` applies to the order in `context`.
    ///
    /// Checks run in a fixed order and stop at the first failure: archived, activity
    /// window, order minimum, per-customer usage, combinability, qualifying item
    /// minimum, then the order-level rule.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::Rule`] if the item qualifier rule or the offer rule
    /// cannot be evaluated, or a money error if totals cannot be computed.
    pub fn qualify_offer(
        &self,
        offer: &Offer,
        context: &OfferContext<'_>,
    ) -> Result<Qualification, ProcessorError> {
        let qualification = match self.first_failure(offer, context)? {
            Some(reason) => {
                debug!(offer_id = %offer.id, order_id = %context.order_id, %reason, "offer disqualified");

                Qualification::Disqualified(reason)
            }
            None => {
                debug!(offer_id = %offer.id, order_id = %context.order_id, "offer qualified");

                Qualification::Qualified
            }
        };

        Ok(qualification)
    }

    fn first_failure(
        &self,
        offer: &Offer,
        context: &OfferContext<'_>,
    ) -> Result<Option<DisqualificationReason>, ProcessorError> {
        if offer.archived {
            return Ok(Some(DisqualificationReason::Archived));
        }

        let now = self.clock.now();

        if now < offer.start_date {
            return Ok(Some(DisqualificationReason::NotStarted {
                starts_at: offer.start_date,
            }));
        }

        if let Some(ended_at) = offer.end_date.filter(|end| now > *end) {
            return Ok(Some(DisqualificationReason::Expired { ended_at }));
        }

        if offer.order_min_total() > Decimal::ZERO {
            let subtotal = money::to_decimal(&context.subtotal);

            if subtotal < offer.order_min_total() {
                return Ok(Some(DisqualificationReason::BelowOrderMinimum {
                    minimum: offer.order_min_total(),
                    subtotal,
                }));
            }
        }

        if let (Some(limit), Some(_)) = (offer.max_uses_per_customer, &context.customer_id) {
            let uses = context.usage_count(&offer.id);

            if uses >= limit {
                return Ok(Some(DisqualificationReason::CustomerUsageExhausted { uses, limit }));
            }
        }

        if !offer.combinable && !context.applied_offers.is_empty() {
            return Ok(Some(DisqualificationReason::NotCombinable {
                applied: context.applied_offers.len(),
            }));
        }

        if offer.qualifying_item_min_total() > Decimal::ZERO {
            let qualifying = self.qualifying_items(offer, context)?;

            let total = items::total_of::<ProcessorError>(
                context.currency,
                qualifying,
                offer.apply_to_sale_price,
            )?;

            let total = money::to_decimal(&total);

            if total < offer.qualifying_item_min_total() {
                return Ok(Some(DisqualificationReason::BelowQualifyingItemMinimum {
                    minimum: offer.qualifying_item_min_total(),
                    total,
                }));
            }
        }

        if let Some(rule) = offer.order_rule() {
            let variables = Variables::new().with_order(context.order_variables());

            let satisfied = self
                .evaluator
                .evaluate(rule, &variables)
                .map_err(|source| ProcessorError::Rule {
                    offer: offer.id.clone(),
                    check: RuleCheck::OfferRule,
                    source,
                })?;

            if !satisfied {
                return Ok(Some(DisqualificationReason::OfferRuleNotSatisfied));
            }
        }

        Ok(None)
    }

    /// Items whose qualifier rule is empty or true. Evaluation errors propagate.
    fn qualifying_items<'c, 'a>(
        &self,
        offer: &Offer,
        context: &'c OfferContext<'a>,
    ) -> Result<Vec<&'c OfferItem<'a>>, ProcessorError> {
        let Some(rule) = offer.qualifier_rule() else {
            return Ok(context.items.iter().collect());
        };

        let mut qualifying = Vec::with_capacity(context.items.len());

        for item in &context.items {
            let variables = Variables::new()
                .with_item(item.variables())
                .with_order(context.order_variables());

            let matches = self
                .evaluator
                .evaluate(rule, &variables)
                .map_err(|source| ProcessorError::Rule {
                    offer: offer.id.clone(),
                    check: RuleCheck::ItemQualifier,
                    source,
                })?;

            if matches {
                qualifying.push(item);
            }
        }

        Ok(qualifying)
    }
}
