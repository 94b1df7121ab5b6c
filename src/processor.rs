//! Offer Processor
//!
//! Qualifies offers against an [`OfferContext`], prices the ones that qualify and
//! selects the best compatible set.

use std::fmt;

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    adjustments::OfferAdjustment,
    context::OfferContext,
    expressions::{ExpressionError, ExpressionEvaluator, RuleEvaluator},
    money::AmountError,
    offers::{Offer, OfferId},
};

pub mod clock;
pub mod discount;
pub mod qualification;
pub mod selection;

pub use clock::{Clock, FixedClock, SystemClock};
pub use discount::{Discount, DiscountTarget};
pub use qualification::{DisqualificationReason, Qualification};
pub use selection::CandidateOffer;

/// The rule check that failed to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCheck {
    /// The item qualifier rule, while totalling qualifying items.
    ItemQualifier,

    /// The order-level offer rule.
    OfferRule,
}

impl fmt::Display for RuleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ItemQualifier => "item qualifier rule",
            Self::OfferRule => "offer rule",
        })
    }
}

/// Errors raised while qualifying or pricing an offer.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// A rule on the offer could not be evaluated.
    #[error("offer {offer}: {check} failed to evaluate")]
    Rule {
        /// Offer whose rule failed.
        offer: OfferId,
        /// Which rule failed.
        check: RuleCheck,
        /// Underlying evaluation error.
        #[source]
        source: ExpressionError,
    },

    /// Money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// An amount could not be converted or scaled.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// Evaluates offers against orders.
///
/// Generic over the rule evaluator and the clock so both can be substituted in tests.
#[derive(Debug, Clone, Default)]
pub struct OfferProcessor<E: RuleEvaluator = ExpressionEvaluator, C: Clock = SystemClock> {
    evaluator: E,
    clock: C,
}

impl OfferProcessor {
    /// Create a processor using the expression evaluator and the system clock.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: RuleEvaluator> OfferProcessor<E, SystemClock> {
    /// Create a processor with a custom rule evaluator.
    pub fn with_evaluator(evaluator: E) -> Self {
        Self {
            evaluator,
            clock: SystemClock,
        }
    }
}

impl<E: RuleEvaluator, C: Clock> OfferProcessor<E, C> {
    /// Replace the clock.
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> OfferProcessor<E, C2> {
        OfferProcessor {
            evaluator: self.evaluator,
            clock,
        }
    }

    /// The processor's current time.
    pub fn now(&self) -> jiff::Timestamp {
        self.clock.now()
    }

    /// Turn a selected offer into an adjustment stamped with the current time.
    pub fn apply_offer<'a>(
        &self,
        offer: &Offer,
        amount: Money<'a, Currency>,
    ) -> OfferAdjustment<'a> {
        OfferAdjustment {
            offer_id: offer.id.clone(),
            offer_name: offer.name.clone(),
            adjustment_type: offer.adjustment_type,
            value: amount,
            applied_at: self.clock.now(),
        }
    }

    /// Qualify and price every offer, keeping those that qualify with a positive discount.
    ///
    /// An offer that fails to evaluate is logged and skipped so one bad rule never blocks
    /// the others.
    pub fn candidates<'o, 'a>(
        &self,
        offers: &'o [Offer],
        context: &OfferContext<'a>,
    ) -> Vec<CandidateOffer<'o, 'a>> {
        let mut candidates = Vec::with_capacity(offers.len());

        for offer in offers {
            match self.candidate(offer, context) {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(error) => {
                    warn!(offer_id = %offer.id, error = %error, "skipping offer that failed to evaluate");
                }
            }
        }

        candidates
    }

    fn candidate<'o, 'a>(
        &self,
        offer: &'o Offer,
        context: &OfferContext<'a>,
    ) -> Result<Option<CandidateOffer<'o, 'a>>, ProcessorError> {
        if !self.qualify_offer(offer, context)?.qualifies() {
            return Ok(None);
        }

        let discount = self.calculate_discount(offer, context)?;

        if discount.is_zero() {
            debug!(offer_id = %offer.id, "offer qualified without a discount");

            return Ok(None);
        }

        Ok(Some(CandidateOffer { offer, discount }))
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rust_decimal::Decimal;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{
        expressions::Variables,
        items::OfferItem,
        offers::{AdjustmentType, OfferDiscountType},
    };

    use super::*;

    struct FailingEvaluator;

    impl RuleEvaluator for FailingEvaluator {
        fn evaluate(&self, _rule: &str, _variables: &Variables<'_>) -> Result<bool, ExpressionError> {
            Err(ExpressionError::UnexpectedEnd)
        }
    }

    fn order() -> TestResult<OfferContext<'static>> {
        Ok(OfferContext::new(
            "order-1",
            USD,
            vec![OfferItem::new("a", Money::from_minor(2000, USD), 2)?],
        )?)
    }

    #[test]
    fn apply_offer_stamps_the_clock() -> TestResult {
        let at: Timestamp = "2026-03-01T12:00:00Z".parse()?;
        let processor = OfferProcessor::new().with_clock(FixedClock(at));

        let offer = Offer::new("o-1", "Five off", OfferDiscountType::AmountOff, Decimal::from(5))?
            .with_adjustment_type(AdjustmentType::Item);

        let adjustment = processor.apply_offer(&offer, Money::from_minor(500, USD));

        assert_eq!(adjustment.applied_at, at);
        assert_eq!(adjustment.offer_id, offer.id);
        assert_eq!(adjustment.offer_name, "Five off");
        assert_eq!(adjustment.adjustment_type, AdjustmentType::Item);
        assert_eq!(adjustment.value, Money::from_minor(500, USD));

        Ok(())
    }

    #[test]
    fn candidates_skip_offers_that_fail_to_evaluate() -> TestResult {
        let context = order()?;
        let processor = OfferProcessor::with_evaluator(FailingEvaluator);

        let offers = vec![
            Offer::new("broken", "Broken", OfferDiscountType::AmountOff, Decimal::ONE)?
                .with_offer_rule("order.OrderTotal > 1"),
            Offer::new("plain", "Plain", OfferDiscountType::AmountOff, Decimal::ONE)?,
        ];

        let candidates = processor.candidates(&offers, &context);

        let ids: Vec<&str> = candidates.iter().map(|c| c.offer.id.as_str()).collect();

        assert_eq!(ids, vec!["plain"]);

        Ok(())
    }

    #[test]
    fn candidates_skip_zero_discounts() -> TestResult {
        let context = order()?;
        let processor = OfferProcessor::new();

        let offers = vec![Offer::new(
            "free",
            "Nothing off",
            OfferDiscountType::PercentDiscount,
            Decimal::ZERO,
        )?];

        assert!(processor.candidates(&offers, &context).is_empty());

        Ok(())
    }

    #[test]
    fn rule_errors_name_the_offer_and_check() {
        let error = ProcessorError::Rule {
            offer: OfferId::from("o-7"),
            check: RuleCheck::OfferRule,
            source: ExpressionError::UnexpectedEnd,
        };

        assert_eq!(error.to_string(), "offer o-7: offer rule failed to evaluate");
    }
}
