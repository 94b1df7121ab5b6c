//! Offers Service
//!
//! Loads offers and usage from an [`OffersRepository`], runs the [`OfferProcessor`] over
//! an [`OrderSnapshot`] and persists the resulting adjustments.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use tracing::{Span, info, warn};
use uuid::Uuid;

use crate::{
    context::OfferContext,
    expressions::{ExpressionEvaluator, RuleEvaluator},
    money,
    offers::{AdjustmentType, Offer, OfferId},
    processor::{
        CandidateOffer, Clock, DisqualificationReason, OfferProcessor, Qualification, SystemClock,
    },
};

pub mod data;
mod errors;
pub mod memory;
pub mod repository;

pub use data::{
    AdjustmentSet, AppliedOffer, CodeOutcome, ItemAdjustmentRecord, OfferRecord, OfferSummary,
    OrderAdjustment, OrderLineSnapshot, OrderSnapshot,
};
pub use errors::{OffersServiceError, RepositoryError};
pub use memory::InMemoryOffersRepository;
pub use repository::OffersRepository;

/// Offer operations on whole orders.
#[automock]
#[async_trait]
pub trait OffersService: Send + Sync {
    /// Apply the best set of automatic offers to `order`, replacing any adjustments it
    /// already has.
    async fn process_order_offers(
        &self,
        order: OrderSnapshot,
    ) -> Result<OfferSummary, OffersServiceError>;

    /// Apply the offer with entry code `code` to `order`, if it qualifies.
    async fn apply_offer_code(
        &self,
        order: OrderSnapshot,
        code: &str,
    ) -> Result<CodeOutcome, OffersServiceError>;
}

/// [`OffersService`] backed by an [`OffersRepository`].
pub struct OfferProcessingService<E: RuleEvaluator = ExpressionEvaluator, C: Clock = SystemClock> {
    repository: Arc<dyn OffersRepository>,
    processor: OfferProcessor<E, C>,
}

impl<E: RuleEvaluator, C: Clock> fmt::Debug for OfferProcessingService<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfferProcessingService").finish_non_exhaustive()
    }
}

impl OfferProcessingService {
    /// Create a service with the default processor.
    pub fn new(repository: Arc<dyn OffersRepository>) -> Self {
        Self::with_processor(repository, OfferProcessor::new())
    }
}

impl<E: RuleEvaluator, C: Clock> OfferProcessingService<E, C> {
    /// Create a service with a custom processor.
    pub fn with_processor(
        repository: Arc<dyn OffersRepository>,
        processor: OfferProcessor<E, C>,
    ) -> Self {
        Self {
            repository,
            processor,
        }
    }

    async fn usage_counts(
        &self,
        customer_id: Option<&str>,
    ) -> Result<FxHashMap<OfferId, u32>, OffersServiceError> {
        match customer_id {
            Some(customer_id) => Ok(self.repository.customer_usage_counts(customer_id).await?),
            None => Ok(FxHashMap::default()),
        }
    }

    /// Turn the selected candidates into a summary and the adjustments to persist.
    fn summarize<'a>(
        &self,
        context: &OfferContext<'a>,
        selected: &[CandidateOffer<'_, 'a>],
    ) -> Result<OfferSummary, OffersServiceError> {
        let mut applied = Vec::with_capacity(selected.len());
        let mut adjustments = AdjustmentSet::default();

        for candidate in selected {
            let offer = candidate.offer;
            let discount = &candidate.discount;

            applied.push(AppliedOffer {
                offer_id: offer.id.clone(),
                name: offer.name.clone(),
                adjustment_type: offer.adjustment_type,
                discount: money::to_decimal(&discount.amount),
                target_item_ids: discount.target_item_ids().map(ToString::to_string).collect(),
            });

            match offer.adjustment_type {
                AdjustmentType::Order => {
                    let adjustment = self.processor.apply_offer(offer, discount.amount);

                    adjustments.order.push(OrderAdjustment {
                        id: Uuid::now_v7(),
                        order_id: context.order_id.clone(),
                        offer_id: adjustment.offer_id,
                        offer_name: adjustment.offer_name,
                        amount: money::to_decimal(&adjustment.value),
                        applied_at: adjustment.applied_at,
                    });
                }
                AdjustmentType::Item => {
                    for target in &discount.targets {
                        let adjustment = self.processor.apply_offer(offer, target.amount);

                        adjustments.items.push(ItemAdjustmentRecord {
                            id: Uuid::now_v7(),
                            order_id: context.order_id.clone(),
                            item_id: target.item_id.clone(),
                            offer_id: adjustment.offer_id,
                            offer_name: adjustment.offer_name,
                            amount: money::to_decimal(&adjustment.value),
                            applied_at: adjustment.applied_at,
                        });
                    }
                }
            }
        }

        let total_discount = total_discount(context.currency, selected)?;

        Ok(OfferSummary {
            order_id: context.order_id.clone(),
            currency: context.currency.iso_alpha_code.to_string(),
            subtotal: money::to_decimal(&context.subtotal),
            total_discount: money::to_decimal(&total_discount),
            applied,
            adjustments,
        })
    }
}

fn total_discount<'a>(
    currency: &'a Currency,
    selected: &[CandidateOffer<'_, 'a>],
) -> Result<Money<'a, Currency>, OffersServiceError> {
    Ok(money::sum(
        currency,
        selected.iter().map(|candidate| candidate.discount.amount),
    )?)
}

fn rejected(offer: Offer, reason: DisqualificationReason) -> CodeOutcome {
    info!(offer_id = %offer.id, %reason, "offer code rejected");

    CodeOutcome::Rejected {
        offer_id: offer.id,
        reason,
    }
}

/// Convert stored records, logging and dropping any that are invalid.
fn automatic_offers(records: Vec<OfferRecord>) -> Vec<Offer> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.id.clone();

            Offer::try_from(record)
                .inspect_err(|error| warn!(offer_id = %id, error = %error, "skipping invalid offer"))
                .ok()
        })
        .filter(|offer| offer.automatically_added)
        .collect()
}

#[async_trait]
impl<E, C> OffersService for OfferProcessingService<E, C>
where
    E: RuleEvaluator + 'static,
    C: Clock + 'static,
{
    #[tracing::instrument(
        name = "offers.service.process_order_offers",
        skip(self, order),
        fields(
            order_id = %order.order_id,
            catalog_count = tracing::field::Empty,
            candidate_count = tracing::field::Empty,
            applied_count = tracing::field::Empty
        ),
        err
    )]
    async fn process_order_offers(
        &self,
        order: OrderSnapshot,
    ) -> Result<OfferSummary, OffersServiceError> {
        let span = Span::current();

        let offers = automatic_offers(self.repository.active_offers().await?);

        span.record("catalog_count", offers.len());

        let usage = self.usage_counts(order.customer_id.as_deref()).await?;

        // Every adjustment is replaced, so nothing counts as already applied.
        let context = order
            .to_context()?
            .with_applied_offers([])
            .with_usage_counts(usage)
            .with_available_offers(offers);

        let candidates = self
            .processor
            .candidates(&context.available_offers, &context);

        span.record("candidate_count", candidates.len());

        let selected = self.processor.select_best_offers(candidates);
        let summary = self.summarize(&context, &selected)?;

        span.record("applied_count", summary.applied.len());

        self.repository
            .replace_adjustments(&summary.order_id, summary.adjustments.clone())
            .await?;

        info!(
            order_id = %summary.order_id,
            total_discount = %summary.total_discount,
            "processed order offers"
        );

        Ok(summary)
    }

    #[tracing::instrument(
        name = "offers.service.apply_offer_code",
        skip(self, order),
        fields(
            order_id = %order.order_id,
            offer_id = tracing::field::Empty,
            qualified = tracing::field::Empty
        ),
        err
    )]
    async fn apply_offer_code(
        &self,
        order: OrderSnapshot,
        code: &str,
    ) -> Result<CodeOutcome, OffersServiceError> {
        let span = Span::current();

        let record = self
            .repository
            .find_offer_by_code(code)
            .await?
            .ok_or_else(|| OffersServiceError::OfferCodeNotFound(code.to_string()))?;

        let offer = Offer::try_from(record)?;

        span.record("offer_id", tracing::field::display(&offer.id));

        let usage = self.usage_counts(order.customer_id.as_deref()).await?;
        let context = order.to_context()?.with_usage_counts(usage);

        let qualification = if context.applied_offers.contains(&offer.id) {
            Qualification::Disqualified(DisqualificationReason::AlreadyApplied)
        } else {
            self.processor.qualify_offer(&offer, &context)?
        };

        span.record("qualified", qualification.qualifies());

        if let Qualification::Disqualified(reason) = qualification {
            return Ok(rejected(offer, reason));
        }

        let discount = self.processor.calculate_discount(&offer, &context)?;

        if discount.is_zero() {
            return Ok(rejected(offer, DisqualificationReason::NoDiscount));
        }
        let selected = [CandidateOffer {
            offer: &offer,
            discount,
        }];

        let summary = self.summarize(&context, &selected)?;

        self.repository
            .add_adjustments(&summary.order_id, summary.adjustments.clone())
            .await?;

        info!(
            offer_id = %offer.id,
            total_discount = %summary.total_discount,
            "applied offer code"
        );

        Ok(CodeOutcome::Applied(summary))
    }
}
