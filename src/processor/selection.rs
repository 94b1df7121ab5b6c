//! Selection

use tracing::debug;

use crate::{
    expressions::RuleEvaluator,
    offers::Offer,
    processor::{Clock, Discount, OfferProcessor},
};

/// A qualified offer paired with the discount it would give.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateOffer<'o, 'a> {
    /// The offer.
    pub offer: &'o Offer,

    /// Its computed discount.
    pub discount: Discount<'a>,
}

impl<E: RuleEvaluator, C: Clock> OfferProcessor<E, C> {
    /// Choose the compatible set of offers to apply.
    ///
    /// Candidates are ranked by priority (lowest first), then by discount (largest
    /// first), keeping input order for full ties. Walking that ranking, the first
    /// totalitarian offer replaces everything chosen so far and ends the walk. Any other
    /// candidate is taken when nothing has been chosen yet, or when it and everything
    /// chosen are combinable. The result keeps the ranking order.
    pub fn select_best_offers<'o, 'a>(
        &self,
        mut candidates: Vec<CandidateOffer<'o, 'a>>,
    ) -> Vec<CandidateOffer<'o, 'a>> {
        candidates.sort_by(|a, b| {
            a.offer.priority.cmp(&b.offer.priority).then_with(|| {
                b.discount
                    .amount
                    .to_minor_units()
                    .cmp(&a.discount.amount.to_minor_units())
            })
        });

        let mut selected = Vec::new();

        for candidate in candidates {
            if candidate.offer.totalitarian {
                debug!(offer_id = %candidate.offer.id, "totalitarian offer excludes all others");

                selected.clear();
                selected.push(candidate);

                break;
            }

            let compatible = selected.is_empty()
                || (candidate.offer.combinable
                    && selected.iter().all(|chosen| chosen.offer.combinable));

            if compatible {
                selected.push(candidate);
            } else {
                debug!(offer_id = %candidate.offer.id, "offer not combinable with selection");
            }
        }

        selected
    }
}
