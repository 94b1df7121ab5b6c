//! In-memory Offers Repository

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    offers::OfferId,
    service::{
        RepositoryError,
        data::{AdjustmentSet, OfferRecord},
        repository::OffersRepository,
    },
};

/// An [`OffersRepository`] held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryOffersRepository {
    offers: RwLock<Vec<OfferRecord>>,
    usage: RwLock<FxHashMap<String, FxHashMap<OfferId, u32>>>,
    adjustments: RwLock<FxHashMap<String, AdjustmentSet>>,
}

impl InMemoryOffersRepository {
    /// Create a repository holding `offers`.
    pub fn new(offers: Vec<OfferRecord>) -> Self {
        Self {
            offers: RwLock::new(offers),
            ..Self::default()
        }
    }

    /// Set how often `customer_id` has used `offer_id`.
    pub async fn set_usage(&self, customer_id: &str, offer_id: OfferId, count: u32) {
        self.usage
            .write()
            .await
            .entry(customer_id.to_string())
            .or_default()
            .insert(offer_id, count);
    }

    /// Adjustments currently stored for `order_id`.
    pub async fn adjustments(&self, order_id: &str) -> AdjustmentSet {
        self.adjustments
            .read()
            .await
            .get(order_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl OffersRepository for InMemoryOffersRepository {
    async fn active_offers(&self) -> Result<Vec<OfferRecord>, RepositoryError> {
        Ok(self
            .offers
            .read()
            .await
            .iter()
            .filter(|record| !record.archived)
            .cloned()
            .collect())
    }

    async fn find_offer_by_code(&self, code: &str) -> Result<Option<OfferRecord>, RepositoryError> {
        let code = code.trim();

        Ok(self
            .offers
            .read()
            .await
            .iter()
            .find(|record| {
                record
                    .code
                    .as_deref()
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(code))
            })
            .cloned())
    }

    async fn customer_usage_counts(
        &self,
        customer_id: &str,
    ) -> Result<FxHashMap<OfferId, u32>, RepositoryError> {
        Ok(self
            .usage
            .read()
            .await
            .get(customer_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_adjustments(
        &self,
        order_id: &str,
        adjustments: AdjustmentSet,
    ) -> Result<(), RepositoryError> {
        debug!(
            order_id,
            order_adjustments = adjustments.order.len(),
            item_adjustments = adjustments.items.len(),
            "replacing adjustments"
        );

        self.adjustments
            .write()
            .await
            .insert(order_id.to_string(), adjustments);

        Ok(())
    }

    async fn add_adjustments(
        &self,
        order_id: &str,
        adjustments: AdjustmentSet,
    ) -> Result<(), RepositoryError> {
        self.adjustments
            .write()
            .await
            .entry(order_id.to_string())
            .or_default()
            .extend(adjustments);

        Ok(())
    }
}
