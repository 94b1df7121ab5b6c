//! Offers Repository

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;

use crate::{
    offers::OfferId,
    service::{
        RepositoryError,
        data::{AdjustmentSet, OfferRecord},
    },
};

/// Storage the offers service reads catalogs from and writes adjustments to.
#[automock]
#[async_trait]
pub trait OffersRepository: Send + Sync {
    /// Every offer that is not archived.
    async fn active_offers(&self) -> Result<Vec<OfferRecord>, RepositoryError>;

    /// The offer with the given entry code, if any.
    async fn find_offer_by_code(&self, code: &str) -> Result<Option<OfferRecord>, RepositoryError>;

    /// How often the customer has used each offer.
    async fn customer_usage_counts(
        &self,
        customer_id: &str,
    ) -> Result<FxHashMap<OfferId, u32>, RepositoryError>;

    /// Delete every adjustment on the order, then insert `adjustments`, as one unit.
    async fn replace_adjustments(
        &self,
        order_id: &str,
        adjustments: AdjustmentSet,
    ) -> Result<(), RepositoryError>;

    /// Insert `adjustments` alongside any the order already has.
    async fn add_adjustments(
        &self,
        order_id: &str,
        adjustments: AdjustmentSet,
    ) -> Result<(), RepositoryError>;
}
