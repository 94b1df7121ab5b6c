//! Fixtures
//!
//! YAML files describing an offer catalog, customer usage and one order, used by the CLI
//! and by tests to seed an [`InMemoryOffersRepository`].

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    offers::OfferId,
    service::{InMemoryOffersRepository, OfferRecord, OrderSnapshot},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Usage recorded against an offer the catalog does not define
    #[error("Usage refers to unknown offer: {0}")]
    UnknownOffer(OfferId),
}

/// How often one customer has used one offer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UsageFixture {
    /// Customer identifier.
    pub customer_id: String,

    /// Offer used.
    pub offer_id: OfferId,

    /// Number of uses.
    pub count: u32,
}

/// A complete fixture: catalog, usage and the order to evaluate.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSet {
    /// Offer catalog.
    pub offers: Vec<OfferRecord>,

    /// Prior usage per customer.
    #[serde(default)]
    pub usage: Vec<UsageFixture>,

    /// Order to evaluate.
    pub order: OrderSnapshot,
}

impl FixtureSet {
    /// Load a fixture set from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if usage refers to an
    /// offer missing from the catalog.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse a fixture set from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or usage refers to an offer missing from
    /// the catalog.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        let fixture: Self = serde_norway::from_str(contents)?;

        if let Some(unknown) = fixture
            .usage
            .iter()
            .find(|usage| !fixture.offers.iter().any(|offer| offer.id == usage.offer_id))
        {
            return Err(FixtureError::UnknownOffer(unknown.offer_id.clone()));
        }

        Ok(fixture)
    }

    /// Split into an in-memory repository seeded with the catalog and usage, and the order.
    pub async fn into_parts(self) -> (InMemoryOffersRepository, OrderSnapshot) {
        let repository = InMemoryOffersRepository::new(self.offers);

        for usage in self.usage {
            repository
                .set_usage(&usage.customer_id, usage.offer_id, usage.count)
                .await;
        }

        (repository, self.order)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::service::OffersRepository;

    use super::*;

    const FIXTURE: &str = r"
offers:
  - id: spring-10
    name: Spring ten percent
    offer_type: PERCENT_OFF
    adjustment_type: ORDER
    discount_type: PERCENT_DISCOUNT
    value: 10
    automatically_added: true
    max_uses_per_customer: 2
usage:
  - customer_id: cust-1
    offer_id: spring-10
    count: 1
order:
  order_id: order-1
  currency: USD
  customer_id: cust-1
  lines:
    - item_id: a
      price: 20.00
      quantity: 2
";

    #[test]
    fn parses_offers_usage_and_order() -> TestResult {
        let fixture = FixtureSet::from_yaml(FIXTURE)?;

        assert_eq!(fixture.offers.len(), 1);
        assert_eq!(fixture.usage.len(), 1);
        assert_eq!(fixture.order.lines.len(), 1);
        assert_eq!(
            fixture.order.lines.first().map(|line| line.price),
            Some(Decimal::new(2000, 2))
        );

        Ok(())
    }

    #[test]
    fn loads_from_file() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(FIXTURE.as_bytes())?;

        let fixture = FixtureSet::load(file.path())?;

        assert_eq!(fixture.order.order_id, "order-1");

        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = FixtureSet::load("does/not/exist.yml");

        assert!(matches!(result, Err(FixtureError::Io(_))));
    }

    #[test]
    fn usage_for_unknown_offer_is_rejected() {
        let yaml = FIXTURE.replace("offer_id: spring-10", "offer_id: winter");

        assert!(matches!(
            FixtureSet::from_yaml(&yaml),
            Err(FixtureError::UnknownOffer(id)) if id.as_str() == "winter"
        ));
    }

    #[tokio::test]
    async fn seeds_repository_with_usage() -> TestResult {
        let (repository, order) = FixtureSet::from_yaml(FIXTURE)?.into_parts().await;

        let usage = repository.customer_usage_counts("cust-1").await?;

        assert_eq!(usage.get(&OfferId::from("spring-10")), Some(&1));
        assert_eq!(repository.active_offers().await?.len(), 1);
        assert_eq!(order.currency, "USD");

        Ok(())
    }
}
