//! Offers service errors.

use rusty_money::MoneyError;
use thiserror::Error;

use crate::{money::AmountError, offers::OfferError, processor::ProcessorError};

/// Errors raised by an [`OffersRepository`](crate::service::repository::OffersRepository).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store could not be reached.
    #[error("offer store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the offers service.
#[derive(Debug, Error)]
pub enum OffersServiceError {
    /// The repository failed.
    #[error("storage error")]
    Repository(#[from] RepositoryError),

    /// The order currency is not an ISO currency.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A stored offer could not be converted.
    #[error("invalid offer")]
    InvalidOffer(#[from] OfferError),

    /// No offer has the entered code.
    #[error("no offer with code '{0}'")]
    OfferCodeNotFound(String),

    /// The processor failed on the requested offer.
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// An order amount could not be represented in its currency.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Order amounts are in mixed currencies.
    #[error(transparent)]
    Money(#[from] MoneyError),
}
