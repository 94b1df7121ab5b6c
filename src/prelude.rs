//! Offers prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    adjustments::OfferAdjustment,
    context::OfferContext,
    expressions::{
        Expression, ExpressionError, ExpressionEvaluator, ItemContext, OrderContext,
        RuleEvaluator, Variables,
    },
    items::{AppliedAdjustment, OfferItem},
    money::AmountError,
    offers::{AdjustmentType, Offer, OfferDiscountType, OfferError, OfferId, OfferType},
    processor::{
        CandidateOffer, Clock, DisqualificationReason, Discount, DiscountTarget, FixedClock,
        OfferProcessor, ProcessorError, Qualification, RuleCheck, SystemClock,
    },
    service::{
        CodeOutcome, InMemoryOffersRepository, OfferProcessingService, OfferRecord, OfferSummary,
        OffersRepository, OffersService, OffersServiceError, OrderLineSnapshot, OrderSnapshot,
    },
};
