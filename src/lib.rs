//! Offers
//!
//! Offers is an offer qualification, selection and discount engine for order pricing. Offers
//! are gated by activity windows, minimum totals, usage limits and rule expressions over
//! order lines, and the best compatible set is applied as order or item adjustments.

pub mod adjustments;
pub mod config;
pub mod context;
pub mod expressions;
pub mod fixtures;
pub mod items;
pub mod money;
pub mod observability;
pub mod offers;
pub mod prelude;
pub mod processor;
pub mod report;
pub mod service;
